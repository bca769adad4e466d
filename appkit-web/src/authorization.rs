//! Policy checks
//!
//! Policies themselves live with the handlers that need them; this module
//! only defines the failure signal. A handler returning
//! [`AppError::Unauthorized`](crate::error::AppError) never reaches the
//! client as a 403: the rescue layer turns it into a flash alert and a
//! redirect.

use thiserror::Error;

use crate::auth::CurrentUser;

/// Authorization failure for a named rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unauthorized: {rule}")]
pub struct Unauthorized {
    pub rule: &'static str,
}

/// Require a signed-in user satisfying `allowed`
pub fn authorize<'a, F>(
    user: Option<&'a CurrentUser>,
    rule: &'static str,
    allowed: F,
) -> Result<&'a CurrentUser, Unauthorized>
where
    F: FnOnce(&CurrentUser) -> bool,
{
    match user {
        Some(user) if allowed(user) => Ok(user),
        _ => Err(Unauthorized { rule }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(admin: bool) -> CurrentUser {
        CurrentUser {
            id: 7,
            name: "ada".to_string(),
            admin,
        }
    }

    #[test]
    fn test_anonymous_is_unauthorized() {
        let err = authorize(None, "account.show", |_| true).unwrap_err();
        assert_eq!(err.rule, "account.show");
        assert_eq!(err.to_string(), "Unauthorized: account.show");
    }

    #[test]
    fn test_predicate_decides_for_signed_in_user() {
        let regular = user(false);
        let admin = user(true);

        assert!(authorize(Some(&regular), "admin.show", |u| u.admin).is_err());
        let allowed = authorize(Some(&admin), "admin.show", |u| u.admin).unwrap();
        assert_eq!(allowed.name, "ada");
    }
}
