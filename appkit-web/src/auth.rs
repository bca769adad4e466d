//! Authentication capability
//!
//! Only the seam is defined here: an [`Authenticator`] maps a request to an
//! optional [`CurrentUser`], and the middleware publishes the outcome as an
//! [`Authentication`] extension. Credential checks and sign-in flows belong
//! to whichever authenticator is plugged in.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use serde::Serialize;
use tracing::trace;

use crate::session::{Session, SessionData};
use crate::AppState;

/// Signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    pub admin: bool,
}

/// Resolves the user behind a request
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap, session: &SessionData) -> Option<CurrentUser>;
}

/// Trusts the user recorded in the session
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionAuthenticator;

impl Authenticator for SessionAuthenticator {
    fn authenticate(&self, _headers: &HeaderMap, session: &SessionData) -> Option<CurrentUser> {
        session.user.clone()
    }
}

/// Outcome of authentication for the current request
#[derive(Debug, Clone, Default)]
pub struct Authentication {
    pub user: Option<CurrentUser>,
}

impl Authentication {
    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }
}

/// Run the configured authenticator and record the result
///
/// Anonymous requests are let through; handlers decide through
/// [`authorize`](crate::authorization::authorize) what they require.
pub async fn auth_middleware(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut request: Request,
    next: Next,
) -> Response {
    let data = session.get().await;
    let user = state.authenticator.authenticate(request.headers(), &data);

    trace!(
        "Request authenticated as {}",
        user.as_ref().map(|u| u.name.as_str()).unwrap_or("anonymous")
    );

    request.extensions_mut().insert(Authentication { user });
    next.run(request).await
}
