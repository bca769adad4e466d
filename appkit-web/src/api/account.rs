//! Pages that require a signed-in user

use axum::{Extension, Json};

use crate::auth::{Authentication, CurrentUser};
use crate::authorization::authorize;
use crate::error::AppError;

/// GET /account
pub async fn show_account(
    Extension(auth): Extension<Authentication>,
) -> Result<Json<CurrentUser>, AppError> {
    let user = authorize(auth.user(), "account.show", |_| true)?;
    Ok(Json(user.clone()))
}

/// GET /admin
pub async fn show_admin(
    Extension(auth): Extension<Authentication>,
) -> Result<Json<CurrentUser>, AppError> {
    let user = authorize(auth.user(), "admin.show", |u| u.admin)?;
    Ok(Json(user.clone()))
}
