//! Landing page

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::Authentication;
use crate::session::{Flash, Session};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub locale: String,
    pub greeting: String,
    pub user: Option<String>,
    pub flash: Flash,
}

/// GET /
///
/// Consumes any pending flash messages.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<Authentication>,
) -> Json<HomeResponse> {
    Json(HomeResponse {
        locale: state.i18n.current_locale(),
        greeting: state.i18n.t("greeting"),
        user: auth.user().map(|u| u.name.clone()),
        flash: session.take_flash().await,
    })
}
