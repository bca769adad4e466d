//! Liveness probe reporting locale setup and session load

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub default_locale: String,
    pub locales: Vec<String>,
    /// Sessions currently held in memory, expired ones included until purged
    pub sessions: usize,
}

/// GET /health
///
/// Mounted outside the pipeline, so it never creates a session or gets
/// blocked by the browser gate.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let locales = state.i18n.config();
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        default_locale: locales.default_locale().to_string(),
        locales: locales.available_locales().to_vec(),
        sessions: state.sessions.len().await,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
