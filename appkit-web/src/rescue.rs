//! Turns authorization failures into a flash alert and a redirect back

use axum::{
    extract::{Request, State},
    http::{
        header::{HOST, REFERER},
        HeaderMap, Uri,
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use tracing::warn;

use crate::authorization::Unauthorized;
use crate::session::Session;
use crate::AppState;

/// Fallback target when there is no usable referer
pub const ROOT_PATH: &str = "/";

pub async fn rescue_unauthorized(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    let back = redirect_back_target(request.headers());
    let response = next.run(request).await;

    let rule = response.extensions().get::<Unauthorized>().map(|u| u.rule);
    let Some(rule) = rule else {
        return response;
    };
    warn!("Unauthorized access ({}), redirecting to {}", rule, back);

    let alert = state.i18n.t("flash.unauthorized");
    session.update(|data| data.flash.alert = Some(alert)).await;

    Redirect::to(&back).into_response()
}

/// Same-origin referer path, else [`ROOT_PATH`]
pub fn redirect_back_target(headers: &HeaderMap) -> String {
    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    let host = headers.get(HOST).and_then(|v| v.to_str().ok());

    referer
        .and_then(|r| same_origin_path(r, host))
        .unwrap_or_else(|| ROOT_PATH.to_string())
}

fn same_origin_path(referer: &str, host: Option<&str>) -> Option<String> {
    // Protocol-relative "//evil.example" is not a local path
    if referer.starts_with('/') && !referer.starts_with("//") {
        return Some(referer.to_string());
    }

    let uri: Uri = referer.parse().ok()?;
    let authority = uri.authority()?;
    if Some(authority.as_str()) != host {
        return None;
    }
    Some(
        uri.path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| ROOT_PATH.to_string()),
    )
}
