//! Per-request locale switching
//!
//! The `locale` query parameter takes precedence over the locale stored in
//! the session; when the parameter repeats, the last occurrence counts.
//! Everything downstream of this layer, including the response body and the
//! unauthorized rescue, runs with the effective locale active.

use axum::{
    extract::{Query, Request, State},
    http::{header::CONTENT_LANGUAGE, HeaderValue, Uri},
    middleware::Next,
    response::Response,
    Extension,
};
use tracing::debug;

use crate::session::Session;
use crate::AppState;

pub const LOCALE_PARAM: &str = "locale";

/// Last `locale` value in the query string
///
/// A malformed query string yields no preference.
pub fn requested_locale(uri: &Uri) -> Option<String> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .filter(|(key, _)| key == LOCALE_PARAM)
        .map(|(_, value)| value)
        .last()
}

pub async fn switch_locale(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    let requested = requested_locale(request.uri());
    let stored = session.get().await.locale;

    let resolved = state.i18n.resolve(requested.as_deref(), stored.as_deref());
    let effective = state.i18n.config().effective_locale(resolved.as_deref());
    debug!(
        "Locale for {}: {} (param {:?}, session {:?})",
        request.uri().path(),
        effective,
        requested,
        stored
    );

    let mut response = state.i18n.scope(resolved.as_deref(), next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&effective) {
        response.headers_mut().insert(CONTENT_LANGUAGE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(uri: &str) -> Option<String> {
        requested_locale(&uri.parse::<Uri>().unwrap())
    }

    #[test]
    fn test_requested_locale_from_query() {
        assert_eq!(requested("/?locale=fr").as_deref(), Some("fr"));
        assert_eq!(requested("/?page=2&locale=de").as_deref(), Some("de"));
        assert_eq!(requested("/?locale=").as_deref(), Some(""));
    }

    #[test]
    fn test_repeated_locale_uses_last_value() {
        assert_eq!(requested("/?locale=fr&locale=de").as_deref(), Some("de"));
    }

    #[test]
    fn test_no_locale_parameter() {
        assert_eq!(requested("/"), None);
        assert_eq!(requested("/?page=2"), None);
    }
}
