//! Locale resolution and task-scoped locale activation
//!
//! A request carries two optional locale candidates: an explicit `locale`
//! parameter and a `locale` value persisted in its session. Resolution picks
//! the first candidate that is a member of the configured locale set. The
//! effective locale (resolved value, else the process default) is then made
//! active for the remainder of that request only.
//!
//! # Scoping
//!
//! The active locale lives in a tokio task-local, never in a shared global.
//! [`with_locale`] installs a value for the duration of one future; the
//! previous value (an outer scope, or none) is restored when the future
//! completes, returns an error, panics, or is dropped mid-flight. Two
//! requests handled concurrently, on the same worker thread or not, never
//! observe each other's locale.

use std::future::Future;

use tracing::{debug, trace};

use crate::{Error, Result};

tokio::task_local! {
    static ACTIVE_LOCALE: String;
}

/// Supported locale set plus the process-wide default
///
/// Immutable once constructed. The default is always a member of the set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    default_locale: String,
    available_locales: Vec<String>,
}

impl LocaleConfig {
    /// Build a locale configuration, rejecting an empty set or a default
    /// outside the set
    pub fn new(
        default_locale: impl Into<String>,
        available_locales: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self> {
        let default_locale: String = default_locale.into();
        let default_locale = default_locale.trim().to_string();
        let mut available: Vec<String> = Vec::new();
        for locale in available_locales {
            let locale: String = locale.into();
            let locale = locale.trim().to_string();
            if locale.is_empty() {
                return Err(Error::Config("Empty locale identifier".to_string()));
            }
            // Keep first occurrence, the set is ordered
            if !available.contains(&locale) {
                available.push(locale);
            }
        }

        if available.is_empty() {
            return Err(Error::Config(
                "At least one available locale is required".to_string(),
            ));
        }

        if !available.contains(&default_locale) {
            return Err(Error::Config(format!(
                "Default locale '{}' is not one of the available locales [{}]",
                default_locale,
                available.join(", ")
            )));
        }

        Ok(Self {
            default_locale,
            available_locales: available,
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn available_locales(&self) -> &[String] {
        &self.available_locales
    }

    /// Membership test by exact string equality
    pub fn is_available(&self, locale: &str) -> bool {
        self.available_locales.iter().any(|l| l == locale)
    }

    /// Resolve request and session candidates against this configuration
    pub fn resolve(&self, request: Option<&str>, session: Option<&str>) -> Option<String> {
        resolve_locale(request, session, &self.available_locales)
    }

    /// Resolved locale if present, otherwise the default
    pub fn effective_locale(&self, resolved: Option<&str>) -> String {
        match resolved {
            Some(locale) if self.is_available(locale) => locale.to_string(),
            _ => self.default_locale.clone(),
        }
    }

    /// Locale active in the current scope, falling back to the default
    /// outside any scope
    pub fn current(&self) -> String {
        current_locale().unwrap_or_else(|| self.default_locale.clone())
    }
}

/// Pick the preferred supported locale from a request and a session candidate
///
/// The request candidate wins when it is supported. An absent, empty, or
/// unsupported request candidate falls through to the session candidate,
/// which is validated the same way. Returns `None` when neither qualifies.
/// Never fails: bad input degrades to "no preference".
///
/// Each candidate is validated on its own. Picking `request.or(session)`
/// first and validating afterwards would behave differently: `?locale=xx`
/// (or an empty `?locale=`) would then discard a valid session locale and
/// yield `None`, i.e. the default locale. Here it yields the session locale.
pub fn resolve_locale(
    request: Option<&str>,
    session: Option<&str>,
    available: &[String],
) -> Option<String> {
    let supported = |candidate: &&str| available.iter().any(|l| l == candidate);

    let resolved = request
        .filter(supported)
        .or_else(|| session.filter(supported))
        .map(str::to_string);

    trace!(
        request = request.unwrap_or("-"),
        session = session.unwrap_or("-"),
        resolved = resolved.as_deref().unwrap_or("-"),
        "Resolved locale"
    );

    resolved
}

/// Run `work` with `locale` as the active locale for this task
///
/// Output or error of `work` passes through unchanged.
pub async fn with_locale<F>(locale: impl Into<String>, work: F) -> F::Output
where
    F: Future,
{
    let locale = locale.into();
    debug!("Entering locale scope: {}", locale);
    ACTIVE_LOCALE.scope(locale, work).await
}

/// Synchronous variant of [`with_locale`]
pub fn with_locale_sync<F, R>(locale: impl Into<String>, work: F) -> R
where
    F: FnOnce() -> R,
{
    ACTIVE_LOCALE.sync_scope(locale.into(), work)
}

/// Locale active in the current scope, `None` outside any scope
pub fn current_locale() -> Option<String> {
    ACTIVE_LOCALE.try_with(|locale| locale.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string(), "de".to_string()]
    }

    #[test]
    fn test_request_candidate_wins_over_session() {
        let resolved = resolve_locale(Some("fr"), Some("de"), &supported());
        assert_eq!(resolved.as_deref(), Some("fr"));
    }

    #[test]
    fn test_session_used_when_request_absent() {
        let resolved = resolve_locale(None, Some("de"), &supported());
        assert_eq!(resolved.as_deref(), Some("de"));
    }

    #[test]
    fn test_session_used_when_request_unsupported() {
        let resolved = resolve_locale(Some("xx"), Some("de"), &supported());
        assert_eq!(resolved.as_deref(), Some("de"));

        let resolved = resolve_locale(Some(""), Some("fr"), &supported());
        assert_eq!(resolved.as_deref(), Some("fr"));
    }

    #[test]
    fn test_nothing_supported_resolves_to_none() {
        assert_eq!(resolve_locale(None, None, &supported()), None);
        assert_eq!(resolve_locale(None, Some("xx"), &supported()), None);
        assert_eq!(resolve_locale(Some("xx"), Some("yy"), &supported()), None);
    }

    #[test]
    fn test_membership_is_exact() {
        // No case folding or region stripping
        assert_eq!(resolve_locale(Some("FR"), None, &supported()), None);
        assert_eq!(resolve_locale(Some("fr-CA"), None, &supported()), None);
        assert_eq!(resolve_locale(Some(" fr"), None, &supported()), None);
    }

    #[test]
    fn test_empty_supported_set_resolves_nothing() {
        assert_eq!(resolve_locale(Some("en"), Some("en"), &[]), None);
    }

    #[test]
    fn test_config_rejects_default_outside_set() {
        let err = LocaleConfig::new("es", ["en", "fr"]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("es"));
    }

    #[test]
    fn test_config_rejects_empty_set() {
        let err = LocaleConfig::new("en", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_trims_default_like_available() {
        let config = LocaleConfig::new(" en ", [" en", "fr "]).unwrap();
        assert_eq!(config.default_locale(), "en");
        assert_eq!(config.available_locales(), &["en", "fr"]);
    }

    #[test]
    fn test_config_deduplicates_preserving_order() {
        let config = LocaleConfig::new("en", ["en", "fr", "en", "de"]).unwrap();
        assert_eq!(config.available_locales(), &["en", "fr", "de"]);
    }

    #[test]
    fn test_effective_locale_falls_back_to_default() {
        let config = LocaleConfig::new("en", ["en", "fr", "de"]).unwrap();
        assert_eq!(config.effective_locale(Some("fr")), "fr");
        assert_eq!(config.effective_locale(None), "en");
        assert_eq!(config.effective_locale(Some("xx")), "en");
    }

    #[test]
    fn test_current_locale_outside_scope() {
        assert_eq!(current_locale(), None);
        let config = LocaleConfig::new("en", ["en", "fr"]).unwrap();
        assert_eq!(config.current(), "en");
    }

    #[test]
    fn test_sync_scope_nested_restores_outer() {
        with_locale_sync("fr", || {
            assert_eq!(current_locale().as_deref(), Some("fr"));
            with_locale_sync("de", || {
                assert_eq!(current_locale().as_deref(), Some("de"));
            });
            assert_eq!(current_locale().as_deref(), Some("fr"));
        });
        assert_eq!(current_locale(), None);
    }

    #[test]
    fn test_sync_scope_restores_after_panic() {
        with_locale_sync("fr", || {
            let result = std::panic::catch_unwind(|| {
                with_locale_sync("de", || panic!("handler failed"));
            });
            assert!(result.is_err());
            assert_eq!(current_locale().as_deref(), Some("fr"));
        });
        assert_eq!(current_locale(), None);
    }

    #[tokio::test]
    async fn test_async_scope_passes_error_through_and_restores() {
        let result: std::result::Result<(), &str> = with_locale("fr", async {
            let inner: std::result::Result<(), &str> = with_locale("de", async {
                assert_eq!(current_locale().as_deref(), Some("de"));
                Err("boom")
            })
            .await;
            assert_eq!(current_locale().as_deref(), Some("fr"));
            inner
        })
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(current_locale(), None);
    }
}
