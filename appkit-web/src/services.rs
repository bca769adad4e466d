//! Service objects used by the HTTP handlers

use thiserror::Error;

use appkit_common::{ApplicationService, LocaleConfig, ServiceError, ServiceResult};

use crate::session::SessionData;

/// Requested locale is not one of the configured locales
#[derive(Error, Debug)]
#[error("Unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

pub struct LocaleUpdate<'a> {
    pub config: &'a LocaleConfig,
    pub session: &'a mut SessionData,
    pub locale: String,
}

/// Persists a visitor's locale preference into their session
pub struct UpdateLocalePreference<'a> {
    update: LocaleUpdate<'a>,
}

impl<'a> ApplicationService for UpdateLocalePreference<'a> {
    type Args = LocaleUpdate<'a>;
    type Output = String;

    fn new(update: LocaleUpdate<'a>) -> Self {
        Self { update }
    }

    fn save(self) -> ServiceResult<String> {
        let LocaleUpdate {
            config,
            session,
            locale,
        } = self.update;

        let locale = locale.trim();
        if !config.is_available(locale) {
            return Err(ServiceError::domain(UnsupportedLocale(locale.to_string())));
        }

        session.locale = Some(locale.to_string());
        Ok(locale.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appkit_common::service;

    fn config() -> LocaleConfig {
        LocaleConfig::new("en", ["en", "fr", "de"]).unwrap()
    }

    #[test]
    fn test_save_stores_supported_locale() {
        let config = config();
        let mut session = SessionData::default();

        let saved = service::save::<UpdateLocalePreference>(LocaleUpdate {
            config: &config,
            session: &mut session,
            locale: " de ".to_string(),
        })
        .unwrap();

        assert_eq!(saved, "de");
        assert_eq!(session.locale.as_deref(), Some("de"));
    }

    #[test]
    fn test_save_rejects_unsupported_locale() {
        let config = config();
        let mut session = SessionData {
            locale: Some("fr".to_string()),
            ..SessionData::default()
        };

        let err = service::save::<UpdateLocalePreference>(LocaleUpdate {
            config: &config,
            session: &mut session,
            locale: "xx".to_string(),
        })
        .unwrap_err();

        assert!(matches!(err, ServiceError::Domain(_)));
        assert_eq!(err.to_string(), "Unsupported locale 'xx'");
        assert_eq!(session.locale.as_deref(), Some("fr"));
    }

    #[test]
    fn test_call_is_not_implemented() {
        let config = config();
        let mut session = SessionData::default();

        let err = service::call::<UpdateLocalePreference>(LocaleUpdate {
            config: &config,
            session: &mut session,
            locale: "fr".to_string(),
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "UpdateLocalePreference#call not implemented");
        assert!(session.locale.is_none());
    }
}
