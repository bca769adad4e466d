//! Translation catalogs and locale-aware lookup
//!
//! Catalogs are TOML documents, one per locale, addressed with dotted keys
//! (`flash.unauthorized`). Built-in catalogs for `en`, `fr` and `de` are
//! compiled in; a directory of `<locale>.toml` files can be layered on top.
//!
//! Lookup falls back from the active locale to the default locale and
//! finally to the key itself, so a missing translation never fails a request.

use std::collections::HashMap;
use std::future::Future;
use std::path::Path;

use toml::{Table, Value};
use tracing::{debug, info, warn};

use crate::locale::{with_locale, LocaleConfig};
use crate::{Error, Result};

const BUILTIN_CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en.toml")),
    ("fr", include_str!("../locales/fr.toml")),
    ("de", include_str!("../locales/de.toml")),
];

/// Per-locale translation tables
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: HashMap<String, Table>,
}

impl Catalog {
    /// Empty catalog, every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with the compiled-in translations
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::empty();
        for (locale, source) in BUILTIN_CATALOGS {
            catalog.merge_str(locale, source)?;
        }
        Ok(catalog)
    }

    /// Parse `source` and merge it over any existing table for `locale`
    pub fn merge_str(&mut self, locale: &str, source: &str) -> Result<()> {
        let table: Table = toml::from_str(source)?;
        let entry = self.tables.entry(locale.to_string()).or_default();
        merge_tables(entry, table);
        Ok(())
    }

    /// Merge every `<locale>.toml` file found in `dir`
    ///
    /// Files with other extensions are ignored. A malformed file is an error.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(Error::Config(format!(
                "Locales directory not found: {}",
                dir.display()
            )));
        }

        let mut loaded = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)?;
            self.merge_str(locale, &source).map_err(|e| {
                Error::Config(format!("Invalid catalog {}: {}", path.display(), e))
            })?;
            debug!("Loaded translations for '{}' from {}", locale, path.display());
            loaded += 1;
        }

        info!("Loaded {} translation file(s) from {}", loaded, dir.display());
        Ok(loaded)
    }

    /// Locales that have a table
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    /// Exact lookup of a dotted key in one locale
    pub fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        let mut segments = key.split('.');
        let first = segments.next()?;
        let mut value = self.tables.get(locale)?.get(first)?;
        for segment in segments {
            value = value.as_table()?.get(segment)?;
        }
        value.as_str()
    }
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        if let Value::Table(incoming) = value {
            if let Some(Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

/// Locale configuration bundled with its translations
#[derive(Debug, Clone)]
pub struct I18n {
    config: LocaleConfig,
    catalog: Catalog,
}

impl I18n {
    pub fn new(config: LocaleConfig, catalog: Catalog) -> Self {
        for locale in config.available_locales() {
            if !catalog.tables.contains_key(locale) {
                warn!(
                    "No translations for available locale '{}', lookups will use '{}'",
                    locale,
                    config.default_locale()
                );
            }
        }
        Self { config, catalog }
    }

    pub fn config(&self) -> &LocaleConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// See [`LocaleConfig::resolve`]
    pub fn resolve(&self, request: Option<&str>, session: Option<&str>) -> Option<String> {
        self.config.resolve(request, session)
    }

    /// Run `work` under the effective locale for `resolved`
    pub async fn scope<F>(&self, resolved: Option<&str>, work: F) -> F::Output
    where
        F: Future,
    {
        let effective = self.config.effective_locale(resolved);
        with_locale(effective, work).await
    }

    /// Locale active in the current scope, else the default
    pub fn current_locale(&self) -> String {
        self.config.current()
    }

    /// Translate `key` in the current locale
    pub fn t(&self, key: &str) -> String {
        self.t_in(&self.current_locale(), key)
    }

    /// Translate `key` in an explicit locale
    pub fn t_in(&self, locale: &str, key: &str) -> String {
        if let Some(text) = self.catalog.lookup(locale, key) {
            return text.to_string();
        }

        let default = self.config.default_locale();
        if locale != default {
            if let Some(text) = self.catalog.lookup(default, key) {
                debug!("Missing '{}' in '{}', using '{}'", key, locale, default);
                return text.to_string();
            }
        }

        debug!("Missing translation '{}'", key);
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::with_locale_sync;

    fn i18n() -> I18n {
        let config = LocaleConfig::new("en", ["en", "fr", "de"]).unwrap();
        I18n::new(config, Catalog::builtin().unwrap())
    }

    #[test]
    fn test_builtin_catalogs_parse() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.locales(), vec!["de", "en", "fr"]);
    }

    #[test]
    fn test_lookup_dotted_key() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.lookup("en", "greeting"), Some("Welcome"));
        assert_eq!(
            catalog.lookup("en", "flash.unauthorized"),
            Some("You are not authorized to perform this action.")
        );
        // Table, not a string
        assert_eq!(catalog.lookup("en", "flash"), None);
        assert_eq!(catalog.lookup("en", "flash.unauthorized.extra"), None);
        assert_eq!(catalog.lookup("xx", "greeting"), None);
    }

    #[test]
    fn test_t_uses_scoped_locale() {
        let i18n = i18n();
        assert_eq!(i18n.t("greeting"), "Welcome");
        with_locale_sync("fr", || assert_eq!(i18n.t("greeting"), "Bienvenue"));
        with_locale_sync("de", || assert_eq!(i18n.t("greeting"), "Willkommen"));
        assert_eq!(i18n.t("greeting"), "Welcome");
    }

    #[test]
    fn test_t_falls_back_to_default_then_key() {
        let i18n = i18n();
        // de has no errors.not_found
        assert_eq!(i18n.t_in("de", "errors.not_found"), "Not found");
        assert_eq!(i18n.t_in("fr", "no.such.key"), "no.such.key");
    }

    #[test]
    fn test_merge_overrides_single_key() {
        let mut catalog = Catalog::builtin().unwrap();
        catalog
            .merge_str("en", "[flash]\nunauthorized = \"Access denied\"\n")
            .unwrap();
        assert_eq!(catalog.lookup("en", "flash.unauthorized"), Some("Access denied"));
        // Sibling keys survive the merge
        assert_eq!(
            catalog.lookup("en", "flash.locale_updated"),
            Some("Language preference saved.")
        );
    }

    #[test]
    fn test_load_dir_merges_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("es.toml"), "greeting = \"Bienvenido\"\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let mut catalog = Catalog::builtin().unwrap();
        let loaded = catalog.load_dir(dir.path()).unwrap();

        assert_eq!(loaded, 1);
        assert_eq!(catalog.lookup("es", "greeting"), Some("Bienvenido"));
    }

    #[test]
    fn test_load_dir_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.toml"), "greeting = ").unwrap();

        let mut catalog = Catalog::empty();
        let err = catalog.load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_dir_missing_directory() {
        let mut catalog = Catalog::empty();
        let err = catalog
            .load_dir(Path::new("/nonexistent/appkit/locales"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_scope_applies_effective_locale() {
        let i18n = i18n();
        let text = i18n.scope(Some("fr"), async { i18n.t("greeting") }).await;
        assert_eq!(text, "Bienvenue");

        let text = i18n.scope(None, async { i18n.t("greeting") }).await;
        assert_eq!(text, "Welcome");
        assert_eq!(i18n.current_locale(), "en");
    }
}
