//! Configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: a warning is logged and the
//! remaining tiers apply. A config file that exists but cannot be parsed, or
//! a locale set that does not contain the default locale, is fatal.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::locale::LocaleConfig;
use crate::{Error, Result};

pub const ENV_BIND: &str = "APPKIT_BIND";
pub const ENV_DEFAULT_LOCALE: &str = "APPKIT_DEFAULT_LOCALE";
pub const ENV_AVAILABLE_LOCALES: &str = "APPKIT_AVAILABLE_LOCALES";
pub const ENV_LOCALES_DIR: &str = "APPKIT_LOCALES_DIR";
pub const ENV_LOG_LEVEL: &str = "APPKIT_LOG_LEVEL";

/// Compiled-in fallback values
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_address: SocketAddr,
    pub default_locale: String,
    pub available_locales: Vec<String>,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 5790)),
            default_locale: "en".to_string(),
            available_locales: vec!["en".to_string(), "fr".to_string(), "de".to_string()],
            log_level: "info".to_string(),
        }
    }
}

/// On-disk configuration, every field optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub default_locale: Option<String>,
    pub available_locales: Option<Vec<String>>,
    pub locales_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub config_file: Option<PathBuf>,
    pub locales_dir: Option<PathBuf>,
    pub default_locale: Option<String>,
}

/// Fully resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: SocketAddr,
    pub locale: LocaleConfig,
    pub locales_dir: Option<PathBuf>,
    pub log_level: String,
}

impl AppConfig {
    /// Resolve configuration from all tiers
    pub fn resolve(cli: CliOverrides) -> Result<Self> {
        let file = load_toml_config(cli.config_file.as_deref())?;
        Self::from_sources(cli, file, CompiledDefaults::default())
    }

    /// Combine already-loaded sources; environment variables are read here
    pub fn from_sources(
        cli: CliOverrides,
        file: TomlConfig,
        defaults: CompiledDefaults,
    ) -> Result<Self> {
        let bind_address = match cli
            .bind_address
            .or_else(|| env_var(ENV_BIND))
            .or(file.bind_address)
        {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", raw, e)))?,
            None => defaults.bind_address,
        };

        let default_locale = cli
            .default_locale
            .or_else(|| env_var(ENV_DEFAULT_LOCALE))
            .or(file.default_locale)
            .unwrap_or(defaults.default_locale);

        let available_locales = env_var(ENV_AVAILABLE_LOCALES)
            .map(|raw| {
                raw.split(',')
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
            })
            .or(file.available_locales)
            .unwrap_or(defaults.available_locales);

        let locale = LocaleConfig::new(default_locale, available_locales)?;

        let locales_dir = cli
            .locales_dir
            .or_else(|| env_var(ENV_LOCALES_DIR).map(PathBuf::from))
            .or(file.locales_dir);

        let log_level = env_var(ENV_LOG_LEVEL)
            .or(file.log_level)
            .unwrap_or(defaults.log_level);

        Ok(Self {
            bind_address,
            locale,
            locales_dir,
            log_level,
        })
    }
}

/// Default config file location: `<config_dir>/appkit/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("appkit").join("config.toml"))
}

/// Load the config file
///
/// An explicit path that does not exist is an error. A missing file at the
/// default location is not.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        info!("Loading config from {}", path.display());
        return TomlConfig::from_file(path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            TomlConfig::from_file(&path)
        }
        Some(path) => {
            warn!(
                "No config file at {}, using environment and defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using environment and defaults");
            Ok(TomlConfig::default())
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
