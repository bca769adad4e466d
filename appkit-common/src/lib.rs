//! # appkit Common Library
//!
//! Framework-independent pieces shared by appkit services:
//! - Locale resolution and task-scoped locale activation
//! - Translation catalogs
//! - The service-object calling convention
//! - Configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod i18n;
pub mod locale;
pub mod service;

pub use error::{Error, Result};
pub use i18n::{Catalog, I18n};
pub use locale::LocaleConfig;
pub use service::{ApplicationService, ServiceError, ServiceResult};
