//! HTTP API handlers for appkit-web

pub mod account;
pub mod health;
pub mod home;
pub mod locale;

pub use account::{show_account, show_admin};
pub use health::health_routes;
pub use home::home;
pub use locale::update_locale;
