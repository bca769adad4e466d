//! appkit-web library - application request pipeline
//!
//! Every application route runs through the same layers, outermost first:
//!
//! 1. session: load or create the cookie-keyed session
//! 2. authentication: resolve the current user
//! 3. locale: resolve the request locale and activate it for the rest
//! 4. browser gate: reject outdated browsers with 406
//! 5. rescue: turn authorization failures into flash + redirect back
//!
//! `/health` bypasses the pipeline.

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::trace::TraceLayer;

use appkit_common::{Catalog, I18n, LocaleConfig};

pub mod api;
pub mod auth;
pub mod authorization;
pub mod browser;
pub mod error;
pub mod locale;
pub mod rescue;
pub mod services;
pub mod session;

use auth::{Authenticator, SessionAuthenticator};
use browser::BrowserPolicy;
use session::SessionStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub i18n: Arc<I18n>,
    pub sessions: SessionStore,
    pub authenticator: Arc<dyn Authenticator>,
    pub browser_policy: Arc<BrowserPolicy>,
}

impl AppState {
    /// State with session authentication and the modern-browser policy
    pub fn new(i18n: I18n) -> Self {
        Self {
            i18n: Arc::new(i18n),
            sessions: SessionStore::new(),
            authenticator: Arc::new(SessionAuthenticator),
            browser_policy: Arc::new(BrowserPolicy::modern()),
        }
    }

    /// Built-in translations for `config`
    pub fn with_locale_config(config: LocaleConfig) -> appkit_common::Result<Self> {
        Ok(Self::new(I18n::new(config, Catalog::builtin()?)))
    }

    pub fn with_authenticator(mut self, authenticator: impl Authenticator + 'static) -> Self {
        self.authenticator = Arc::new(authenticator);
        self
    }

    pub fn with_browser_policy(mut self, policy: BrowserPolicy) -> Self {
        self.browser_policy = Arc::new(policy);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    // Layers wrap everything added before them; the last one added runs first
    let app = Router::new()
        .route("/", get(api::home))
        .route("/account", get(api::show_account))
        .route("/admin", get(api::show_admin))
        .route("/locale", post(api::update_locale))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rescue::rescue_unauthorized,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            browser::browser_gate,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            locale::switch_locale,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::session_middleware,
        ));

    Router::new()
        .merge(app)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
