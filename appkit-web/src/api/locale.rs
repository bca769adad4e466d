//! Locale preference endpoint

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::info;

use appkit_common::service;

use crate::error::AppError;
use crate::rescue::redirect_back_target;
use crate::services::{LocaleUpdate, UpdateLocalePreference};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LocaleForm {
    pub locale: String,
}

/// POST /locale
///
/// Stores the preference in the session so later requests without a
/// `locale` parameter use it, then redirects back.
pub async fn update_locale(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    headers: HeaderMap,
    Form(form): Form<LocaleForm>,
) -> Result<Response, AppError> {
    let config = state.i18n.config();
    let saved = session
        .update(|data| {
            service::save::<UpdateLocalePreference>(LocaleUpdate {
                config,
                session: data,
                locale: form.locale,
            })
        })
        .await?;

    if let Some(id) = session.id().await {
        info!("Session {} locale set to {}", id, saved);
    }

    let notice = state.i18n.t_in(&saved, "flash.locale_updated");
    session.update(|data| data.flash.notice = Some(notice)).await;

    Ok(Redirect::to(&redirect_back_target(&headers)).into_response())
}
