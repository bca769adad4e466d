//! HTTP-facing error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use appkit_common::ServiceError;

use crate::authorization::Unauthorized;

/// Errors returned by handlers
#[derive(Error, Debug)]
pub enum AppError {
    /// Policy check failed; rescued into flash + redirect by the pipeline
    #[error(transparent)]
    Unauthorized(#[from] Unauthorized),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::Service(ServiceError::NotImplemented { .. }) => StatusCode::NOT_IMPLEMENTED,
            AppError::Service(ServiceError::Domain(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        if let AppError::Unauthorized(marker) = self {
            response.extensions_mut().insert(marker);
        }
        response
    }
}
