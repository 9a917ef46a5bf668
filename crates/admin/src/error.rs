//! Unified error handling for the admin service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::backend::BackendError;

/// Application-level error type for the admin service.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Catalog backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Submitted form failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for handler results.
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    /// Whether this error is the service's fault rather than the caller's.
    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Backend(
                BackendError::Http(_) | BackendError::Api { .. } | BackendError::Parse(_)
            ) | Self::Internal(_)
        )
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the management UI. Internal details stay in the
    /// logs.
    fn public_message(&self) -> String {
        match self {
            Self::Backend(BackendError::NotFound(_)) | Self::NotFound(_) => {
                "No encontrado.".to_owned()
            }
            Self::Backend(_) => "Error al comunicarse con el catálogo.".to_owned(),
            Self::Internal(_) => "Error interno del servidor.".to_owned(),
            Self::BadRequest(message) => message.clone(),
            Self::Validation(_) => "Los datos enviados no son válidos.".to_owned(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();
        match self {
            Self::Validation(errors) => {
                (status, Json(json!({ "errors": field_messages(&errors) }))).into_response()
            }
            other => {
                (status, Json(json!({ "error": other.public_message() }))).into_response()
            }
        }
    }
}

/// Flatten validation errors into `{field: [messages]}`.
///
/// Cross-field rules land under the `__all__` key, which is where the
/// validator derive puts schema-level failures.
fn field_messages(errors: &ValidationErrors) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = errors
        .field_errors()
        .iter()
        .map(|(field, list)| {
            let messages: Vec<serde_json::Value> = list
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map_or_else(|| error.code.to_string(), ToString::to_string)
                        .into()
                })
                .collect();
            ((*field).to_string(), serde_json::Value::Array(messages))
        })
        .collect();
    serde_json::Value::Object(map)
}
