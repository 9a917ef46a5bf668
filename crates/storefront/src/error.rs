//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side failures to
//! Sentry before responding. All route handlers return `Result<T, AppError>`;
//! responses carry a JSON body of `{"error": {code, message, retryable}}` so
//! the client can tell a retryable backend hiccup from a dead end.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::backend::CatalogError;
use crate::geo::GeoError;

/// Device geolocation failure reported by the client.
///
/// The browser's geolocation API fails client-side; the client posts the
/// failure code and each code maps to its own message (they are deliberately
/// not collapsed into one generic string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("Permiso de ubicación denegado. Activa el acceso a tu ubicación e inténtalo de nuevo.")]
    PermissionDenied,
    #[error("No pudimos obtener tu ubicación actual. Ingresa tu dirección manualmente.")]
    PositionUnavailable,
    #[error("La búsqueda de tu ubicación tardó demasiado. Inténtalo de nuevo.")]
    Timeout,
}

impl GeolocationError {
    /// Stable machine-readable code for the response body.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
        }
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog backend operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Geocoding or routing operation failed.
    #[error("Geo error: {0}")]
    Geo(#[from] GeoError),

    /// Client reported a device geolocation failure.
    #[error("Geolocation error: {0}")]
    Geolocation(GeolocationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A "load more" request for the same list is still in flight.
    #[error("Page request already in flight")]
    PageInFlight,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code, machine-readable code, and retryable flag.
    const fn classify(&self) -> (StatusCode, &'static str, bool) {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "not_found", false)
            }
            Self::Catalog(err) => (
                StatusCode::BAD_GATEWAY,
                "catalog_unavailable",
                err.is_retryable(),
            ),
            Self::Geo(GeoError::ZeroResults) => (StatusCode::NOT_FOUND, "quote_not_found", false),
            Self::Geo(GeoError::RouteStatus(_)) => {
                (StatusCode::BAD_GATEWAY, "route_unavailable", true)
            }
            Self::Geo(GeoError::Parse(_)) => (StatusCode::BAD_GATEWAY, "geo_unavailable", false),
            Self::Geo(_) => (StatusCode::BAD_GATEWAY, "geo_unavailable", true),
            Self::Geolocation(err) => (StatusCode::BAD_REQUEST, err.code(), false),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", false),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            Self::PageInFlight => (StatusCode::CONFLICT, "page_in_flight", true),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", false),
        }
    }

    /// User-facing message. Internal details never leak to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => {
                "No encontramos lo que buscas.".to_owned()
            }
            Self::Catalog(_) => "No se pudo cargar el catálogo. Inténtalo de nuevo.".to_owned(),
            Self::Geo(GeoError::ZeroResults) => "No se encontró la dirección indicada.".to_owned(),
            Self::Geo(GeoError::RouteStatus(_)) => {
                "No se pudo calcular la ruta de entrega.".to_owned()
            }
            Self::Geo(_) => "El servicio de ubicación no está disponible en este momento.".to_owned(),
            Self::Geolocation(err) => err.to_string(),
            Self::BadRequest(message) => message.clone(),
            Self::PageInFlight => "Ya hay una carga en curso para esta lista.".to_owned(),
            Self::Internal(_) => "Error interno del servidor.".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
                "retryable": retryable,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
