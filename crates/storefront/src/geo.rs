//! Geocoding and routing client.
//!
//! Talks to the geo proxy endpoints (`/geocode`, `/reverse-geocode`,
//! `/route-info`, `/save-route`). The proxy forwards to the maps provider and
//! answers with the provider's envelope: a `status` string plus results.
//! `ZERO_RESULTS` is normal (empty suggestion list); any other non-OK status
//! is an error.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use mercadito_core::Coordinates;

use crate::config::GeoConfig;

/// Request timeout for geocoding and routing calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when interacting with the geo endpoints.
#[derive(Debug, Error)]
pub enum GeoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Geocoding matched nothing.
    #[error("No results for the requested location")]
    ZeroResults,

    /// Geocoding service returned a non-OK status.
    #[error("Geocoding failed with status {0}")]
    GeocodeStatus(String),

    /// Routing service returned a non-OK status.
    #[error("Routing failed with status {0}")]
    RouteStatus(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A single geocoding match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeMatch {
    pub formatted_address: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub place_id: Option<String>,
}

impl GeocodeMatch {
    /// Destination coordinate of this match.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.geometry.location.lat,
            longitude: self.geometry.location.lng,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for LatLng {
    fn from(coordinates: Coordinates) -> Self {
        Self {
            lat: coordinates.latitude,
            lng: coordinates.longitude,
        }
    }
}

/// Driving distance and time between two points.
#[derive(Debug, Clone, Copy)]
pub struct RouteInfo {
    pub distance_meters: f64,
    pub duration_seconds: u64,
}

/// Payload for the best-effort route log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRoutePayload {
    pub name: String,
    pub description: String,
    pub stops: Vec<RouteStop>,
    pub estimated_distance: f64,
    pub estimated_duration: u64,
    pub scheduled_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStop {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub estimated_arrival_time: String,
}

/// Client for the geocoding/routing proxy.
#[derive(Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
    region: String,
    origin: Coordinates,
}

impl GeoClient {
    /// Create a new geo client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &GeoConfig) -> Result<Self, GeoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(config.api_key.expose_secret())
                .map_err(|e| GeoError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            region: config.region.clone(),
            origin: config.origin(),
        })
    }

    /// The fixed origin all routes are computed from.
    #[must_use]
    pub const fn origin(&self) -> Coordinates {
        self.origin
    }

    /// Geocode a free-text address, scoped to the service region.
    ///
    /// Returns an empty list when the provider reports `ZERO_RESULTS`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider reports any other
    /// non-OK status.
    #[instrument(skip(self, address))]
    pub async fn geocode(&self, address: &str) -> Result<Vec<GeocodeMatch>, GeoError> {
        let body = serde_json::json!({
            "address": address,
            "region": self.region,
        });
        self.fetch_matches("/geocode", &body).await
    }

    /// Resolve a device coordinate into an address.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the provider reports a non-OK,
    /// non-empty status.
    #[instrument(skip(self))]
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<GeocodeMatch>, GeoError> {
        let body = serde_json::json!({
            "latitude": latitude,
            "longitude": longitude,
        });
        self.fetch_matches("/reverse-geocode", &body).await
    }

    /// Driving route from the fixed store origin to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::RouteStatus`] when the provider reports a non-OK
    /// status, or another error if the request fails.
    #[instrument(skip(self))]
    pub async fn route_from_origin(&self, destination: Coordinates) -> Result<RouteInfo, GeoError> {
        let body = serde_json::json!({
            "origin": LatLng::from(self.origin),
            "destination": LatLng::from(destination),
            "mode": "driving",
        });

        let response = self
            .client
            .post(format!("{}/route-info", self.base_url))
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: RouteInfoResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Parse(e.to_string()))?;

        if payload.status != "OK" {
            return Err(GeoError::RouteStatus(payload.status));
        }

        match (payload.distance, payload.duration) {
            (Some(distance_meters), Some(duration_seconds)) => Ok(RouteInfo {
                distance_meters,
                duration_seconds,
            }),
            _ => Err(GeoError::Parse(
                "route response missing distance or duration".to_owned(),
            )),
        }
    }

    /// Record a computed route for operational tracking.
    ///
    /// Callers treat this as fire-and-forget; see
    /// [`crate::delivery::spawn_save_route`].
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn save_route(&self, payload: &SaveRoutePayload) -> Result<(), GeoError> {
        let response = self
            .client
            .post(format!("{}/save-route", self.base_url))
            .json(payload)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    /// POST a geocoding request and unwrap the provider envelope.
    async fn fetch_matches(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<Vec<GeocodeMatch>, GeoError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Parse(e.to_string()))?;

        match payload.status.as_str() {
            "OK" => Ok(payload.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(GeoError::GeocodeStatus(other.to_owned())),
        }
    }
}

/// Provider envelope for geocoding responses.
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeMatch>,
}

/// Provider envelope for route responses.
#[derive(Debug, Deserialize)]
struct RouteInfoResponse {
    status: String,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    duration: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_geocode_match_coordinates() {
        let matched = GeocodeMatch {
            formatted_address: "Av. Principal 123, Nasca".to_owned(),
            geometry: Geometry {
                location: LatLng {
                    lat: -14.83,
                    lng: -74.94,
                },
            },
            place_id: Some("abc123".to_owned()),
        };
        let coordinates = matched.coordinates();
        assert!((coordinates.latitude - (-14.83)).abs() < f64::EPSILON);
        assert!((coordinates.longitude - (-74.94)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_geocode_response_zero_results_deserializes_without_results() {
        let payload: GeocodeResponse =
            serde_json::from_str(r#"{"status":"ZERO_RESULTS"}"#).unwrap();
        assert_eq!(payload.status, "ZERO_RESULTS");
        assert!(payload.results.is_empty());
    }

    #[test]
    fn test_save_route_payload_uses_camel_case() {
        let payload = SaveRoutePayload {
            name: "Delivery a Av. Principal 123".to_owned(),
            description: "Pedido Mercadito".to_owned(),
            stops: vec![RouteStop {
                address: "Av. Principal 123".to_owned(),
                latitude: -14.83,
                longitude: -74.94,
                estimated_arrival_time: "2024-06-01T18:30:00Z".to_owned(),
            }],
            estimated_distance: 3.2,
            estimated_duration: 9,
            scheduled_date: "2024-06-01T18:00:00Z".to_owned(),
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("estimatedDistance").is_some());
        assert!(json.get("scheduledDate").is_some());
        assert!(json["stops"][0].get("estimatedArrivalTime").is_some());
    }
}
