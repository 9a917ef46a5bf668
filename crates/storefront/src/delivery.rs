//! Delivery estimation pipeline.
//!
//! Suggest → resolve → route → price. Suggestions are debounced server-side:
//! every request carries a client-assigned, monotonically increasing sequence
//! number, and only the response for the latest registered sequence is
//! applied ("last request wins"). Route logging is fire-and-forget.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{Timelike, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use mercadito_core::Coordinates;
use mercadito_core::delivery::DeliveryQuote;

use crate::geo::{GeoClient, GeoError, GeocodeMatch, RouteStop, SaveRoutePayload};

/// How long a suggestion request waits for a newer keystroke to supersede it.
pub const SUGGEST_DEBOUNCE: Duration = Duration::from_millis(300);

/// Per-session "last request wins" guard for address suggestions.
///
/// Tracks the highest sequence number seen per session. A request re-checks
/// its own sequence after the debounce window and again after the upstream
/// call; once a newer sequence has been registered the older response is
/// discarded without being applied.
#[derive(Default)]
pub struct SuggestTracker {
    latest: Mutex<HashMap<Uuid, u64>>,
}

impl SuggestTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `seq` as the latest request for `key`.
    ///
    /// Returns `false` when a newer sequence is already registered, i.e. the
    /// request was stale on arrival.
    pub async fn register(&self, key: Uuid, seq: u64) -> bool {
        let mut latest = self.latest.lock().await;
        let entry = latest.entry(key).or_insert(0);
        if seq < *entry {
            return false;
        }
        *entry = seq;
        true
    }

    /// Whether `seq` is still the latest registered sequence for `key`.
    pub async fn is_current(&self, key: Uuid, seq: u64) -> bool {
        self.latest
            .lock()
            .await
            .get(&key)
            .is_some_and(|latest| *latest == seq)
    }
}

/// First geocoding match, or [`GeoError::ZeroResults`] when there is none.
///
/// # Errors
///
/// Returns [`GeoError::ZeroResults`] for an empty match list.
pub fn first_match(matches: Vec<GeocodeMatch>) -> Result<GeocodeMatch, GeoError> {
    matches.into_iter().next().ok_or(GeoError::ZeroResults)
}

/// Route from the store origin to `destination` and price the trip.
///
/// The fee depends on the local hour at quote time (night surcharge from
/// 23:00 to 07:00).
///
/// # Errors
///
/// Returns an error when routing fails; the caller must clear any stored
/// quote rather than keep a stale one.
pub async fn quote_for_destination(
    geo: &GeoClient,
    destination: Coordinates,
    address: String,
) -> Result<DeliveryQuote, GeoError> {
    let route = geo.route_from_origin(destination).await?;
    let hour = chrono::Local::now().hour();
    Ok(DeliveryQuote::from_route(
        destination,
        address,
        route.distance_meters,
        route.duration_seconds,
        hour,
    ))
}

/// Record the computed route in the background.
///
/// Best-effort: a failure is logged and never reaches the quote flow.
pub fn spawn_save_route(geo: GeoClient, quote: DeliveryQuote) {
    tokio::spawn(async move {
        let now = Utc::now();
        let arrival = now
            + chrono::Duration::minutes(i64::try_from(quote.duration_min).unwrap_or_default());
        let payload = SaveRoutePayload {
            name: format!("Delivery a {}", quote.address),
            description: "Pedido Mercadito".to_owned(),
            stops: vec![RouteStop {
                address: quote.address.clone(),
                latitude: quote.destination.latitude,
                longitude: quote.destination.longitude,
                estimated_arrival_time: arrival.to_rfc3339(),
            }],
            estimated_distance: quote.distance_km,
            estimated_duration: quote.duration_min,
            scheduled_date: now.to_rfc3339(),
        };

        if let Err(error) = geo.save_route(&payload).await {
            tracing::warn!(%error, "Failed to record delivery route");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geo::{Geometry, LatLng};

    #[tokio::test]
    async fn test_register_rejects_stale_sequence() {
        let tracker = SuggestTracker::new();
        let key = Uuid::new_v4();

        assert!(tracker.register(key, 1).await);
        assert!(tracker.register(key, 3).await);
        // Sequence 2 arrives late, after 3 was already registered
        assert!(!tracker.register(key, 2).await);
    }

    #[tokio::test]
    async fn test_is_current_after_supersession() {
        let tracker = SuggestTracker::new();
        let key = Uuid::new_v4();

        tracker.register(key, 1).await;
        assert!(tracker.is_current(key, 1).await);

        tracker.register(key, 2).await;
        assert!(!tracker.is_current(key, 1).await);
        assert!(tracker.is_current(key, 2).await);
    }

    #[tokio::test]
    async fn test_sessions_do_not_interfere() {
        let tracker = SuggestTracker::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        tracker.register(first, 5).await;
        assert!(tracker.register(second, 1).await);
        assert!(tracker.is_current(first, 5).await);
    }

    #[test]
    fn test_first_match_on_empty_is_zero_results() {
        assert!(matches!(first_match(Vec::new()), Err(GeoError::ZeroResults)));
    }

    #[test]
    fn test_first_match_takes_head() {
        let matches = vec![
            GeocodeMatch {
                formatted_address: "Calle Lima 100, Nasca".to_owned(),
                geometry: Geometry {
                    location: LatLng {
                        lat: -14.82,
                        lng: -74.93,
                    },
                },
                place_id: None,
            },
            GeocodeMatch {
                formatted_address: "Calle Lima 100, Lima".to_owned(),
                geometry: Geometry {
                    location: LatLng { lat: -12.0, lng: -77.0 },
                },
                place_id: None,
            },
        ];
        let matched = first_match(matches).unwrap();
        assert_eq!(matched.formatted_address, "Calle Lima 100, Nasca");
    }
}
