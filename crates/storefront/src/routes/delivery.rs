//! Delivery quote route handlers.
//!
//! Suggest debounces keystrokes server-side: each request carries a client
//! sequence number, waits out the debounce window, and is abandoned when a
//! newer sequence has registered for the session. Quote resolves a
//! destination (typed address, chosen suggestion, or device coordinates),
//! routes it from the fixed store origin, prices it, and stores the result
//! in the session. Persisting the route for the courier is best-effort and
//! never blocks the response.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use mercadito_core::delivery::DeliveryQuote;
use mercadito_core::types::Coordinates;

use crate::delivery::{SUGGEST_DEBOUNCE, first_match, quote_for_destination, spawn_save_route};
use crate::error::{AppError, GeolocationError, Result, add_breadcrumb};
use crate::geo::GeocodeMatch;
use crate::models::session_keys;
use crate::routes::cart::cart_key;
use crate::state::AppState;

/// Suggest query parameters; `seq` orders requests from one input field.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub q: String,
    pub seq: u64,
}

/// Address suggestions for the dropdown.
#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: Vec<SuggestionView>,
    /// Set when a newer request superseded this one; the client discards
    /// stale responses without touching the dropdown.
    pub stale: bool,
}

/// One geocoded suggestion, ready to be echoed back to the quote endpoint.
#[derive(Debug, Serialize)]
pub struct SuggestionView {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub location: Coordinates,
}

impl From<GeocodeMatch> for SuggestionView {
    fn from(found: GeocodeMatch) -> Self {
        let location = found.coordinates();
        Self {
            address: found.formatted_address,
            place_id: found.place_id,
            location,
        }
    }
}

impl SuggestResponse {
    const fn stale() -> Self {
        Self {
            suggestions: Vec::new(),
            stale: true,
        }
    }
}

/// The destination for a quote, in one of the forms the client can produce.
///
/// Variant order matters: serde tries them top to bottom, and a suggestion
/// body is also a valid typed-address body.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuoteRequest {
    /// Client-side geolocation failed before a position was produced.
    GeolocationFailed {
        geolocation_error: GeolocationError,
    },
    /// A suggestion picked from the dropdown, already geocoded.
    Suggestion {
        address: String,
        #[serde(default)]
        place_id: Option<String>,
        location: Coordinates,
    },
    /// Raw device coordinates from the geolocation API.
    Device { latitude: f64, longitude: f64 },
    /// A free-typed address not yet geocoded.
    Typed { address: String },
}

/// Suggest addresses within the service region as the shopper types.
#[instrument(skip(state, session))]
pub async fn suggest(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SuggestQuery>,
) -> Result<Json<SuggestResponse>> {
    let session_key = cart_key(&session).await?;

    if !state.suggestions().register(session_key, query.seq).await {
        return Ok(Json(SuggestResponse::stale()));
    }

    let term = query.q.trim().to_owned();
    if term.is_empty() {
        return Ok(Json(SuggestResponse {
            suggestions: Vec::new(),
            stale: false,
        }));
    }

    tokio::time::sleep(SUGGEST_DEBOUNCE).await;
    if !state.suggestions().is_current(session_key, query.seq).await {
        return Ok(Json(SuggestResponse::stale()));
    }

    let matches = state.geo().geocode(&term).await?;

    // A newer keystroke may have arrived while the geocode ran.
    if !state.suggestions().is_current(session_key, query.seq).await {
        return Ok(Json(SuggestResponse::stale()));
    }

    Ok(Json(SuggestResponse {
        suggestions: matches.into_iter().map(SuggestionView::from).collect(),
        stale: false,
    }))
}

/// Resolve the request into a destination coordinate and display address.
async fn resolve(state: &AppState, request: QuoteRequest) -> Result<(Coordinates, String)> {
    match request {
        QuoteRequest::GeolocationFailed { geolocation_error } => {
            Err(AppError::Geolocation(geolocation_error))
        }
        QuoteRequest::Suggestion {
            address,
            place_id,
            location,
        } => {
            if let Some(place_id) = place_id {
                add_breadcrumb(
                    "delivery",
                    "Quoting chosen suggestion",
                    Some(&[("place_id", place_id.as_str())]),
                );
            }
            Ok((location, address))
        }
        QuoteRequest::Device {
            latitude,
            longitude,
        } => {
            let matches = state.geo().reverse_geocode(latitude, longitude).await?;
            let found = first_match(matches)?;
            // The device position stays the destination; the reverse geocode
            // only names it.
            Ok((
                Coordinates {
                    latitude,
                    longitude,
                },
                found.formatted_address,
            ))
        }
        QuoteRequest::Typed { address } => {
            let matches = state.geo().geocode(&address).await?;
            let found = first_match(matches)?;
            Ok((found.coordinates(), found.formatted_address))
        }
    }
}

async fn compute_quote(state: &AppState, request: QuoteRequest) -> Result<DeliveryQuote> {
    let (destination, address) = resolve(state, request).await?;
    Ok(quote_for_destination(state.geo(), destination, address).await?)
}

/// Compute a delivery quote and store it in the session.
///
/// The stored quote is replaced only by a successful recompute; any failure
/// clears it so the cart never shows a fee for an address that no longer
/// resolves.
#[instrument(skip(state, session, request))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<DeliveryQuote>> {
    match compute_quote(&state, request).await {
        Ok(quote) => {
            session
                .insert(session_keys::DELIVERY_QUOTE, &quote)
                .await
                .map_err(|source| {
                    AppError::Internal(format!("Failed to persist delivery quote: {source}"))
                })?;
            spawn_save_route(state.geo().clone(), quote.clone());
            Ok(Json(quote))
        }
        Err(error) => {
            clear_stored_quote(&session).await;
            Err(error)
        }
    }
}

/// Drop the stored quote (address cleared or cart modal closed).
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    clear_stored_quote(&session).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_stored_quote(session: &Session) {
    if let Err(error) = session
        .remove::<DeliveryQuote>(session_keys::DELIVERY_QUOTE)
        .await
    {
        tracing::warn!(%error, "Failed to clear stored delivery quote");
    }
}
