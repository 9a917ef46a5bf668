//! Store management route handlers.
//!
//! Store writes are plain JSON; the form keys match the backend's wire
//! spellings, `state` for the active flag included.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use mercadito_core::{Store, StoreId};

use crate::backend::StoreInput;
use crate::error::Result;
use crate::forms::StoreForm;
use crate::state::AppState;

/// Full store listing payload.
#[derive(Debug, Serialize)]
pub struct StoreListResponse {
    pub stores: Vec<Store>,
}

/// Store detail payload.
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    pub store: Store,
}

/// List every store, inactive ones included.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<StoreListResponse>> {
    let stores = state.backend().stores().await?;
    Ok(Json(StoreListResponse { stores }))
}

/// Display one store.
#[instrument(skip(state), fields(store_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreResponse>> {
    let store = state.backend().store(id).await?;
    Ok(Json(StoreResponse { store }))
}

/// Create a store.
#[instrument(skip(state, form), fields(name = %form.name))]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<StoreForm>,
) -> Result<(StatusCode, Json<StoreResponse>)> {
    let input = form.into_input()?;
    let store = state.backend().create_store(&input).await?;
    Ok((StatusCode::CREATED, Json(StoreResponse { store })))
}

/// Update a store.
#[instrument(skip(state, form), fields(store_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
    Json(form): Json<StoreForm>,
) -> Result<Json<StoreResponse>> {
    let input = form.into_input()?;
    let store = state.backend().update_store(id, &input).await?;
    Ok(Json(StoreResponse { store }))
}

/// Delete a store.
#[instrument(skip(state), fields(store_id = %id))]
pub async fn destroy(State(state): State<AppState>, Path(id): Path<StoreId>) -> Result<StatusCode> {
    state.backend().delete_store(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Flip a store's active flag.
///
/// The backend has no partial update, so this fetches the store and
/// re-submits every field with the flag inverted.
#[instrument(skip(state), fields(store_id = %id))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<StoreId>,
) -> Result<Json<StoreResponse>> {
    let store = state.backend().store(id).await?;
    let input = resubmission(&store, !store.active);
    let store = state.backend().update_store(id, &input).await?;
    Ok(Json(StoreResponse { store }))
}

/// Rebuild the write payload from a stored store, with the given active
/// flag.
///
/// A store with no stored schedule reads as always open, so it is
/// re-submitted as all-day.
fn resubmission(store: &Store, active: bool) -> StoreInput {
    let schedule = store.schedule.as_ref();
    let all_day = schedule.is_none_or(|s| s.all_day);

    let format_hm = |time: chrono::NaiveTime| time.format("%H:%M").to_string();
    let (init, close) = if all_day {
        ("00:00".to_owned(), "23:59".to_owned())
    } else {
        (
            schedule
                .and_then(|s| s.open)
                .map_or_else(|| "00:00".to_owned(), format_hm),
            schedule
                .and_then(|s| s.close)
                .map_or_else(|| "23:59".to_owned(), format_hm),
        )
    };

    StoreInput {
        name: store.name.clone(),
        address: store.address.clone().unwrap_or_default(),
        phone: store.phone.clone().unwrap_or_default(),
        description: store.description.clone().unwrap_or_default(),
        state: active,
        all_day,
        init,
        close,
        day_off: schedule.and_then(|s| s.day_off),
        lat: store.coordinates.map(|c| c.latitude),
        long: store.coordinates.map(|c| c.longitude),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use mercadito_core::{Coordinates, Schedule};

    fn sample_store() -> Store {
        Store {
            id: StoreId::new(4),
            name: "Bodega Central".to_owned(),
            description: Some("Abarrotes y más".to_owned()),
            address: Some("Av. Principal #123".to_owned()),
            phone: Some("956111222".to_owned()),
            active: true,
            schedule: Some(
                Schedule::new(
                    false,
                    NaiveTime::from_hms_opt(8, 0, 0),
                    NaiveTime::from_hms_opt(20, 30, 0),
                    Some(0),
                )
                .unwrap(),
            ),
            coordinates: Some(Coordinates {
                latitude: -14.8356,
                longitude: -74.9399,
            }),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_resubmission_preserves_schedule_and_flips_flag() {
        let input = resubmission(&sample_store(), false);
        assert!(!input.state);
        assert!(!input.all_day);
        assert_eq!(input.init, "08:00");
        assert_eq!(input.close, "20:30");
        assert_eq!(input.day_off, Some(0));
        assert_eq!(input.lat, Some(-14.8356));
    }

    #[test]
    fn test_resubmission_without_schedule_is_all_day() {
        let mut store = sample_store();
        store.schedule = None;
        store.coordinates = None;

        let input = resubmission(&store, true);
        assert!(input.all_day);
        assert_eq!(input.init, "00:00");
        assert_eq!(input.close, "23:59");
        assert_eq!(input.day_off, None);
        assert_eq!(input.lat, None);
    }
}
