//! Storefront bootstrap route.
//!
//! `GET /` assembles everything the home screen needs in one payload: active
//! stores with their open-now state, ordered categories, the service
//! locations, today's delivery window, and the WhatsApp number. Stores and
//! categories load independently; one failing leaves the other served.

use axum::{Json, extract::State};
use chrono::{Datelike, Local, NaiveTime, Timelike, Weekday};
use serde::Serialize;
use tracing::instrument;

use mercadito_core::types::category::sort_for_display;
use mercadito_core::{Category, Store, StoreId};

use crate::config::SERVICE_LOCATIONS;
use crate::error::Result;
use crate::state::AppState;

/// Bootstrap payload for the home screen.
#[derive(Debug, Serialize)]
pub struct StorefrontInfo {
    pub stores: Vec<StoreView>,
    pub categories: Vec<Category>,
    pub service_locations: Vec<ServiceLocationView>,
    pub business_hours: BusinessHoursView,
    pub whatsapp_number: String,
}

/// Store display data with its open-now state resolved.
#[derive(Debug, Serialize)]
pub struct StoreView {
    pub id: StoreId,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub open_now: bool,
}

/// A neighborhood the delivery service covers.
#[derive(Debug, Serialize)]
pub struct ServiceLocationView {
    pub name: &'static str,
    pub landmark: &'static str,
}

/// Today's delivery window banner.
#[derive(Debug, Serialize)]
pub struct BusinessHoursView {
    pub schedule: &'static str,
    pub open_now: bool,
}

/// Today's delivery window and open state.
///
/// Weekday evenings run 18:00-02:00; weekends open at noon. The early-morning
/// tail belongs to the previous day's window.
#[must_use]
pub fn business_hours(weekday: Weekday, hour: u32) -> BusinessHoursView {
    let (schedule, open_now) = match weekday {
        Weekday::Sat | Weekday::Sun => ("12:00 PM - 2:00 AM", hour >= 12 || hour < 2),
        _ => ("6:00 PM - 2:00 AM", hour >= 18 || hour < 2),
    };
    BusinessHoursView { schedule, open_now }
}

fn store_view(store: &Store, weekday: Weekday, time: NaiveTime) -> StoreView {
    StoreView {
        id: store.id,
        name: store.name.clone(),
        description: store.description.clone(),
        address: store.address.clone(),
        phone: store.phone.clone(),
        open_now: store.is_open_at(weekday, time),
    }
}

/// Serve the home screen bootstrap payload.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<StorefrontInfo>> {
    let (stores, categories) = tokio::join!(state.catalog().stores(), state.catalog().categories());

    // One section failing must not empty the other; only a total outage
    // becomes an error response.
    let (stores, categories) = match (stores, categories) {
        (Err(stores_error), Err(categories_error)) => {
            tracing::warn!(error = %categories_error, "Categories unavailable for bootstrap");
            return Err(stores_error.into());
        }
        pair => pair,
    };

    let now = Local::now();
    let weekday = now.weekday();
    let time = now.time();

    let stores = match stores {
        Ok(stores) => stores
            .iter()
            .filter(|store| store.active)
            .map(|store| store_view(store, weekday, time))
            .collect(),
        Err(error) => {
            tracing::warn!(%error, "Stores unavailable for bootstrap");
            Vec::new()
        }
    };

    let categories = match categories {
        Ok(mut categories) => {
            sort_for_display(&mut categories);
            categories
        }
        Err(error) => {
            tracing::warn!(%error, "Categories unavailable for bootstrap");
            Vec::new()
        }
    };

    Ok(Json(StorefrontInfo {
        stores,
        categories,
        service_locations: SERVICE_LOCATIONS
            .iter()
            .map(|&(name, landmark)| ServiceLocationView { name, landmark })
            .collect(),
        business_hours: business_hours(weekday, now.hour()),
        whatsapp_number: state.config().whatsapp.number.clone(),
    }))
}
