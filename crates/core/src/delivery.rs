//! Delivery fee schedule and quotes.
//!
//! The fee schedule is tiered: a flat base covers roughly the first two
//! kilometers and every additional full kilometer adds one currency unit.
//! Between 23:00 and 07:00 the base carries a one-unit night surcharge;
//! the per-kilometer part never scales with the hour.

use serde::{Deserialize, Serialize};

use crate::types::{Coordinates, Price};

/// Base fee during daytime hours, in whole currency units.
pub const DAY_BASE_FEE: u32 = 4;

/// Base fee during the night window, in whole currency units.
pub const NIGHT_BASE_FEE: u32 = 5;

/// First hour (inclusive) of the night window.
pub const NIGHT_START_HOUR: u32 = 23;

/// First hour (exclusive) after the night window ends.
pub const NIGHT_END_HOUR: u32 = 7;

/// Distance below which only the base fee applies, in kilometers.
pub const BASE_DISTANCE_KM: f64 = 2.0;

/// Whether the night surcharge applies at the given local hour (0..=23).
#[must_use]
pub const fn is_night_hour(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// Delivery fee for a trip of `distance_km`, quoted at local `hour`.
///
/// Short trips (under [`BASE_DISTANCE_KM`]) cost only the base; beyond that,
/// each started kilometer past the first adds one unit.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn delivery_fee(distance_km: f64, hour: u32) -> Price {
    let base = if is_night_hour(hour) {
        NIGHT_BASE_FEE
    } else {
        DAY_BASE_FEE
    };
    let extra_km = if distance_km < BASE_DISTANCE_KM {
        0
    } else {
        // Distances are city-scale, so the cast cannot truncate in practice.
        (distance_km - 1.0).ceil().max(0.0) as u32
    };
    Price::from(base + extra_km)
}

/// A priced delivery estimate for one destination.
///
/// Produced by the quote pipeline after geocoding and routing succeed. A
/// quote is always complete: distance, duration, and fee are computed
/// together, never patched individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    /// Resolved destination coordinate.
    pub destination: Coordinates,
    /// Canonical formatted address for the destination.
    pub address: String,
    /// Driving distance from the store origin, in kilometers.
    pub distance_km: f64,
    /// Driving duration, in minutes rounded up.
    pub duration_min: u64,
    /// Fee under the tiered schedule.
    pub fee: Price,
}

impl DeliveryQuote {
    /// Build a quote from raw routing output (meters and seconds).
    #[must_use]
    pub fn from_route(
        destination: Coordinates,
        address: String,
        distance_meters: f64,
        duration_seconds: u64,
        hour: u32,
    ) -> Self {
        let distance_km = distance_meters / 1000.0;
        Self {
            destination,
            address,
            distance_km,
            duration_min: duration_seconds.div_ceil(60),
            fee: delivery_fee(distance_km, hour),
        }
    }
}
