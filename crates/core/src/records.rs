//! Raw catalog backend records and their conversion to core entities.
//!
//! The backend is loosely typed: booleans arrive as `0`/`1` on old rows and
//! as real booleans on new ones, prices as numbers or strings, times as
//! `HH:MM` strings. Everything is normalized here so nothing loose crosses
//! into filter or pricing logic. A record that fails validation converts to
//! a [`RecordError`] and the caller skips it with a warning.

use core::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

use crate::{
    Category, CategoryId, Coordinates, Price, Product, ProductId, Schedule, ScheduleError, Store,
    StoreId,
};

/// A boolean that deserializes from `true`/`false` or `1`/`0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FlagVisitor;

        impl Visitor<'_> for FlagVisitor {
            type Value = Flag;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a boolean or 0/1")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Flag, E> {
                Ok(Flag(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Flag, E> {
                match v {
                    0 => Ok(Flag(false)),
                    1 => Ok(Flag(true)),
                    other => Err(E::custom(format!("invalid flag value: {other}"))),
                }
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Flag, E> {
                match v {
                    0 => Ok(Flag(false)),
                    1 => Ok(Flag(true)),
                    other => Err(E::custom(format!("invalid flag value: {other}"))),
                }
            }
        }

        deserializer.deserialize_any(FlagVisitor)
    }
}

/// Why a backend record was rejected during normalization.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("missing name")]
    MissingName,
    #[error("missing price")]
    MissingPrice,
    #[error("negative price: {0}")]
    NegativePrice(Decimal),
    #[error("missing category id")]
    MissingCategory,
    #[error("missing store id")]
    MissingStore,
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}

/// A product row as the backend sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<u32>,
    pub active: Flag,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub products_category_id: Option<i64>,
    #[serde(default)]
    pub store_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProductRecord> for Product {
    type Error = RecordError;

    fn try_from(record: ProductRecord) -> Result<Self, Self::Error> {
        let name = non_empty(record.name).ok_or(RecordError::MissingName)?;
        let amount = record.price.ok_or(RecordError::MissingPrice)?;
        let price = Price::new(amount).map_err(|_| RecordError::NegativePrice(amount))?;
        let category_id = record
            .products_category_id
            .ok_or(RecordError::MissingCategory)?;
        let store_id = record.store_id.ok_or(RecordError::MissingStore)?;

        Ok(Self {
            id: ProductId::new(record.id),
            name,
            description: non_empty(record.description),
            price,
            active: record.active.0,
            category_id: CategoryId::new(category_id),
            store_id: StoreId::new(store_id),
            image_url: non_empty(record.image_url),
            stock: record.stock,
        })
    }
}

/// A category row as the backend sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl TryFrom<CategoryRecord> for Category {
    type Error = RecordError;

    fn try_from(record: CategoryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(record.id),
            name: non_empty(record.name).ok_or(RecordError::MissingName)?,
            image_url: non_empty(record.image_url),
            order: record.order,
        })
    }
}

/// A store row as the backend sends it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    // The active flag arrives as `active` on some rows and `state` on
    // others; both spellings are accepted, `active` wins when both appear.
    #[serde(default)]
    pub active: Option<Flag>,
    #[serde(default)]
    pub state: Option<Flag>,
    #[serde(default)]
    pub all_day: Option<Flag>,
    /// Opening time, `HH:MM`
    #[serde(default)]
    pub init: Option<String>,
    /// Closing time, `HH:MM`
    #[serde(default)]
    pub close: Option<String>,
    /// 0 = Sunday .. 6 = Saturday
    #[serde(default)]
    pub day_off: Option<u8>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub long: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<StoreRecord> for Store {
    type Error = RecordError;

    fn try_from(record: StoreRecord) -> Result<Self, Self::Error> {
        let name = non_empty(record.name).ok_or(RecordError::MissingName)?;

        let all_day = record.all_day.is_some_and(|flag| flag.0);
        let open = record.init.as_deref().map(parse_time).transpose()?;
        let close = record.close.as_deref().map(parse_time).transpose()?;
        // Rows written before the schedule fields existed carry neither
        // times nor the all-day flag; those stores have no schedule at all.
        let schedule = if all_day || open.is_some() || close.is_some() {
            Some(Schedule::new(all_day, open, close, record.day_off)?)
        } else {
            None
        };

        let coordinates = match (record.lat, record.long) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(Self {
            id: StoreId::new(record.id),
            name,
            description: non_empty(record.description),
            address: non_empty(record.address),
            phone: non_empty(record.phone),
            active: record.active.or(record.state).is_some_and(|flag| flag.0),
            schedule,
            coordinates,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

/// Parse an `HH:MM` (or `HH:MM:SS`) time string.
fn parse_time(s: &str) -> Result<NaiveTime, RecordError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| RecordError::InvalidTime(s.to_owned()))
}

/// Treat empty and whitespace-only strings as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
