//! Store entity with opening schedule and location.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::id::StoreId;

/// Errors that can occur when building a [`Schedule`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Open and close times are required unless the store is open all day.
    #[error("open and close times are required when the store is not open all day")]
    MissingHours,
    /// Day-off index outside 0 (Sunday) ..= 6 (Saturday).
    #[error("day off must be 0..=6 (got {0})")]
    InvalidDayOff(u8),
}

/// Weekly opening schedule.
///
/// `day_off` uses the backend's encoding: 0 = Sunday through 6 = Saturday.
/// A window whose close time is earlier than its open time wraps past
/// midnight (e.g. 18:00-02:00 is open at 01:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub all_day: bool,
    pub open: Option<NaiveTime>,
    pub close: Option<NaiveTime>,
    pub day_off: Option<u8>,
}

impl Schedule {
    /// Build a schedule, enforcing the open/close invariant.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::MissingHours`] when `all_day` is false and
    /// either bound is absent, and [`ScheduleError::InvalidDayOff`] for a
    /// day-off index outside 0..=6.
    pub fn new(
        all_day: bool,
        open: Option<NaiveTime>,
        close: Option<NaiveTime>,
        day_off: Option<u8>,
    ) -> Result<Self, ScheduleError> {
        if !all_day && (open.is_none() || close.is_none()) {
            return Err(ScheduleError::MissingHours);
        }
        if let Some(day) = day_off
            && day > 6
        {
            return Err(ScheduleError::InvalidDayOff(day));
        }
        Ok(Self {
            all_day,
            open,
            close,
            day_off,
        })
    }

    /// Whether the store is open at the given local weekday and time.
    ///
    /// The whole day-off calendar day counts as closed, including the early
    /// hours an overnight window from the previous day would otherwise cover.
    #[must_use]
    pub fn is_open_at(&self, weekday: Weekday, time: NaiveTime) -> bool {
        if let Some(day_off) = self.day_off
            && u32::from(day_off) == weekday.num_days_from_sunday()
        {
            return false;
        }
        if self.all_day {
            return true;
        }
        let (Some(open), Some(close)) = (self.open, self.close) else {
            return false;
        };
        if close < open {
            // Overnight window, e.g. 18:00-02:00
            time >= open || time < close
        } else {
            time >= open && time < close
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A participating store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Store {
    /// Open-now check against the schedule; stores without one count as open
    /// whenever they are active.
    #[must_use]
    pub fn is_open_at(&self, weekday: Weekday, time: NaiveTime) -> bool {
        if !self.active {
            return false;
        }
        self.schedule
            .as_ref()
            .is_none_or(|s| s.is_open_at(weekday, time))
    }
}
