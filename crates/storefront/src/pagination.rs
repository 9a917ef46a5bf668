//! In-flight guard for "load more" requests.
//!
//! At most one product-page request may be in flight per session and list.
//! A second request for the same list while one is pending gets a conflict
//! instead of racing it; pages therefore arrive in order by construction.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

type SlotSet = Arc<Mutex<HashSet<(Uuid, String)>>>;

/// Tracks which (session, list) pairs have a page request in flight.
#[derive(Default)]
pub struct PageGate {
    in_flight: SlotSet,
}

impl PageGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `session` and `signature`.
    ///
    /// Returns `None` when a request for the same list is already in flight.
    /// The returned token releases the slot when dropped, so error paths
    /// cannot wedge the list.
    #[must_use]
    pub fn begin(&self, session: Uuid, signature: &str) -> Option<PageToken> {
        let key = (session, signature.to_owned());
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(PageToken {
            slots: Arc::clone(&self.in_flight),
            key: Some(key),
        })
    }
}

/// Holds a claimed page slot; releases it on drop.
pub struct PageToken {
    slots: SlotSet,
    key: Option<(Uuid, String)>,
}

impl Drop for PageToken {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let mut in_flight = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            in_flight.remove(&key);
        }
    }
}
