//! In-process cart storage.
//!
//! Carts live server-side, keyed by an id the session cookie carries. One
//! async mutex guards the whole map, so rapid repeated mutations from the
//! same shopper (or two tabs on one session) apply atomically and in the
//! order they arrive. Carts are ephemeral and do not survive a restart.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use mercadito_core::cart::Cart;

/// Registry of live session carts.
#[derive(Default)]
pub struct CartRegistry {
    carts: Mutex<HashMap<Uuid, Cart>>,
}

impl CartRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the cart for `key` under the registry lock, creating
    /// an empty cart first if the key is new.
    pub async fn mutate<T>(&self, key: Uuid, f: impl FnOnce(&mut Cart) -> T) -> T {
        let mut carts = self.carts.lock().await;
        f(carts.entry(key).or_default())
    }

    /// Clone of the cart for `key`; an empty cart when the key is unknown.
    pub async fn snapshot(&self, key: Uuid) -> Cart {
        self.carts.lock().await.get(&key).cloned().unwrap_or_default()
    }
}
