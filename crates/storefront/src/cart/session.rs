//! Per-cart sessions with a persistence subscriber.
//!
//! Each cart gets one [`CartSession`] per process, guarded by a mutex so
//! mutations are atomic with respect to each other (the model assumes a
//! single active writer per cart; cross-device synchronization is out of
//! scope). After every successful mutation the session publishes a
//! [`CartSnapshot`] change event on a watch channel; a subscriber task per
//! session writes the latest snapshot to the [`CartStore`].
//!
//! Persistence is best effort and fire-and-forget: a failed write is logged
//! and never rolls back or blocks the in-memory mutation, so the cart stays
//! responsive regardless of storage availability. The watch channel coalesces
//! bursts - only the newest snapshot matters.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use pomelo_core::CartId;
use pomelo_core::cart::{CandidateItem, Cart, LineKey, QuantityChange};
use tokio::sync::{Mutex, watch};

use super::store::{CartSnapshot, CartStore, cart_key};

/// Sessions idle longer than this are evicted; state is already durable by
/// then, so the next access simply reloads from the store.
const SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const SESSION_CAPACITY: u64 = 10_000;

/// Shared handle to one cart's session.
pub type CartHandle = Arc<Mutex<CartSession>>;

/// One cart plus its change-event publisher.
///
/// All mutation is routed through the session's methods; external code never
/// touches the aggregate directly, which is what preserves its invariants no
/// matter how many handlers read or trigger mutations.
pub struct CartSession {
    id: CartId,
    cart: Cart,
    changes: watch::Sender<CartSnapshot>,
}

impl CartSession {
    fn new(id: CartId, cart: Cart) -> (Self, watch::Receiver<CartSnapshot>) {
        let (changes, receiver) = watch::channel(CartSnapshot::of_cart(&cart));
        (Self { id, cart, changes }, receiver)
    }

    /// The cart's identifier.
    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    /// Read access to the aggregate.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Add an item; see [`Cart::add_item`].
    pub fn add_item(&mut self, candidate: CandidateItem, quantity: u32) -> QuantityChange {
        let change = self.cart.add_item(candidate, quantity);
        if change.applied > 0 {
            self.publish();
        }
        change
    }

    /// Remove an item; see [`Cart::remove_item`].
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let removed = self.cart.remove_item(key);
        if removed {
            self.publish();
        }
        removed
    }

    /// Update a line's quantity; see [`Cart::update_quantity`].
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> Option<u32> {
        let result = self.cart.update_quantity(key, quantity);
        if result.is_some() {
            self.publish();
        }
        result
    }

    /// Empty the cart; see [`Cart::clear`].
    pub fn clear(&mut self) {
        if self.cart.is_empty() {
            return;
        }
        self.cart.clear();
        self.publish();
    }

    fn publish(&self) {
        self.changes.send_replace(CartSnapshot::of_cart(&self.cart));
    }
}

/// Factory and cache for [`CartSession`]s, one per cart ID.
#[derive(Clone)]
pub struct CartRegistry {
    store: Arc<dyn CartStore>,
    sessions: Cache<CartId, CartHandle>,
}

impl CartRegistry {
    /// Create a registry backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self {
            store,
            sessions: Cache::builder()
                .max_capacity(SESSION_CAPACITY)
                .time_to_idle(SESSION_IDLE_TIMEOUT)
                .build(),
        }
    }

    /// Get the session for `id`, opening it from the store on first access.
    pub async fn session(&self, id: CartId) -> CartHandle {
        let store = Arc::clone(&self.store);
        self.sessions.get_with(id, open_session(store, id)).await
    }
}

/// Open a session: seed the aggregate from the persisted snapshot (missing,
/// corrupt, or unreadable snapshots yield an empty cart, never an error) and
/// spawn its persistence subscriber.
async fn open_session(store: Arc<dyn CartStore>, id: CartId) -> CartHandle {
    let key = cart_key(id);

    let cart = match store.load(&key).await {
        Ok(Some(raw)) => match CartSnapshot::decode(&raw) {
            Ok(snapshot) => Cart::from_lines(snapshot.lines),
            Err(error) => {
                tracing::warn!(cart_id = %id, %error, "discarding corrupt cart snapshot");
                Cart::new()
            }
        },
        Ok(None) => Cart::new(),
        Err(error) => {
            tracing::warn!(cart_id = %id, %error, "cart store unreachable, starting empty");
            Cart::new()
        }
    };

    let (session, receiver) = CartSession::new(id, cart);
    tokio::spawn(persist_changes(store, key, receiver));
    Arc::new(Mutex::new(session))
}

/// Persistence subscriber: write every observed snapshot, newest wins. Exits
/// when the session (and with it the watch sender) is dropped.
async fn persist_changes(
    store: Arc<dyn CartStore>,
    key: String,
    mut receiver: watch::Receiver<CartSnapshot>,
) {
    while receiver.changed().await.is_ok() {
        let snapshot = receiver.borrow_and_update().clone();
        let encoded = match snapshot.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(%key, %error, "failed to encode cart snapshot");
                continue;
            }
        };
        if let Err(error) = store.save(&key, &encoded).await {
            tracing::warn!(%key, %error, "failed to persist cart snapshot");
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pomelo_core::{Price, ProductId};

    use super::super::store::{MemoryCartStore, StoreError};
    use super::*;

    /// A store whose backend is permanently down.
    struct FailingStore;

    #[async_trait]
    impl CartStore for FailingStore {
        async fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn save(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Database(sqlx::Error::PoolClosed))
        }
    }

    fn phone(stock: u32) -> CandidateItem {
        CandidateItem {
            product_id: ProductId::new("iphone-13"),
            name: "iPhone 13".to_owned(),
            unit_price: Price::from_cents(39_900),
            list_price: None,
            category: "smartphones".to_owned(),
            available_stock: stock,
            storage: None,
            condition: None,
            color: None,
        }
    }

    async fn stored_snapshot(store: &MemoryCartStore, key: &str) -> Option<CartSnapshot> {
        // The subscriber writes asynchronously; poll briefly.
        for _ in 0..100 {
            if let Some(raw) = store.load(key).await.expect("memory store is infallible") {
                return CartSnapshot::decode(&raw).ok();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        None
    }

    #[tokio::test]
    async fn mutation_is_persisted_by_the_subscriber() {
        let store = Arc::new(MemoryCartStore::new());
        let registry = CartRegistry::new(Arc::clone(&store) as Arc<dyn CartStore>);
        let id = CartId::random();

        let handle = registry.session(id).await;
        handle.lock().await.add_item(phone(5), 2);

        let snapshot = stored_snapshot(&store, &cart_key(id))
            .await
            .expect("snapshot persisted");
        assert_eq!(snapshot.lines.len(), 1);
        assert_eq!(snapshot.lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn persisted_snapshot_seeds_a_new_registry() {
        let store = Arc::new(MemoryCartStore::new());
        let id = CartId::random();

        {
            let registry = CartRegistry::new(Arc::clone(&store) as Arc<dyn CartStore>);
            let handle = registry.session(id).await;
            handle.lock().await.add_item(phone(5), 3);
            assert!(stored_snapshot(&store, &cart_key(id)).await.is_some());
        }

        // A fresh registry (fresh process, same store) sees the same cart.
        let registry = CartRegistry::new(Arc::clone(&store) as Arc<dyn CartStore>);
        let handle = registry.session(id).await;
        let session = handle.lock().await;
        assert_eq!(session.cart().total_item_count(), 3);
    }

    #[tokio::test]
    async fn corrupt_snapshot_opens_as_empty_cart() {
        let store = Arc::new(MemoryCartStore::new());
        let id = CartId::random();
        store
            .save(&cart_key(id), "definitely not json")
            .await
            .expect("save");

        let registry = CartRegistry::new(Arc::clone(&store) as Arc<dyn CartStore>);
        let handle = registry.session(id).await;
        assert!(handle.lock().await.cart().is_empty());
    }

    #[tokio::test]
    async fn missing_snapshot_opens_as_empty_cart() {
        let registry = CartRegistry::new(Arc::new(MemoryCartStore::new()));
        let handle = registry.session(CartId::random()).await;
        assert!(handle.lock().await.cart().is_empty());
    }

    #[tokio::test]
    async fn unreachable_store_opens_empty_and_never_blocks_mutations() {
        let registry = CartRegistry::new(Arc::new(FailingStore));
        let handle = registry.session(CartId::random()).await;

        let mut session = handle.lock().await;
        assert!(session.cart().is_empty());

        let change = session.add_item(phone(5), 2);
        assert_eq!(change.applied, 2);
        drop(session);

        // Every write the subscriber attempts fails; the in-memory mutation
        // must stand regardless.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.lock().await.cart().total_item_count(), 2);
    }

    #[tokio::test]
    async fn clear_persists_the_empty_cart() {
        let store = Arc::new(MemoryCartStore::new());
        let registry = CartRegistry::new(Arc::clone(&store) as Arc<dyn CartStore>);
        let id = CartId::random();

        let handle = registry.session(id).await;
        {
            let mut session = handle.lock().await;
            session.add_item(phone(5), 2);
            session.clear();
        }

        // Poll until the persisted snapshot reflects the cleared cart.
        for _ in 0..100 {
            match stored_snapshot(&store, &cart_key(id)).await {
                Some(snapshot) if snapshot.lines.is_empty() => return,
                _ => tokio::time::sleep(Duration::from_millis(5)).await,
            }
        }
        panic!("cleared cart was never persisted");
    }
}
