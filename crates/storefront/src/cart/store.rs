//! Durable key-value storage for cart snapshots.
//!
//! Carts are persisted whole: one serialized value per cart under a fixed
//! namespace prefix, written after every mutation and read once when a
//! session opens. The store is deliberately dumb - it never interprets the
//! payload, so schema evolution is handled entirely by
//! [`CartSnapshot::decode`] and the aggregate's normalizing constructor.
//!
//! Two backends ship: [`MemoryCartStore`] for tests and database-less
//! deployments, and [`PgCartStore`] for durable storage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pomelo_core::CartId;
use pomelo_core::cart::{Cart, LineItem};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::RwLock;

/// Namespace prefix for all persisted cart values.
///
/// Bump the version segment when the snapshot format changes incompatibly;
/// old values then simply fail to decode and fall back to an empty cart.
pub const CART_NAMESPACE: &str = "pomelo:cart:v1";

/// Storage key for one cart.
#[must_use]
pub fn cart_key(id: CartId) -> String {
    format!("{CART_NAMESPACE}:{id}")
}

/// Errors from the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The persisted form of a cart: its entire line sequence plus a write
/// timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items in insertion order.
    pub lines: Vec<LineItem>,
    /// When this snapshot was taken.
    pub updated_at: DateTime<Utc>,
}

impl CartSnapshot {
    /// Snapshot the current state of a cart.
    #[must_use]
    pub fn of_cart(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            updated_at: Utc::now(),
        }
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error; snapshot types contain nothing that can
    /// actually fail to serialize, but the persistence subscriber still logs
    /// rather than panics if this ever changes.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored value.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error for corrupt or incompatible payloads;
    /// callers fall back to an empty cart.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// A durable key-value store for serialized cart snapshots.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Check that the backend is reachable. Used by the readiness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Process-local store. State is lost on restart; used by tests and by
/// deployments without a database configured.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// `PostgreSQL`-backed store: one row per cart in `cart_snapshots`.
#[derive(Debug, Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the snapshot table if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the DDL fails.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cart_snapshots (
                key TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM cart_snapshots WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO cart_snapshots (key, payload, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (key)
             DO UPDATE SET payload = EXCLUDED.payload, updated_at = now()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use pomelo_core::cart::CandidateItem;
    use pomelo_core::{Price, ProductId};

    use super::*;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            CandidateItem {
                product_id: ProductId::new("iphone-13"),
                name: "iPhone 13".to_owned(),
                unit_price: Price::from_cents(39_900),
                list_price: None,
                category: "smartphones".to_owned(),
                available_stock: 5,
                storage: None,
                condition: None,
                color: None,
            },
            2,
        );
        cart
    }

    #[test]
    fn snapshot_round_trips() {
        let cart = sample_cart();
        let snapshot = CartSnapshot::of_cart(&cart);
        let encoded = snapshot.encode().expect("encode");
        let decoded = CartSnapshot::decode(&encoded).expect("decode");

        assert_eq!(decoded.lines, cart.lines());
        assert_eq!(Cart::from_lines(decoded.lines), cart);
    }

    #[test]
    fn corrupt_snapshot_fails_to_decode() {
        assert!(CartSnapshot::decode("{\"lines\": 7}").is_err());
        assert!(CartSnapshot::decode("").is_err());
    }

    #[test]
    fn cart_keys_are_namespaced_and_distinct() {
        let a = CartId::random();
        let b = CartId::random();
        assert!(cart_key(a).starts_with(CART_NAMESPACE));
        assert_ne!(cart_key(a), cart_key(b));
    }

    #[tokio::test]
    async fn memory_store_saves_and_loads() {
        let store = MemoryCartStore::new();
        assert_eq!(store.load("k").await.expect("load"), None);

        store.save("k", "v1").await.expect("save");
        assert_eq!(store.load("k").await.expect("load"), Some("v1".to_owned()));

        store.save("k", "v2").await.expect("save");
        assert_eq!(store.load("k").await.expect("load"), Some("v2".to_owned()));
    }
}
