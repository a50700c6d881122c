//! Cart sessions and the persistence side channel.
//!
//! The aggregate itself lives in `pomelo_core::cart`; this module wraps it
//! with the process-level concerns: one guarded session per cart ID, a
//! change-event stream after every mutation, and a best-effort persistence
//! subscriber writing snapshots to a durable key-value store.

pub mod session;
pub mod store;

pub use session::{CartHandle, CartRegistry, CartSession};
pub use store::{CartSnapshot, CartStore, MemoryCartStore, PgCartStore, StoreError};
