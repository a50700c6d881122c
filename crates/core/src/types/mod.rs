//! Core types for Pomelo Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod variant;

pub use id::*;
pub use price::{Price, PriceError};
pub use variant::{Condition, StorageCapacity};
