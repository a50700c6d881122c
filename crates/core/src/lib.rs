//! Pomelo Core - Shared types and the cart aggregate.
//!
//! This crate provides the domain model used across all Pomelo Market
//! components:
//! - `storefront` - Public-facing JSON API over the cart
//! - `integration-tests` - End-to-end tests against the storefront router
//!
//! # Architecture
//!
//! The core crate contains only types and in-memory logic - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere. `available_stock` is supplied by the caller (sourced
//! from a prior catalog lookup); the cart never fetches anything itself.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and variants
//! - [`cart`] - The cart aggregate: line items, identity keys, clamping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CandidateItem, LineItem, LineKey, QuantityChange};
pub use types::*;
