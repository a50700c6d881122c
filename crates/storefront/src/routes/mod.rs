//! HTTP route handlers for the cart API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                   - Liveness check
//! GET    /health/ready             - Readiness check (probes the store)
//!
//! # Carts
//! POST   /api/carts                - Mint a fresh cart ID
//! GET    /api/carts/{id}           - Cart contents and totals
//! DELETE /api/carts/{id}           - Clear the cart
//! GET    /api/carts/{id}/count     - Item count badge value
//! POST   /api/carts/{id}/items     - Add an item (merges by identity key)
//! PATCH  /api/carts/{id}/items     - Update a line's quantity
//! DELETE /api/carts/{id}/items     - Remove a line
//!
//! # Checkout
//! GET    /api/carts/{id}/summary   - Order summary with shipping applied
//! POST   /api/carts/{id}/checkout  - Place the order and clear the cart
//! ```

pub mod cart;
pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/carts", post(cart::create))
        .route("/carts/{id}", get(cart::show).delete(cart::clear))
        .route("/carts/{id}/count", get(cart::count))
        .route(
            "/carts/{id}/items",
            post(cart::add_item)
                .patch(cart::update_item)
                .delete(cart::remove_item),
        )
        .route("/carts/{id}/summary", get(checkout::summary))
        .route("/carts/{id}/checkout", post(checkout::place_order))
}

/// Create the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new().nest("/api", cart_routes())
}
