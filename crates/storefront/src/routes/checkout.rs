//! Checkout route handlers.
//!
//! The summary endpoint applies the shipping step function to the cart's
//! totals; placing an order mints an order ID and clears the cart. Payment
//! and fulfillment belong to downstream services.

use axum::{
    Json,
    extract::{Path, State},
};
use pomelo_core::{CartId, OrderId};
use serde::Serialize;
use tracing::instrument;

use crate::checkout::OrderSummary;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Order summary display data.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummaryView {
    pub subtotal: String,
    pub shipping_fee: String,
    pub grand_total: String,
    pub item_count: u32,
    pub free_shipping: bool,
}

impl From<OrderSummary> for OrderSummaryView {
    fn from(summary: OrderSummary) -> Self {
        Self {
            subtotal: summary.subtotal.display(),
            shipping_fee: summary.shipping_fee.display(),
            grand_total: summary.grand_total.display(),
            item_count: summary.item_count,
            free_shipping: summary.shipping_fee.is_zero(),
        }
    }
}

/// Confirmation returned after order placement.
#[derive(Debug, Serialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub summary: OrderSummaryView,
}

/// Order summary for the cart's current state.
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
) -> Json<OrderSummaryView> {
    let handle = state.carts().session(id).await;
    let session = handle.lock().await;
    let summary = OrderSummary::for_cart(session.cart(), state.shipping());
    Json(OrderSummaryView::from(summary))
}

/// Place the order and clear the cart.
///
/// An empty cart cannot be checked out.
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
) -> Result<Json<OrderConfirmation>> {
    let handle = state.carts().session(id).await;
    let mut session = handle.lock().await;

    if session.cart().is_empty() {
        return Err(AppError::BadRequest("cart is empty".to_owned()));
    }

    let summary = OrderSummary::for_cart(session.cart(), state.shipping());
    let order_id = OrderId::random();

    // The order-processing collaborator owns everything past this point;
    // successful placement clears the cart.
    session.clear();

    tracing::info!(cart_id = %id, %order_id, grand_total = %summary.grand_total, "order placed");

    Ok(Json(OrderConfirmation {
        order_id,
        summary: OrderSummaryView::from(summary),
    }))
}
