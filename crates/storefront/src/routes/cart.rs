//! Cart route handlers.
//!
//! Every mutation is total on the aggregate side: stock overflow clamps,
//! missing lines no-op. The add response therefore carries the
//! requested/applied quantities so clients can tell the shopper when a
//! request was only partially honored instead of silently swallowing the
//! clamp.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use pomelo_core::cart::{LineItem, LineKey};
use pomelo_core::{CartId, Condition, ProductId, StorageCapacity};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::CartSession;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub storage: Option<StorageCapacity>,
    pub condition: Option<Condition>,
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub list_price: Option<String>,
    pub line_total: String,
}

impl From<&LineItem> for CartLineView {
    fn from(line: &LineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            category: line.category.clone(),
            storage: line.storage,
            condition: line.condition,
            color: line.color.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price.display(),
            list_price: line.list_price.as_ref().map(pomelo_core::Price::display),
            line_total: line.line_total().display(),
        }
    }
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    pub(crate) fn of(session: &CartSession) -> Self {
        Self {
            id: session.id(),
            items: session.cart().lines().iter().map(CartLineView::from).collect(),
            subtotal: session.cart().total_price().display(),
            item_count: session.cart().total_item_count(),
        }
    }
}

/// Variant selection shared by item requests.
#[derive(Debug, Deserialize)]
pub struct VariantSelection {
    pub storage: Option<StorageCapacity>,
    pub condition: Option<Condition>,
    pub color: Option<String>,
}

impl VariantSelection {
    fn key(&self, product_id: ProductId) -> LineKey {
        LineKey {
            product_id,
            storage: self.storage,
            condition: self.condition,
            color: self.color.clone(),
        }
    }
}

/// Add-item request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub variant: VariantSelection,
    pub quantity: Option<u32>,
}

/// Update-quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub variant: VariantSelection,
    pub quantity: u32,
}

/// Remove-item request body.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub variant: VariantSelection,
}

/// Response for a freshly minted cart.
#[derive(Debug, Serialize)]
pub struct CreatedCart {
    pub id: CartId,
}

/// Response for the count badge endpoint.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Response for add-item, carrying the clamp signal.
#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    /// Quantity the client asked for.
    pub requested: u32,
    /// Quantity actually added after stock clamping.
    pub applied: u32,
    /// Whether the request was only partially honored.
    pub clamped: bool,
    pub cart: CartView,
}

/// Mint a fresh cart ID.
///
/// The cart itself is created lazily on first use; an ID that is never
/// written to costs nothing.
#[instrument]
pub async fn create() -> impl IntoResponse {
    let id = CartId::random();
    (StatusCode::CREATED, Json(CreatedCart { id }))
}

/// Display cart contents and totals.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<CartId>) -> Json<CartView> {
    let handle = state.carts().session(id).await;
    let session = handle.lock().await;
    Json(CartView::of(&session))
}

/// Add an item to the cart.
///
/// Looks the product up in the catalog for display fields and the current
/// stock level, then merges into the cart by identity key.
#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>> {
    let product = state
        .catalog()
        .product(&request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let candidate = product.candidate(
        request.variant.storage,
        request.variant.condition,
        request.variant.color,
    );

    let handle = state.carts().session(id).await;
    let mut session = handle.lock().await;
    let change = session.add_item(candidate, request.quantity.unwrap_or(1));

    Ok(Json(AddItemResponse {
        requested: change.requested,
        applied: change.applied,
        clamped: change.is_clamped(),
        cart: CartView::of(&session),
    }))
}

/// Update a line's quantity, clamped to `1..=available_stock`.
///
/// A missing line is a no-op, not an error; the response always shows the
/// cart as it now stands.
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
    Json(request): Json<UpdateItemRequest>,
) -> Json<CartView> {
    let key = request.variant.key(request.product_id);

    let handle = state.carts().session(id).await;
    let mut session = handle.lock().await;
    session.update_quantity(&key, request.quantity);
    Json(CartView::of(&session))
}

/// Remove the line exactly matching the given identity key. No-op on miss.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<CartId>,
    Json(request): Json<RemoveItemRequest>,
) -> Json<CartView> {
    let key = request.variant.key(request.product_id);

    let handle = state.carts().session(id).await;
    let mut session = handle.lock().await;
    session.remove_item(&key);
    Json(CartView::of(&session))
}

/// Empty the cart unconditionally.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>, Path(id): Path<CartId>) -> Json<CartView> {
    let handle = state.carts().session(id).await;
    let mut session = handle.lock().await;
    session.clear();
    Json(CartView::of(&session))
}

/// Item count badge value.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>, Path(id): Path<CartId>) -> Json<CartCount> {
    let handle = state.carts().session(id).await;
    let session = handle.lock().await;
    Json(CartCount {
        count: session.cart().total_item_count(),
    })
}
