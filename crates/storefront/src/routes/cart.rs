//! Cart route handlers.
//!
//! Carts are addressed by an opaque token minted by `POST /api/carts`.
//! Every mutation answers with the cart as it is after the change; storage
//! faults are never visible here.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pideai_core::{CartItemId, CartLineItem, CartToken, ModifierId, Price, ProductId, Selection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartSnapshot, CartStore};
use crate::error::Result;
use crate::state::AppState;

/// A line item with its computed prices.
#[derive(Debug, Serialize)]
pub struct LineView {
    #[serde(flatten)]
    pub item: CartLineItem,
    pub unit_price: Price,
    pub line_total: Price,
}

impl From<CartLineItem> for LineView {
    fn from(item: CartLineItem) -> Self {
        Self {
            unit_price: item.unit_price(),
            line_total: item.line_total(),
            item,
        }
    }
}

/// Cart as returned to clients.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub token: CartToken,
    pub items: Vec<LineView>,
    pub total_items: u64,
    pub total_price: Price,
}

impl CartView {
    fn new(token: CartToken, snapshot: CartSnapshot) -> Self {
        Self {
            token,
            items: snapshot.items.into_iter().map(LineView::from).collect(),
            total_items: snapshot.total_items,
            total_price: snapshot.total_price,
        }
    }

    fn of(token: CartToken, store: &CartStore) -> Self {
        Self::new(token, store.snapshot())
    }
}

/// Request body for confirming a configured product.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default)]
    pub selection: Selection,
    /// Independently toggled ungrouped modifiers.
    #[serde(default)]
    pub ungrouped: BTreeSet<ModifierId>,
}

/// Response to a successful add.
#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    pub cart_item_id: CartItemId,
    pub cart: CartView,
}

/// Request body for a quantity change.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Create an empty cart.
#[instrument(skip(state))]
pub async fn create(State(state): State<AppState>) -> (StatusCode, Json<CartView>) {
    let token = state.carts().new_token();
    let store = state.carts().open(&token).await;
    (StatusCode::CREATED, Json(CartView::of(token, &store)))
}

/// Show a cart. Unknown tokens read as empty carts.
#[instrument(skip(state), fields(cart_token = %token))]
pub async fn show(State(state): State<AppState>, Path(token): Path<CartToken>) -> Json<CartView> {
    let store = state.carts().open(&token).await;
    Json(CartView::of(token, &store))
}

/// Validate a configured product and add it.
#[instrument(skip(state, request), fields(cart_token = %token, product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    Path(token): Path<CartToken>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<AddItemResponse>)> {
    let store = state.carts().open(&token).await;
    let cart_item_id = store
        .add_configured_item(&request.product_id, &request.selection, &request.ungrouped)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddItemResponse {
            cart_item_id,
            cart: CartView::of(token, &store),
        }),
    ))
}

/// Set a line's quantity; zero or below removes it.
#[instrument(skip(state, request), fields(cart_token = %token, cart_item_id = %cart_item_id))]
pub async fn update(
    State(state): State<AppState>,
    Path((token, cart_item_id)): Path<(CartToken, CartItemId)>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Json<CartView> {
    let store = state.carts().open(&token).await;
    store.update_quantity(&cart_item_id, request.quantity);
    Json(CartView::of(token, &store))
}

/// Remove a line. Removing an absent line is not an error.
#[instrument(skip(state), fields(cart_token = %token, cart_item_id = %cart_item_id))]
pub async fn remove(
    State(state): State<AppState>,
    Path((token, cart_item_id)): Path<(CartToken, CartItemId)>,
) -> Json<CartView> {
    let store = state.carts().open(&token).await;
    store.remove_item(&cart_item_id);
    Json(CartView::of(token, &store))
}

/// Empty the cart.
#[instrument(skip(state), fields(cart_token = %token))]
pub async fn clear(State(state): State<AppState>, Path(token): Path<CartToken>) -> Json<CartView> {
    let store = state.carts().open(&token).await;
    store.clear_cart();
    Json(CartView::of(token, &store))
}
