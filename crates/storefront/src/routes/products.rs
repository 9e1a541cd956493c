//! Product customization handlers.
//!
//! These expose the selection validator to the customization dialog. They
//! are stateless: the client holds the in-progress selection and sends it
//! back with every call.

use std::collections::BTreeSet;

use axum::{
    Json,
    extract::{Path, State},
};
use pideai_core::{
    GroupId, GroupSchema, Modifier, ModifierId, Price, Product, ProductId, ProductSchema,
    Selection, ValidationResult,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Everything the customization dialog needs to render.
#[derive(Debug, Serialize)]
pub struct CustomizationView {
    pub product: Product,
    pub groups: Vec<GroupSchema>,
    pub ungrouped: Vec<Modifier>,
    /// Initial selection under the configured policy.
    pub selection: Selection,
    pub validation: ValidationResult,
    pub price_delta: Price,
    pub unit_price: Price,
}

/// Request body for toggling one option.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default)]
    pub selection: Selection,
    pub group_id: GroupId,
    pub modifier_id: ModifierId,
    #[serde(default)]
    pub ungrouped: BTreeSet<ModifierId>,
}

/// Request body for checking a selection.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub ungrouped: BTreeSet<ModifierId>,
}

/// Outcome of a selection check.
#[derive(Debug, Serialize)]
pub struct PricedSelection {
    pub selection: Selection,
    pub validation: ValidationResult,
    pub price_delta: Price,
    /// Base price plus the delta.
    pub unit_price: Price,
}

impl PricedSelection {
    fn new(schema: &ProductSchema, selection: Selection, ungrouped: &BTreeSet<ModifierId>) -> Self {
        let validation = pideai_core::validate(&selection, &schema.modifiers.groups);
        let price_delta = pideai_core::price_delta(&selection, ungrouped, &schema.modifiers);
        Self {
            unit_price: schema.product.base_price + price_delta,
            selection,
            validation,
            price_delta,
        }
    }
}

async fn load_schema(state: &AppState, id: &ProductId) -> Result<ProductSchema> {
    state
        .catalog()
        .product_schema(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product not found: {id}")))
}

/// Product options with the initial selection.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn customization(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<CustomizationView>> {
    let schema = load_schema(&state, &id).await?;
    let selection = state.default_selection().select(&schema.modifiers.groups);
    let priced = PricedSelection::new(&schema, selection, &BTreeSet::new());

    Ok(Json(CustomizationView {
        product: schema.product,
        groups: schema.modifiers.groups,
        ungrouped: schema.modifiers.ungrouped,
        selection: priced.selection,
        validation: priced.validation,
        price_delta: priced.price_delta,
        unit_price: priced.unit_price,
    }))
}

/// Toggle one option and return the new selection.
///
/// Single-choice groups replace their choice; multiple-choice groups flip
/// membership. Overflowing a group is allowed here and reported by
/// validation.
#[instrument(skip(state, request), fields(product_id = %id, group_id = %request.group_id))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<PricedSelection>> {
    let schema = load_schema(&state, &id).await?;
    let group = schema
        .modifiers
        .group(&request.group_id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown modifier group: {}", request.group_id)))?;

    let selection = pideai_core::toggle(
        &request.selection,
        &group.group.id,
        &request.modifier_id,
        group.group.selection_type,
    );
    Ok(Json(PricedSelection::new(&schema, selection, &request.ungrouped)))
}

/// Validate a selection and price it.
#[instrument(skip(state, request), fields(product_id = %id))]
pub async fn validate(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<PricedSelection>> {
    let schema = load_schema(&state, &id).await?;
    Ok(Json(PricedSelection::new(
        &schema,
        request.selection,
        &request.ungrouped,
    )))
}
