//! Inventory catalog endpoints.
//!
//! Any authenticated caller may browse; writes need an owner or staff role.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::ItemId;
use store::{InventoryItem, InventoryItemPatch, NewInventoryItem, Store};

use crate::AppState;
use crate::auth::require_back_office;
use crate::error::ApiError;

use super::parse_id;

/// GET /inventory: every item, ordered by name.
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    state.caller(&headers).await?;
    Ok(Json(state.ledger.get_all().await?))
}

/// GET /inventory/{id}
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<InventoryItem>, ApiError> {
    state.caller(&headers).await?;
    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.ledger.get(id).await?))
}

/// POST /inventory
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<NewInventoryItem>,
) -> Result<(StatusCode, Json<InventoryItem>), ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;

    let item = state.ledger.create(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PATCH /inventory/{id}: only the fields present in the body change.
#[tracing::instrument(skip(state, headers, patch))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<InventoryItemPatch>,
) -> Result<Json<InventoryItem>, ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;

    let id: ItemId = parse_id(&id)?;
    Ok(Json(state.ledger.update(id, patch).await?))
}

/// DELETE /inventory/{id}
#[tracing::instrument(skip(state, headers))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;

    let id: ItemId = parse_id(&id)?;
    state.ledger.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
