//! Stock decrement boundary used after checkout.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use domain::{StockOutcome, StockPolicy, StockRequest};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct DecrementRequest {
    #[serde(default)]
    pub items: Vec<StockRequest>,
}

#[derive(Serialize)]
pub struct DecrementResponse {
    pub success: bool,
    pub outcomes: Vec<StockOutcome>,
}

/// POST /stock/decrement
///
/// The caller is verified through the identity provider; the decrements
/// themselves run against the store. Each entry floors at zero and unknown
/// items are skipped.
#[tracing::instrument(skip(state, headers, req))]
pub async fn decrement<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<DecrementRequest>,
) -> Result<Json<DecrementResponse>, ApiError> {
    let caller = state.caller(&headers).await?;

    if req.items.is_empty() {
        return Err(ApiError::BadRequest("No items provided".to_string()));
    }

    let outcomes = state
        .ledger
        .decrement_batch(&req.items, StockPolicy::Clamp)
        .await;

    if let Some(StockOutcome::Failed { item_id, error }) = outcomes
        .iter()
        .find(|o| matches!(o, StockOutcome::Failed { .. }))
    {
        return Err(ApiError::Internal(format!(
            "Stock decrement failed for item {item_id}: {error}"
        )));
    }

    tracing::info!(user_id = %caller.user_id, count = outcomes.len(), "Stock decremented");
    Ok(Json(DecrementResponse {
        success: true,
        outcomes,
    }))
}
