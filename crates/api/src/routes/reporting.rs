//! Back-office reports. All of them are recomputed on every request.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use reports::{DashboardStats, SalesReport, TransactionsReport};
use store::Store;

use crate::AppState;
use crate::auth::require_back_office;
use crate::error::ApiError;

/// GET /reports/sales
#[tracing::instrument(skip(state, headers))]
pub async fn sales<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<SalesReport>, ApiError> {
    require_back_office(&state.caller(&headers).await?)?;
    Ok(Json(state.sales.sales_report().await?))
}

/// GET /reports/transactions
#[tracing::instrument(skip(state, headers))]
pub async fn transactions<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<TransactionsReport>, ApiError> {
    require_back_office(&state.caller(&headers).await?)?;
    Ok(Json(reports::transactions_report(&state.store).await?))
}

/// GET /reports/dashboard
#[tracing::instrument(skip(state, headers))]
pub async fn dashboard<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<DashboardStats>, ApiError> {
    require_back_office(&state.caller(&headers).await?)?;
    Ok(Json(reports::dashboard_stats(&state.store).await?))
}
