//! Recommendation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use common::ClientId;
use recommend::{RecommendRole, RecommendationResponse};
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::auth::require_back_office;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub role: String,
    /// Whose history to use for `client` recommendations. Honored for
    /// back-office callers only; everyone else gets their own.
    #[serde(default, alias = "userId")]
    pub user_id: Option<ClientId>,
}

/// POST /recommendations
///
/// `owner` recommendations need an owner or staff caller.
#[tracing::instrument(skip(state, headers, req), fields(role = %req.role))]
pub async fn recommend<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    let caller = state.caller(&headers).await?;
    let role: RecommendRole = req.role.parse()?;

    let subject = match role {
        RecommendRole::Owner => {
            require_back_office(&caller)?;
            caller.user_id
        }
        RecommendRole::Client if caller.role.is_back_office() => {
            req.user_id.unwrap_or(caller.user_id)
        }
        RecommendRole::Client => caller.user_id,
    };

    let response = state.recommendations.recommend(subject, role).await?;
    Ok(Json(response))
}
