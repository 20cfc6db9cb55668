//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use recommend::RecommendError;
use reports::ReportError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every variant renders as `{"error": message}`; a partially written order
/// also carries its `order_id`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// No `Authorization` header.
    MissingAuthorization,
    /// The bearer token is not recognized.
    Unauthorized,
    /// Authenticated, but the role may not do this.
    Forbidden,
    /// Resource not found.
    NotFound(String),
    Domain(DomainError),
    Report(ReportError),
    Recommend(RecommendError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::MissingAuthorization => {
                (StatusCode::UNAUTHORIZED, "Missing authorization".to_string())
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(DomainError::PartialOrder { order_id, source }) => {
                tracing::error!(%order_id, error = %source, "order partially written");
                let body = serde_json::json!({
                    "error": format!("Order {order_id} was only partially written"),
                    "order_id": order_id,
                });
                return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response();
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Report(err) => internal(err.to_string()),
            ApiError::Recommend(err) => recommend_error_to_response(err),
            ApiError::Internal(msg) => internal(msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn internal(msg: String) -> (StatusCode, String) {
    tracing::error!(error = %msg, "internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, msg)
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InvalidTransition { .. }
        | DomainError::Conflict { .. }
        | DomainError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Persistence(_) | DomainError::PartialOrder { .. } => {
            internal(err.to_string())
        }
    }
}

fn recommend_error_to_response(err: RecommendError) -> (StatusCode, String) {
    match &err {
        RecommendError::InvalidRole(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        RecommendError::ExternalService(_) => {
            tracing::error!(error = %err, "recommendation generator failed");
            (StatusCode::BAD_GATEWAY, err.to_string())
        }
        RecommendError::Store(_) => internal(err.to_string()),
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Domain(DomainError::Persistence(err))
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}

impl From<RecommendError> for ApiError {
    fn from(err: RecommendError) -> Self {
        ApiError::Recommend(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{OrderId, OrderStatus};

    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn domain_errors_map_to_status_codes() {
        assert_eq!(
            status_of(DomainError::Validation("Cart is empty".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                DomainError::InvalidTransition {
                    from: OrderStatus::Delivered,
                    to: OrderStatus::Pending,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(
                DomainError::PartialOrder {
                    order_id: OrderId::new(),
                    source: StoreError::Unavailable("lines".into()),
                }
                .into()
            ),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn recommend_errors_map_to_status_codes() {
        assert_eq!(
            status_of(RecommendError::InvalidRole("admin".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(RecommendError::ExternalService("timeout".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn auth_errors_map_to_status_codes() {
        assert_eq!(status_of(ApiError::MissingAuthorization), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::Forbidden), StatusCode::FORBIDDEN);
    }
}
