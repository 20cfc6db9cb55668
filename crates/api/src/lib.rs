//! HTTP API for the stockroom services.
//!
//! Provides REST endpoints for inventory, order placement and status,
//! stock decrements, reports and recommendations, with structured logging
//! (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use common::CallerIdentity;
use domain::{InventoryLedger, OrderQueries, OrderService, OrderWorkflow};
use metrics_exporter_prometheus::PrometheusHandle;
use recommend::{RecommendationGenerator, RecommendationService, StaticGenerator};
use reports::SalesPipeline;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::{IdentityProvider, StaticIdentityProvider};
use config::Config;
use error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub ledger: InventoryLedger<S>,
    pub orders: OrderService<S>,
    pub workflow: OrderWorkflow<S>,
    pub queries: OrderQueries<S>,
    pub sales: SalesPipeline<S>,
    pub recommendations: RecommendationService<S>,
    /// Token verification, kept apart from the store handle.
    pub identity: Arc<dyn IdentityProvider>,
}

impl<S: Store> AppState<S> {
    /// Authenticates the request's bearer token.
    pub async fn caller(&self, headers: &HeaderMap) -> Result<CallerIdentity, ApiError> {
        auth::authenticate(self.identity.as_ref(), headers).await
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/inventory",
            get(routes::inventory::list::<S>).post(routes::inventory::create::<S>),
        )
        .route(
            "/inventory/{id}",
            get(routes::inventory::get::<S>)
                .patch(routes::inventory::update::<S>)
                .delete(routes::inventory::delete::<S>),
        )
        .route(
            "/orders",
            get(routes::orders::list_all::<S>).post(routes::orders::place::<S>),
        )
        .route("/orders/mine", get(routes::orders::mine::<S>))
        .route("/orders/partial", get(routes::orders::partial::<S>))
        .route("/orders/{id}/status", post(routes::orders::transition::<S>))
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route("/stock/decrement", post(routes::stock::decrement::<S>))
        .route("/reports/sales", get(routes::reporting::sales::<S>))
        .route(
            "/reports/transactions",
            get(routes::reporting::transactions::<S>),
        )
        .route("/reports/dashboard", get(routes::reporting::dashboard::<S>))
        .route(
            "/recommendations",
            post(routes::recommendations::recommend::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires services over `store` with explicit identity and generator seams.
pub fn create_state<S: Store>(
    store: S,
    config: &Config,
    identity: Arc<dyn IdentityProvider>,
    generator: Arc<dyn RecommendationGenerator>,
) -> Arc<AppState<S>> {
    let retry = config.retry_policy();

    Arc::new(AppState {
        ledger: InventoryLedger::new(store.clone()).with_retry(retry),
        orders: OrderService::new(store.clone())
            .with_stock_policy(config.stock_policy)
            .with_retry(retry),
        workflow: OrderWorkflow::new(store.clone()),
        queries: OrderQueries::new(store.clone()),
        sales: SalesPipeline::new(store.clone()),
        recommendations: RecommendationService::new(store.clone(), generator)
            .with_limits(config.context_limits()),
        identity,
        store,
    })
}

/// Creates the default application state: static tokens from the config and
/// a generator that always answers with an empty list.
pub fn create_default_state<S: Store>(store: S, config: &Config) -> Arc<AppState<S>> {
    create_state(
        store,
        config,
        Arc::new(StaticIdentityProvider::new(config.auth_tokens.clone())),
        Arc::new(StaticGenerator::empty()),
    )
}
