//! Order placement, listings and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use common::{ItemId, OrderId, OrderStatus};
use domain::{Cart, OrderView, PlaceOrder, PlacedOrder, TransitionOrder};
use serde::Deserialize;
use store::{OrderRecord, OrderStore, Store};

use crate::AppState;
use crate::auth::{require_back_office, require_known_role};
use crate::error::ApiError;

use super::parse_id;

// -- Request types --

#[derive(Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderLineRequest>,
    pub shipping_address: String,
}

#[derive(Deserialize)]
pub struct OrderLineRequest {
    pub item_id: ItemId,
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}

// -- Handlers --

/// POST /orders: check out a cart for the calling client.
///
/// Prices are taken from the catalog at the moment of the call, never from
/// the request. A line may not ask for more than the item's current stock.
#[tracing::instrument(skip(state, headers, req))]
pub async fn place<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrder>), ApiError> {
    let caller = state.caller(&headers).await?;
    require_known_role(&caller)?;

    let mut cart = Cart::new();
    for line in &req.items {
        if line.quantity == 0 {
            return Err(ApiError::BadRequest(format!(
                "Quantity for item {} must be at least 1",
                line.item_id
            )));
        }
        let item = state.ledger.get(line.item_id).await?;
        cart.add(item, line.quantity);
    }
    // Lines for the same item are merged by the cart before the check.
    if let Some(line) = cart.lines().iter().find(|l| l.quantity > l.item.quantity) {
        return Err(ApiError::BadRequest(format!(
            "Only {} of {} in stock",
            line.item.quantity, line.item.name
        )));
    }
    cart.set_shipping_address(req.shipping_address);

    let placed = state
        .orders
        .place_order(PlaceOrder::new(caller.user_id, cart))
        .await?;

    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /orders/mine: the caller's orders, newest first.
#[tracing::instrument(skip(state, headers))]
pub async fn mine<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = state.caller(&headers).await?;
    Ok(Json(state.queries.orders_for_client(caller.user_id).await?))
}

/// GET /orders: every order with client details.
#[tracing::instrument(skip(state, headers))]
pub async fn list_all<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;
    Ok(Json(state.queries.all_orders().await?))
}

/// GET /orders/partial: headers written without lines, for reconciliation.
#[tracing::instrument(skip(state, headers))]
pub async fn partial<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
) -> Result<Json<Vec<OrderRecord>>, ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;
    Ok(Json(state.orders.partial_orders().await?))
}

/// POST /orders/{id}/status
#[tracing::instrument(skip(state, headers, req))]
pub async fn transition<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<OrderRecord>, ApiError> {
    let caller = state.caller(&headers).await?;
    require_back_office(&caller)?;

    let order_id: OrderId = parse_id(&id)?;
    let order = state
        .workflow
        .transition(TransitionOrder::new(order_id, req.status))
        .await?;
    Ok(Json(order))
}

/// POST /orders/{id}/cancel: clients may cancel their own orders.
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<OrderRecord>, ApiError> {
    let caller = state.caller(&headers).await?;
    let order_id: OrderId = parse_id(&id)?;

    if !caller.role.is_back_office() {
        let owned = state
            .store
            .get_order(order_id)
            .await?
            .is_some_and(|o| o.client_id == caller.user_id);
        if !owned {
            return Err(ApiError::NotFound(format!("Order not found: {order_id}")));
        }
    }

    let order = state
        .workflow
        .transition(TransitionOrder::cancel(order_id))
        .await?;
    Ok(Json(order))
}
