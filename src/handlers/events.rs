//! Internal endpoints called by the order-management service.
//!
//! Both are fire-and-forget: the event is accepted and fanned out, and a
//! recipient's delivery failure never surfaces here.

use crate::protocol::{OrderCreated, OrderStatusChanged, ServerMessage};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};

pub async fn order_created(
    State(state): State<AppState>,
    Json(order): Json<OrderCreated>,
) -> StatusCode {
    tracing::debug!("Order {} created, notifying admins", order.id);
    state
        .registry
        .broadcast_new_order(&ServerMessage::NewOrder { order });
    StatusCode::ACCEPTED
}

pub async fn order_status(
    State(state): State<AppState>,
    Json(order): Json<OrderStatusChanged>,
) -> StatusCode {
    tracing::debug!("Order {} moved to {}, fanning out", order.id, order.status);
    let order_id = order.id;
    state
        .registry
        .broadcast_order_update(order_id, &ServerMessage::OrderStatusUpdated { order });
    StatusCode::ACCEPTED
}
