use crate::handlers::{events, ws};
use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    // Endpoints for the order-management service, not exposed to clients.
    let internal_routes = Router::new()
        .route("/events/order-created", post(events::order_created))
        .route("/events/order-status", post(events::order_status));

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health))
        .nest("/internal", internal_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "clients": state.registry.client_count(),
        "subscriptions": state.registry.subscription_count(),
    }))
}
