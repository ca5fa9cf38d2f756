use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::dispatch::Dispatcher;
use crate::error::DispatchError;
use crate::models::Order;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/order-paid", post(handle_order_paid))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// POST /webhooks/order-paid
/// Turn a paid order into a carrier manifest
pub async fn handle_order_paid(
    State(state): State<AppState>,
    Json(order): Json<Order>,
) -> Result<&'static str, DispatchError> {
    tracing::info!(
        order_id = order.id,
        order_number = order.order_number,
        "Received order paid webhook"
    );

    state.dispatcher.run(&order).await?;

    Ok("OK")
}

async fn health() -> &'static str {
    "OK"
}
