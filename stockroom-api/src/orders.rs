use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stockroom_order::Order;

use crate::auth::ORDERS_READ;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub quantity: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/orders", get(list_orders).post(create_order))
}

async fn create_order(
    State(state): State<AppState>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), AppError> {
    let Json(req) = body?;

    let order = state
        .orders
        .create_order(&req.product_id, req.quantity)
        .await
        .inspect_err(|e| tracing::warn!(product_id = %req.product_id, error = %e, "order rejected"))?;

    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders.list_orders().await?;
    let token = state.tokens.issue(ORDERS_READ)?;

    Ok(([(header::AUTHORIZATION, format!("Bearer {token}"))], Json(orders)))
}
