use axum::extract::State;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::models::OrderStatus;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::ApiPath;
use crate::utils::response::success;

pub async fn pending_orders(State(state): State<AppState>) -> Result<Response, AppError> {
    let pending = state.orders.pending().await?;
    let message = if pending.event.is_some() {
        "Pending orders retrieved"
    } else {
        "No active event"
    };
    Ok(success(pending, message).into_response())
}

pub async fn accept_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let order = state.orders.decide(id, OrderStatus::Accepted).await?;
    Ok(success(order, "Order accepted").into_response())
}

pub async fn reject_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let order = state.orders.decide(id, OrderStatus::Rejected).await?;
    Ok(success(order, "Order rejected").into_response())
}
