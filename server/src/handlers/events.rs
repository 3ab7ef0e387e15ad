use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::EventInput;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath, ApiQuery};
use crate::utils::response::{created, empty_success, success};

pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let overview = state.events.overview().await?;
    Ok(success(overview, "Events retrieved").into_response())
}

pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Response, AppError> {
    let event = state.events.create(input).await?;
    Ok(created(event, "Event created").into_response())
}

pub async fn active_event(State(state): State<AppState>) -> Result<Response, AppError> {
    let event = state.events.active().await?;
    Ok(success(event, "Active event retrieved").into_response())
}

pub async fn reconcile_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let report = state.events.reconcile().await?;
    Ok(success(report, "Events reconciled").into_response())
}

pub async fn update_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<EventInput>,
) -> Result<Response, AppError> {
    let event = state.events.update(id, input).await?;
    Ok(success(event, "Event updated").into_response())
}

pub async fn end_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let event = state.events.end_now(id).await?;
    Ok(success(event, "Event ended").into_response())
}

pub async fn cancel_event(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    state.events.cancel(id).await?;
    Ok(empty_success("Event cancelled").into_response())
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub table_id: Option<Uuid>,
}

pub async fn event_history(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> Result<Response, AppError> {
    let orders = state.orders.history(id, query.table_id).await?;
    Ok(success(orders, "Order history retrieved").into_response())
}

pub async fn event_finances(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let finances = state.orders.finances(id).await?;
    Ok(success(finances, "Finances retrieved").into_response())
}
