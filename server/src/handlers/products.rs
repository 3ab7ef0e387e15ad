use axum::extract::State;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::models::ProductInput;
use crate::state::AppState;
use crate::store::{ProductStore, TableStore};
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list_products(State(state): State<AppState>) -> Result<Response, AppError> {
    let products = ProductStore::new(&state.pool).list().await?;
    Ok(success(products, "Products retrieved").into_response())
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Response, AppError> {
    input.validate()?;
    let product = ProductStore::new(&state.pool).create(&input).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok(created(product, "Product created").into_response())
}

pub async fn update_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Response, AppError> {
    input.validate()?;
    let product = ProductStore::new(&state.pool).update(id, &input).await?;
    Ok(success(product, "Product updated").into_response())
}

pub async fn delete_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    ProductStore::new(&state.pool).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(empty_success("Product deleted").into_response())
}

pub async fn list_tables(State(state): State<AppState>) -> Result<Response, AppError> {
    let tables = TableStore::new(&state.pool).list().await?;
    Ok(success(tables, "Tables retrieved").into_response())
}
