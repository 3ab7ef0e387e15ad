use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
    pub price: Decimal,
    pub discounted_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub discounted_price: Decimal,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Product name must not be empty".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(AppError::ValidationError(
                "Stock must not be negative".to_string(),
            ));
        }
        if self.price.is_sign_negative() || self.discounted_price.is_sign_negative() {
            return Err(AppError::ValidationError(
                "Prices must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}
