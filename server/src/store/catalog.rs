use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{Product, ProductInput, Table};

const PRODUCT_COLUMNS: &str = "id, name, stock, price, discounted_price, created_at";

/// Operations on the `products` table.
pub struct ProductStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductStore<'a> {
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products sorted by name.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY name ASC", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    pub async fn create(&self, input: &ProductInput) -> StoreResult<Product> {
        let sql = format!(
            "INSERT INTO products (id, name, stock, price, discounted_price, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PRODUCT_COLUMNS
        );
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.name.trim())
            .bind(input.stock)
            .bind(input.price)
            .bind(input.discounted_price)
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await?;
        Ok(product)
    }

    pub async fn update(&self, id: Uuid, input: &ProductInput) -> StoreResult<Product> {
        let sql = format!(
            "UPDATE products SET name = $2, stock = $3, price = $4, discounted_price = $5 \
             WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(input.name.trim())
            .bind(input.stock)
            .bind(input.price)
            .bind(input.discounted_price)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("product {}", id)))
    }

    /// Products referenced by past orders cannot be removed.
    pub async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::Conflict(format!("product {} is referenced by orders", id))
                }
                other => StoreError::Database(other),
            })?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("product {}", id)));
        }
        Ok(())
    }
}

/// Read access to the venue's `tables`.
pub struct TableStore<'a> {
    pool: &'a PgPool,
}

impl<'a> TableStore<'a> {
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Table>> {
        let tables = sqlx::query_as::<_, Table>("SELECT id, number FROM tables ORDER BY number")
            .fetch_all(self.pool)
            .await?;
        Ok(tables)
    }
}
