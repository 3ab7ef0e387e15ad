use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{Order, OrderItem, OrderStatus, OrderWithItems};

const ORDER_SELECT: &str = "SELECT o.id, o.table_id, t.number AS table_number, o.event_id, \
     o.status, o.created_at, o.updated_at \
     FROM orders o JOIN tables t ON t.id = o.table_id";

/// Which orders of an event to load.
#[derive(Debug, Clone)]
pub struct OrderFilter {
    pub statuses: Vec<OrderStatus>,
    pub table_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            statuses: vec![status],
            table_id: None,
        }
    }

    /// Accepted and rejected orders.
    pub fn decided(table_id: Option<Uuid>) -> Self {
        Self {
            statuses: vec![OrderStatus::Accepted, OrderStatus::Rejected],
            table_id,
        }
    }
}

/// Operations on `orders` and `order_items`.
pub struct OrderStore<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderStore<'a> {
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders of `event_id` matching `filter`, newest first, with line items.
    pub async fn list_for_event(
        &self,
        event_id: Uuid,
        filter: &OrderFilter,
    ) -> StoreResult<Vec<OrderWithItems>> {
        let statuses: Vec<&'static str> =
            filter.statuses.iter().map(OrderStatus::as_str).collect();
        let sql = format!(
            "{} WHERE o.event_id = $1 AND o.status = ANY($2) \
             AND ($3::uuid IS NULL OR o.table_id = $3) \
             ORDER BY o.created_at DESC",
            ORDER_SELECT
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(event_id)
            .bind(statuses)
            .bind(filter.table_id)
            .fetch_all(self.pool)
            .await?;

        let items = self.items_for(&orders).await?;
        Ok(OrderWithItems::assemble(orders, items))
    }

    async fn items_for(&self, orders: &[Order]) -> StoreResult<Vec<OrderItem>> {
        if orders.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT i.id, i.order_id, i.product_id, p.name AS product_name, \
                    i.quantity, i.discounted_price_at_order \
             FROM order_items i JOIN products p ON p.id = i.product_id \
             WHERE i.order_id = ANY($1) \
             ORDER BY p.name",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }

    pub async fn get(&self, id: Uuid) -> StoreResult<Order> {
        let sql = format!("{} WHERE o.id = $1", ORDER_SELECT);
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("order {}", id)))
    }

    /// Move a still-pending order to `status`. Fails with
    /// [`StoreError::Conflict`] when another request decided it first.
    pub async fn set_status_if_pending(
        &self,
        id: Uuid,
        status: OrderStatus,
        decided_at: DateTime<Utc>,
    ) -> StoreResult<Order> {
        let result = sqlx::query(
            "UPDATE orders SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(decided_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict(format!(
                "order {} is no longer pending",
                id
            )));
        }
        self.get(id).await
    }
}
