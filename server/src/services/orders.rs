use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{Event, Order, OrderStatus, OrderWithItems};
use crate::services::reports::{event_finances, EventFinances};
use crate::store::orders::OrderFilter;
use crate::store::{EventStore, OrderStore};
use crate::utils::error::AppError;

/// Pending requests for the active event. `event` is `None` when no event
/// is running, in which case `orders` is empty.
#[derive(Debug, Serialize)]
pub struct PendingOrders {
    pub event: Option<Event>,
    pub orders: Vec<OrderWithItems>,
}

pub struct OrderService {
    pool: PgPool,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(pool: PgPool, events: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            events,
            clock,
        }
    }

    pub async fn pending(&self) -> Result<PendingOrders, AppError> {
        let Some(event) = self.events.active_event().await? else {
            return Ok(PendingOrders {
                event: None,
                orders: Vec::new(),
            });
        };

        let orders = OrderStore::new(&self.pool)
            .list_for_event(event.id, &OrderFilter::with_status(OrderStatus::Pending))
            .await?;
        Ok(PendingOrders {
            event: Some(event),
            orders,
        })
    }

    /// Accept or reject a pending order.
    pub async fn decide(&self, id: Uuid, next: OrderStatus) -> Result<Order, AppError> {
        let store = OrderStore::new(&self.pool);
        let current = store.get(id).await?;
        let next = current.status.decide(next)?;

        let order = store
            .set_status_if_pending(id, next, self.clock.now())
            .await?;
        info!(order_id = %id, status = %order.status, "Order decided");
        Ok(order)
    }

    /// Accepted and rejected orders of an event, newest first.
    pub async fn history(
        &self,
        event_id: Uuid,
        table_id: Option<Uuid>,
    ) -> Result<Vec<OrderWithItems>, AppError> {
        self.events.get_event(event_id).await?;
        let orders = OrderStore::new(&self.pool)
            .list_for_event(event_id, &OrderFilter::decided(table_id))
            .await?;
        Ok(orders)
    }

    pub async fn finances(&self, event_id: Uuid) -> Result<EventFinances, AppError> {
        self.events.get_event(event_id).await?;
        let orders = OrderStore::new(&self.pool)
            .list_for_event(event_id, &OrderFilter::with_status(OrderStatus::Accepted))
            .await?;
        Ok(event_finances(event_id, &orders))
    }
}
