use std::sync::Arc;

use sqlx::PgPool;

use crate::clock::Clock;
use crate::services::{EventService, OrderService};
use crate::store::EventStore;

#[derive(Clone)]
pub struct AppState {
    pub events: Arc<EventService>,
    pub orders: Arc<OrderService>,
    pub pool: PgPool,
}

impl AppState {
    pub fn new(pool: PgPool, event_store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        let events = Arc::new(EventService::new(event_store.clone(), clock.clone()));
        let orders = Arc::new(OrderService::new(pool.clone(), event_store, clock));
        Self {
            events,
            orders,
            pool,
        }
    }
}
