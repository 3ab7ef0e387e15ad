//! Persistence for the backoffice.
//!
//! Events go through the [`EventStore`] trait so the reconciler can run
//! against PostgreSQL in production and an in-memory store in tests.
//! Products, tables and orders are only ever read from PostgreSQL.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{Event, EventPatch, NewEvent};

pub mod catalog;
pub mod memory;
pub mod orders;
pub mod postgres;

pub use catalog::{ProductStore, TableStore};
pub use memory::MemoryEventStore;
pub use orders::OrderStore;
pub use postgres::PgEventStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage operations the event service and the reconciler rely on.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events, latest start first.
    async fn list_events(&self) -> StoreResult<Vec<Event>>;

    async fn get_event(&self, id: Uuid) -> StoreResult<Event>;

    async fn update_event(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event>;

    /// Set the active flag on every event except `excluded` (or on all of
    /// them when `excluded` is `None`). Returns the number of rows changed.
    async fn update_many_except(&self, excluded: Option<Uuid>, is_active: bool)
        -> StoreResult<u64>;

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event>;

    async fn delete_event(&self, id: Uuid) -> StoreResult<()>;

    async fn active_event(&self) -> StoreResult<Option<Event>> {
        Ok(self
            .list_events()
            .await?
            .into_iter()
            .find(|event| event.is_active))
    }

    /// Deactivate every other event, then apply `patch` to `id`.
    ///
    /// The default runs two separate writes. Stores that can do both in one
    /// atomic step should override it.
    async fn update_exclusive(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        self.update_many_except(Some(id), false).await?;
        self.update_event(id, patch).await
    }

    /// Deactivate every existing event, then insert `new_event`.
    async fn insert_exclusive(&self, new_event: NewEvent) -> StoreResult<Event> {
        self.update_many_except(None, false).await?;
        self.insert_event(new_event).await
    }
}
