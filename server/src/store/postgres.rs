use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EventStore, StoreError, StoreResult};
use crate::models::{Event, EventPatch, NewEvent};

const EVENT_COLUMNS: &str = "id, name, start_time, end_time, is_active, created_at";

/// [`EventStore`] backed by the `events` table.
///
/// The exclusive variants run the bulk deactivation and the targeted write
/// inside one transaction, so no reader ever sees two active events.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn deactivate_others(
        tx: &mut Transaction<'_, Postgres>,
        excluded: Option<Uuid>,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE events SET is_active = FALSE \
             WHERE is_active AND ($1::uuid IS NULL OR id <> $1)",
        )
        .bind(excluded)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn patch_in(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        patch: &EventPatch,
    ) -> StoreResult<Event> {
        let sql = format!(
            "UPDATE events SET \
                name = COALESCE($2, name), \
                start_time = COALESCE($3, start_time), \
                end_time = COALESCE($4, end_time), \
                is_active = COALESCE($5, is_active) \
             WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        );
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(patch.name.as_deref())
            .bind(patch.start_time)
            .bind(patch.end_time)
            .bind(patch.is_active)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    async fn insert_in(
        tx: &mut Transaction<'_, Postgres>,
        new_event: &NewEvent,
    ) -> StoreResult<Event> {
        let sql = format!(
            "INSERT INTO events (id, name, start_time, end_time, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new_event.name)
            .bind(new_event.start_time)
            .bind(new_event.end_time)
            .bind(new_event.is_active)
            .bind(Utc::now())
            .fetch_one(&mut **tx)
            .await?;
        Ok(event)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let sql = format!(
            "SELECT {} FROM events ORDER BY start_time DESC, id",
            EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Event> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    async fn update_event(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await?;
        let event = Self::patch_in(&mut tx, id, &patch).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn update_many_except(
        &self,
        excluded: Option<Uuid>,
        is_active: bool,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE events SET is_active = $2 \
             WHERE is_active <> $2 AND ($1::uuid IS NULL OR id <> $1)",
        )
        .bind(excluded)
        .bind(is_active)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await?;
        let event = Self::insert_in(&mut tx, &new_event).await?;
        tx.commit().await?;
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        Ok(())
    }

    async fn active_event(&self) -> StoreResult<Option<Event>> {
        let sql = format!(
            "SELECT {} FROM events WHERE is_active ORDER BY start_time DESC LIMIT 1",
            EVENT_COLUMNS
        );
        let event = sqlx::query_as::<_, Event>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn update_exclusive(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await?;
        let deactivated = Self::deactivate_others(&mut tx, Some(id)).await?;
        let event = Self::patch_in(&mut tx, id, &patch).await?;
        tx.commit().await?;
        tracing::debug!(event_id = %id, deactivated, "Exclusive event update committed");
        Ok(event)
    }

    async fn insert_exclusive(&self, new_event: NewEvent) -> StoreResult<Event> {
        let mut tx = self.pool.begin().await?;
        let deactivated = Self::deactivate_others(&mut tx, None).await?;
        let event = Self::insert_in(&mut tx, &new_event).await?;
        tx.commit().await?;
        tracing::debug!(event_id = %event.id, deactivated, "Exclusive event insert committed");
        Ok(event)
    }
}
