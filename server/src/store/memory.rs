use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, StoreError, StoreResult};
use crate::models::{Event, EventPatch, NewEvent};

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    failing: HashSet<Uuid>,
}

impl Inner {
    fn check_writable(&self, id: Uuid) -> StoreResult<()> {
        if self.failing.contains(&id) {
            return Err(StoreError::Unavailable(format!("write to event {} failed", id)));
        }
        Ok(())
    }

    fn deactivate_others(&mut self, excluded: Option<Uuid>) -> u64 {
        let mut changed = 0;
        for event in self.events.values_mut() {
            if Some(event.id) != excluded && event.is_active {
                event.is_active = false;
                changed += 1;
            }
        }
        changed
    }

    fn patch(&mut self, id: Uuid, patch: &EventPatch) -> StoreResult<Event> {
        self.check_writable(id)?;
        let event = self
            .events
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("event {}", id)))?;
        patch.apply(event);
        Ok(event.clone())
    }
}

/// Event store kept in process memory.
///
/// Writes to ids registered with [`MemoryEventStore::fail_writes_for`]
/// return [`StoreError::Unavailable`], which lets tests exercise partial
/// failures.
#[derive(Default)]
pub struct MemoryEventStore {
    inner: RwLock<Inner>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_events(events: impl IntoIterator<Item = Event>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write().await;
            for event in events {
                inner.events.insert(event.id, event);
            }
        }
        store
    }

    pub async fn fail_writes_for(&self, id: Uuid) {
        self.inner.write().await.failing.insert(id);
    }

    pub async fn heal(&self, id: Uuid) {
        self.inner.write().await.failing.remove(&id);
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn list_events(&self) -> StoreResult<Vec<Event>> {
        let inner = self.inner.read().await;
        let mut events: Vec<Event> = inner.events.values().cloned().collect();
        events.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Event> {
        self.inner
            .read()
            .await
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    async fn update_event(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        self.inner.write().await.patch(id, &patch)
    }

    async fn update_many_except(
        &self,
        excluded: Option<Uuid>,
        is_active: bool,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        if !is_active {
            return Ok(inner.deactivate_others(excluded));
        }
        let mut changed = 0;
        for event in inner.events.values_mut() {
            if Some(event.id) != excluded && !event.is_active {
                event.is_active = true;
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn insert_event(&self, new_event: NewEvent) -> StoreResult<Event> {
        let event = Event {
            id: Uuid::new_v4(),
            name: new_event.name,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            is_active: new_event.is_active,
            created_at: Utc::now(),
        };
        self.inner
            .write()
            .await
            .events
            .insert(event.id, event.clone());
        Ok(event)
    }

    async fn delete_event(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check_writable(id)?;
        inner
            .events
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("event {}", id)))
    }

    async fn update_exclusive(&self, id: Uuid, patch: EventPatch) -> StoreResult<Event> {
        let mut inner = self.inner.write().await;
        inner.check_writable(id)?;
        if !inner.events.contains_key(&id) {
            return Err(StoreError::NotFound(format!("event {}", id)));
        }
        inner.deactivate_others(Some(id));
        inner.patch(id, &patch)
    }

    async fn insert_exclusive(&self, new_event: NewEvent) -> StoreResult<Event> {
        let mut inner = self.inner.write().await;
        inner.deactivate_others(None);
        let event = Event {
            id: Uuid::new_v4(),
            name: new_event.name,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            is_active: new_event.is_active,
            created_at: Utc::now(),
        };
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }
}
