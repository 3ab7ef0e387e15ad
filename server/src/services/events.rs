use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{ClassifiedEvents, Event, EventInput, EventPatch, NewEvent};
use crate::services::reconciler::{ReconcileReport, Reconciler};
use crate::store::EventStore;
use crate::utils::error::AppError;

/// User-facing event operations.
///
/// Every mutation wakes the background reconciler once it has been written.
pub struct EventService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    gate: Arc<Mutex<()>>,
    reconciler: Arc<Reconciler>,
    wake: Arc<Notify>,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        let gate = Arc::new(Mutex::new(()));
        let reconciler = Arc::new(Reconciler::new(store.clone(), clock.clone(), gate.clone()));
        Self {
            store,
            clock,
            gate,
            reconciler,
            wake: Arc::new(Notify::new()),
        }
    }

    /// Start the periodic reconciler on the current runtime.
    pub fn spawn_reconciler(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.reconciler.clone().run(period, self.wake.clone(), cancel))
    }

    pub async fn reconcile(&self) -> Result<ReconcileReport, AppError> {
        Ok(self.reconciler.reconcile().await?)
    }

    /// Reconcile, then group the result for display.
    pub async fn overview(&self) -> Result<ClassifiedEvents, AppError> {
        let now = self.clock.now();
        let report = self.reconciler.reconcile_at(now).await?;
        Ok(ClassifiedEvents::classify(report.events, now))
    }

    pub async fn active(&self) -> Result<Event, AppError> {
        self.store
            .active_event()
            .await?
            .ok_or_else(|| AppError::NotFound("No event is currently active".to_string()))
    }

    /// Create an event. If it is already running it becomes the active event
    /// and every other event is switched off in the same store operation.
    pub async fn create(&self, input: EventInput) -> Result<Event, AppError> {
        let window = input.validate()?;
        let now = self.clock.now();
        let is_active = window.is_live_at(now);
        let new_event = NewEvent {
            name: input.name.trim().to_string(),
            start_time: window.start,
            end_time: window.end,
            is_active,
        };

        let event = {
            let _guard = self.gate.lock().await;
            if is_active {
                self.store.insert_exclusive(new_event).await?
            } else {
                self.store.insert_event(new_event).await?
            }
        };

        info!(event_id = %event.id, active = event.is_active, "Event created");
        self.wake.notify_one();
        Ok(event)
    }

    /// Replace name and window; the active flag is recomputed for the new window.
    pub async fn update(&self, id: Uuid, input: EventInput) -> Result<Event, AppError> {
        let window = input.validate()?;
        let now = self.clock.now();
        let is_active = window.is_live_at(now);
        let patch = EventPatch {
            name: Some(input.name.trim().to_string()),
            start_time: Some(window.start),
            end_time: Some(window.end),
            is_active: Some(is_active),
        };

        let event = {
            let _guard = self.gate.lock().await;
            if is_active {
                self.store.update_exclusive(id, patch).await?
            } else {
                self.store.update_event(id, patch).await?
            }
        };

        info!(event_id = %event.id, active = event.is_active, "Event updated");
        self.wake.notify_one();
        Ok(event)
    }

    /// Close the event at the current instant, whatever its configured end.
    pub async fn end_now(&self, id: Uuid) -> Result<Event, AppError> {
        let event = {
            let _guard = self.gate.lock().await;
            let now = self.clock.now();
            let current = self.store.get_event(id).await?;
            if now <= current.start_time {
                return Err(AppError::ValidationError(
                    "Event has not started yet; cancel it instead".to_string(),
                ));
            }
            let patch = EventPatch {
                end_time: Some(now),
                is_active: Some(false),
                ..EventPatch::default()
            };
            self.store.update_event(id, patch).await?
        };

        info!(event_id = %event.id, ended_at = %event.end_time, "Event ended");
        self.wake.notify_one();
        Ok(event)
    }

    /// Delete the event. Nothing else is activated in its place.
    pub async fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        {
            let _guard = self.gate.lock().await;
            self.store.delete_event(id).await?;
        }

        info!(event_id = %id, "Event cancelled");
        self.wake.notify_one();
        Ok(())
    }
}
