//! Event activation reconciliation.
//!
//! A pass lists every event, works out which single event should carry the
//! active flag at the given instant, and writes only the flags that differ.
//! Passes are idempotent: running one twice at the same instant changes
//! nothing the second time.
//!
//! When several windows contain the instant, the event with the latest start
//! wins, and the lowest id breaks a tie on start time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{Event, EventPatch};
use crate::store::{EventStore, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activate(Uuid),
    Deactivate(Uuid),
}

/// The event that should be active at `now`, if any.
pub fn select_active(now: DateTime<Utc>, events: &[Event]) -> Option<&Event> {
    events
        .iter()
        .filter(|event| event.window().contains(now))
        .max_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| b.id.cmp(&a.id))
        })
}

/// Writes needed to bring `events` in line with `now`.
///
/// Deactivations come first so each one stands on its own; the activation,
/// if any, is last.
pub fn plan(now: DateTime<Utc>, events: &[Event]) -> Vec<Transition> {
    let winner = select_active(now, events);
    let winner_id = winner.map(|event| event.id);

    let mut transitions: Vec<Transition> = events
        .iter()
        .filter(|event| event.is_active && Some(event.id) != winner_id)
        .map(|event| Transition::Deactivate(event.id))
        .collect();

    if let Some(event) = winner.filter(|event| !event.is_active) {
        transitions.push(Transition::Activate(event.id));
    }

    transitions
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    pub events: Vec<Event>,
    pub activated: Option<Uuid>,
    pub deactivated: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl ReconcileReport {
    pub fn changed(&self) -> bool {
        self.activated.is_some() || !self.deactivated.is_empty()
    }
}

pub struct Reconciler {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    gate: Arc<Mutex<()>>,
}

impl Reconciler {
    /// `gate` is shared with whatever else writes events in this process so
    /// passes never interleave with a create or an edit.
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>, gate: Arc<Mutex<()>>) -> Self {
        Self { store, clock, gate }
    }

    pub async fn reconcile(&self) -> StoreResult<ReconcileReport> {
        self.reconcile_at(self.clock.now()).await
    }

    /// Run a pass as of `now`.
    ///
    /// Only a failure to list events is returned. A failed write is logged
    /// and recorded in [`ReconcileReport::failed`]; the other transitions
    /// still run and the next pass retries from scratch. A successful
    /// activation clears every other flag, so deactivations that failed
    /// earlier in the same pass are reported as deactivated.
    pub async fn reconcile_at(&self, now: DateTime<Utc>) -> StoreResult<ReconcileReport> {
        let _guard = self.gate.lock().await;
        let events = self.store.list_events().await?;
        let transitions = plan(now, &events);

        let mut report = ReconcileReport {
            events,
            ..ReconcileReport::default()
        };

        for transition in transitions {
            match transition {
                Transition::Deactivate(id) => {
                    match self.store.update_event(id, EventPatch::active(false)).await {
                        Ok(updated) => {
                            replace(&mut report.events, updated);
                            report.deactivated.push(id);
                        }
                        Err(e) => {
                            warn!(event_id = %id, error = %e, "Failed to deactivate event");
                            report.failed.push(id);
                        }
                    }
                }
                Transition::Activate(id) => {
                    match self
                        .store
                        .update_exclusive(id, EventPatch::active(true))
                        .await
                    {
                        Ok(updated) => {
                            for event in report.events.iter_mut().filter(|e| e.id != id) {
                                event.is_active = false;
                            }
                            replace(&mut report.events, updated);
                            report.activated = Some(id);
                            report.deactivated.append(&mut report.failed);
                        }
                        Err(e) => {
                            warn!(event_id = %id, error = %e, "Failed to activate event");
                            report.failed.push(id);
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    /// Run passes every `period` and whenever `wake` is notified, until
    /// `cancel` fires. The first pass runs immediately.
    pub async fn run(self: Arc<Self>, period: Duration, wake: Arc<Notify>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "Event reconciler started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = wake.notified() => debug!("Reconciliation requested"),
            }

            match self.reconcile().await {
                Ok(report) if report.changed() || !report.failed.is_empty() => info!(
                    activated = ?report.activated,
                    deactivated = report.deactivated.len(),
                    failed = report.failed.len(),
                    "Reconciliation pass applied"
                ),
                Ok(_) => debug!("Reconciliation pass found nothing to change"),
                Err(e) => warn!(error = %e, "Reconciliation pass could not list events"),
            }
        }

        info!("Event reconciler stopped");
    }
}

fn replace(events: &mut [Event], updated: Event) {
    if let Some(slot) = events.iter_mut().find(|e| e.id == updated.id) {
        *slot = updated;
    }
}
