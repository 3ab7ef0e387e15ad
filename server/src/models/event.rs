use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn window(&self) -> EventWindow {
        EventWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Where this event sits relative to `now`, taking the stored flag into account.
    pub fn phase(&self, now: DateTime<Utc>) -> Option<EventPhase> {
        let window = self.window();
        if window.starts_after(now) {
            Some(EventPhase::Future)
        } else if window.contains(now) && self.is_active {
            Some(EventPhase::Current)
        } else if window.ended_before(now) && !self.is_active {
            Some(EventPhase::Past)
        } else {
            // Flag disagrees with the clock until the next reconciliation pass.
            None
        }
    }
}

/// Closed `[start, end]` interval an event runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::ValidationError(
                "End time must be after start time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }

    /// Activation test used when an event is created or edited: the event
    /// must already have started and still have time left to run.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && self.end > now
    }

    pub fn starts_after(&self, now: DateTime<Utc>) -> bool {
        self.start > now
    }

    pub fn ended_before(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPhase {
    Current,
    Future,
    Past,
}

/// Request body for creating or editing an event.
#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl EventInput {
    pub fn validate(&self) -> Result<EventWindow, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Event name must not be empty".to_string(),
            ));
        }
        EventWindow::new(self.start_time, self.end_time)
    }
}

/// Fields for a new event row.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_active: bool,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

impl EventPatch {
    pub fn active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name = name.clone();
        }
        if let Some(start_time) = self.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            event.end_time = end_time;
        }
        if let Some(is_active) = self.is_active {
            event.is_active = is_active;
        }
    }
}

/// Events grouped for display. Stale events (flag out of sync with the
/// clock) are only present in `events`.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedEvents {
    pub current: Vec<Event>,
    pub future: Vec<Event>,
    pub past: Vec<Event>,
    pub events: Vec<Event>,
}

impl ClassifiedEvents {
    pub fn classify(events: Vec<Event>, now: DateTime<Utc>) -> Self {
        let mut current = Vec::new();
        let mut future = Vec::new();
        let mut past = Vec::new();

        for event in &events {
            match event.phase(now) {
                Some(EventPhase::Current) => current.push(event.clone()),
                Some(EventPhase::Future) => future.push(event.clone()),
                Some(EventPhase::Past) => past.push(event.clone()),
                None => {}
            }
        }

        Self {
            current,
            future,
            past,
            events,
        }
    }
}
