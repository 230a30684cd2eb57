use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::IntegrationError;
use crate::schedule::{CalendarEvent, EventStub, Task};

/// Supplies the outstanding tasks for a run, in the order they should be
/// placed.
#[async_trait]
pub trait TaskSource: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, IntegrationError>;
}

/// Supplies existing calendar commitments in `[time_min, time_max)`.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, IntegrationError>;
}

/// Persists an event stub. Returns the id the calendar assigned.
#[async_trait]
pub trait CalendarSink: Send + Sync {
    async fn create_event(&self, stub: &EventStub) -> Result<String, IntegrationError>;
}
