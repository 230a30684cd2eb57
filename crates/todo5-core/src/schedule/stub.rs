//! Event stubs: a task placed into a time slot, ready to be written to
//! the calendar.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::marker::embed_marker;
use super::Task;

/// Prepended to the task content in the event title.
pub const SUMMARY_PREFIX: &str = "✅ ";

/// Separates the task's own description from the marker line.
pub const ATTRIBUTION: &str = "\n\n\nCreated by todo5-scheduler\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
}

/// Calendar API time object (`{"dateTime": "..."}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: DateTime<Utc>,
}

/// The outbound event for one (task, slot) placement.
///
/// Serializes to the body of a Google Calendar `events.insert` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStub {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
    pub visibility: Visibility,
}

impl EventStub {
    pub fn duration_minutes(&self) -> i64 {
        (self.end.date_time - self.start.date_time).num_minutes()
    }
}

/// Build the event for `task` starting at `start` and lasting `duration_minutes`.
pub fn build_event_stub(start: DateTime<Utc>, duration_minutes: i64, task: &Task) -> EventStub {
    let end = start + Duration::minutes(duration_minutes);
    let description = format!(
        "{}{ATTRIBUTION}{}",
        task.description.as_deref().unwrap_or_default(),
        embed_marker(&task.id)
    );

    EventStub {
        summary: format!("{SUMMARY_PREFIX}{}", task.content),
        description,
        start: EventTime { date_time: start },
        end: EventTime { date_time: end },
        visibility: Visibility::Private,
    }
}
