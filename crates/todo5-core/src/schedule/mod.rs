//! Schedule types: the tasks to place and the calendar events they go around.
//!
//! Also hosts the two pieces that tie the two worlds together: the
//! scheduling marker that links a calendar event back to its task, and the
//! event stub built for each placement.

mod marker;
mod stub;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::timeline::BusyInterval;

pub use marker::{embed_marker, extract_task_id, find_scheduled_ids, SCHEDULING_MARKER};
pub use stub::{build_event_stub, EventStub, EventTime, Visibility, ATTRIBUTION, SUMMARY_PREFIX};

/// A pending work item from the task tracker.
///
/// Only the fields the scheduler needs are kept; anything else in the
/// tracker's payload is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    match Id::deserialize(deserializer)? {
        Id::Text(s) if s.is_empty() => Err(serde::de::Error::custom("task id is empty")),
        Id::Text(s) => Ok(s),
        Id::Number(n) => Ok(n.to_string()),
    }
}

/// An existing calendar commitment, with the free text needed to spot
/// events this scheduler created on an earlier run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalendarEvent {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: None,
            summary: None,
            description: None,
            start,
            end,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn busy_interval(&self) -> BusyInterval {
        BusyInterval::new(self.start, self.end)
    }

    /// The task id this event was created for, if it carries the marker.
    pub fn scheduled_task_id(&self) -> Option<&str> {
        self.description.as_deref().and_then(extract_task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_deserialize_ignores_extra_fields() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": "2995104339",
            "content": "Buy Milk",
            "description": "",
            "priority": 4,
            "due": {"date": "2023-10-20", "string": "today"},
            "url": "https://todoist.com/showTask?id=2995104339"
        }))
        .unwrap();
        assert_eq!(task.id, "2995104339");
        assert_eq!(task.content, "Buy Milk");
        assert_eq!(task.description.as_deref(), Some(""));
    }

    #[test]
    fn test_task_numeric_id_becomes_string() {
        let task: Task = serde_json::from_value(serde_json::json!({"id": 42})).unwrap();
        assert_eq!(task.id, "42");
        assert_eq!(task.content, "");
        assert!(task.description.is_none());
    }

    #[test]
    fn test_task_large_or_float_id_becomes_string() {
        let task: Task = serde_json::from_value(serde_json::json!({"id": u64::MAX})).unwrap();
        assert_eq!(task.id, "18446744073709551615");
        let task: Task = serde_json::from_value(serde_json::json!({"id": 7.5})).unwrap();
        assert_eq!(task.id, "7.5");
    }

    #[test]
    fn test_task_without_id_is_rejected() {
        assert!(serde_json::from_value::<Task>(serde_json::json!({"content": "x"})).is_err());
        assert!(serde_json::from_value::<Task>(serde_json::json!({"id": ""})).is_err());
    }

    #[test]
    fn test_event_scheduled_task_id() {
        let start = Utc::now();
        let event = CalendarEvent::new(start, start + chrono::Duration::hours(1))
            .with_description(format!("notes\n{SCHEDULING_MARKER}777"));
        assert_eq!(event.scheduled_task_id(), Some("777"));

        let plain = CalendarEvent::new(start, start + chrono::Duration::hours(1));
        assert_eq!(plain.scheduled_task_id(), None);
    }
}
