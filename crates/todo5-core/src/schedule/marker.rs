//! The token that links a created calendar event back to its task.

use std::collections::HashSet;

use super::CalendarEvent;

/// Embedded in a created event's description, immediately followed by the
/// originating task id.
pub const SCHEDULING_MARKER: &str = "todoist.id=";

/// Render the marker line for `task_id`.
pub fn embed_marker(task_id: &str) -> String {
    format!("{SCHEDULING_MARKER}{task_id}")
}

/// Recover the task id from an event description.
///
/// The id is everything after the first marker up to the end of that line,
/// or up to a second marker on the same line. Returns `None` when there is no
/// marker or nothing follows it.
pub fn extract_task_id(description: &str) -> Option<&str> {
    let (_, rest) = description.split_once(SCHEDULING_MARKER)?;
    let line_end = rest.find(|c: char| c == '\n' || c == '\r').unwrap_or(rest.len());
    let line = &rest[..line_end];
    let id = match line.find(SCHEDULING_MARKER) {
        Some(next) => &line[..next],
        None => line,
    };
    (!id.is_empty()).then_some(id)
}

/// Task ids already represented on the calendar.
pub fn find_scheduled_ids(events: &[CalendarEvent]) -> HashSet<String> {
    events
        .iter()
        .filter_map(CalendarEvent::scheduled_task_id)
        .map(str::to_owned)
        .collect()
}
