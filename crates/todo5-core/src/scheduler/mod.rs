//! Assignment of unscheduled tasks to usable free periods.
//!
//! The engine is pure: it reads calendar events and tasks, and produces an
//! ordered list of (period, task) pairs. Side effects belong to the caller,
//! either by walking the returned pairs or through
//! [`AssignmentEngine::act_on_schedulable_tasks`].
//!
//! Matching is greedy and order-based: the k-th usable period (in
//! chronological order) gets the k-th unscheduled task (in input order).
//! Task priority, duration, and deadlines are not considered beyond the order
//! the task source returned them in.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::Serialize;

use crate::schedule::{find_scheduled_ids, CalendarEvent, Task};
use crate::storage::Config;
use crate::timeline::{BusyInterval, FreePeriod, GapCalculator, UsabilityPolicy};

/// One task placed into one free period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment<'a> {
    pub period: FreePeriod,
    pub task: &'a Task,
}

/// Pairs tasks with free periods.
///
/// Weekday and hour-of-day checks are evaluated in `Tz`, which is the
/// machine's local zone unless [`with_timezone`](Self::with_timezone) says
/// otherwise.
#[derive(Debug, Clone)]
pub struct AssignmentEngine<Tz: TimeZone = Local> {
    gaps: GapCalculator,
    policy: UsabilityPolicy,
    tz: Tz,
}

impl AssignmentEngine<Local> {
    /// Create an engine with the default horizon and usability policy
    pub fn new() -> Self {
        Self {
            gaps: GapCalculator::new(),
            policy: UsabilityPolicy::default(),
            tz: Local,
        }
    }

    /// Build an engine from the scheduler and usability sections of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_horizon(Duration::hours(config.scheduler.gap_horizon_hours))
            .with_policy(config.usability.clone())
    }
}

impl Default for AssignmentEngine<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tz: TimeZone> AssignmentEngine<Tz> {
    pub fn with_horizon(mut self, horizon: Duration) -> Self {
        self.gaps = self.gaps.with_horizon(horizon);
        self
    }

    pub fn with_policy(mut self, policy: UsabilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Evaluate the usability policy in another timezone.
    pub fn with_timezone<T: TimeZone>(self, tz: T) -> AssignmentEngine<T> {
        AssignmentEngine {
            gaps: self.gaps,
            policy: self.policy,
            tz,
        }
    }

    pub fn policy(&self) -> &UsabilityPolicy {
        &self.policy
    }

    /// Free periods from `now` that pass the usability policy, in
    /// chronological order.
    pub fn usable_periods(&self, events: &[CalendarEvent], now: DateTime<Utc>) -> Vec<FreePeriod> {
        let busy: Vec<BusyInterval> = events.iter().map(CalendarEvent::busy_interval).collect();
        let free = self.gaps.find_free_periods(&busy, now);
        tracing::debug!(count = free.len(), "determined free periods");

        let usable: Vec<FreePeriod> = free
            .into_iter()
            .filter(|period| self.policy.is_usable_in(period, &self.tz))
            .collect();
        tracing::debug!(count = usable.len(), "found usable free periods");
        usable
    }

    /// Tasks with no marker-tagged event on the calendar, in input order.
    ///
    /// A task id repeated in the input is only kept the first time.
    pub fn unscheduled_tasks<'a>(&self, events: &[CalendarEvent], tasks: &'a [Task]) -> Vec<&'a Task> {
        let scheduled = find_scheduled_ids(events);
        tracing::debug!(ids = ?scheduled, "found already scheduled task ids");

        let mut seen = HashSet::new();
        let unscheduled: Vec<&Task> = tasks
            .iter()
            .filter(|task| !scheduled.contains(&task.id))
            .filter(|task| seen.insert(task.id.as_str()))
            .collect();
        tracing::debug!(count = unscheduled.len(), "found unscheduled tasks");
        unscheduled
    }

    /// Pair usable periods with unscheduled tasks.
    ///
    /// Each period and each task appears in at most one assignment; the
    /// result stops at whichever list runs out first.
    pub fn plan<'a>(
        &self,
        events: &[CalendarEvent],
        tasks: &'a [Task],
        now: DateTime<Utc>,
    ) -> Vec<Assignment<'a>> {
        let periods = self.usable_periods(events, now);
        let unscheduled = self.unscheduled_tasks(events, tasks);

        periods
            .into_iter()
            .zip(unscheduled)
            .map(|(period, task)| Assignment { period, task })
            .collect()
    }

    /// Run `on_match` once per assignment, in chronological period order.
    ///
    /// Returns the number of invocations.
    pub fn act_on_schedulable_tasks<F>(
        &self,
        events: &[CalendarEvent],
        tasks: &[Task],
        now: DateTime<Utc>,
        mut on_match: F,
    ) -> usize
    where
        F: FnMut(&FreePeriod, &Task),
    {
        let assignments = self.plan(events, tasks, now);
        for assignment in &assignments {
            on_match(&assignment.period, assignment.task);
        }
        assignments.len()
    }
}
