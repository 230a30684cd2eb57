//! One scheduling cycle, and the periodic loop that repeats it.
//!
//! A cycle fetches tasks and events, plans assignments with
//! [`AssignmentEngine`], and writes one event per assignment. Fetch
//! failures end the cycle quietly with an empty report; write failures are
//! recorded per assignment and never stop the remaining writes.

use std::future::Future;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use serde::Serialize;

use crate::integrations::{
    CalendarSink, CalendarSource, GoogleCalendarClient, TaskSource, TodoistClient,
};
use crate::schedule::build_event_stub;
use crate::scheduler::AssignmentEngine;
use crate::storage::Config;
use crate::timeline::FreePeriod;

/// What happened to one planned placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created { event_id: String },
    Failed { error: String },
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub task_id: String,
    pub task_content: String,
    pub period: FreePeriod,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    pub outcome: Outcome,
}

/// Summary of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub tasks_fetched: usize,
    pub events_fetched: usize,
    pub placements: Vec<Placement>,
    /// Why the cycle stopped before planning, if it did.
    pub skipped: Option<String>,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            tasks_fetched: 0,
            events_fetched: 0,
            placements: Vec::new(),
            skipped: None,
        }
    }

    pub fn created(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Created { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.placements
            .iter()
            .filter(|p| matches!(p.outcome, Outcome::Failed { .. }))
            .count()
    }
}

/// Drives a cycle against any task source, calendar source, and sink.
pub struct Runner<Tz: TimeZone = Local> {
    engine: AssignmentEngine<Tz>,
    event_duration_minutes: i64,
    fetch_window: Duration,
    dry_run: bool,
}

impl Runner<Local> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(AssignmentEngine::from_config(config))
            .with_event_duration(config.scheduler.event_duration_minutes)
            .with_fetch_window(Duration::hours(config.scheduler.fetch_window_hours))
    }
}

impl<Tz: TimeZone> Runner<Tz> {
    pub fn new(engine: AssignmentEngine<Tz>) -> Self {
        Self {
            engine,
            event_duration_minutes: 30,
            fetch_window: Duration::hours(48),
            dry_run: false,
        }
    }

    pub fn with_event_duration(mut self, minutes: i64) -> Self {
        self.event_duration_minutes = minutes;
        self
    }

    pub fn with_fetch_window(mut self, window: Duration) -> Self {
        self.fetch_window = window;
        self
    }

    /// Plan but do not write.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run_once(
        &self,
        tasks: &dyn TaskSource,
        calendar: &dyn CalendarSource,
        sink: &dyn CalendarSink,
        now: DateTime<Utc>,
    ) -> RunReport {
        let mut report = RunReport::new(now);

        let tasks = match tasks.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch tasks; treating as none");
                Vec::new()
            }
        };
        report.tasks_fetched = tasks.len();
        if tasks.is_empty() {
            tracing::info!("no tasks to schedule");
            report.skipped = Some("no tasks".into());
            return report;
        }

        let events = match calendar.fetch_events(now, now + self.fetch_window).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "could not fetch calendar events; skipping run");
                report.skipped = Some(format!("calendar unavailable: {e}"));
                return report;
            }
        };
        report.events_fetched = events.len();

        let assignments = self.engine.plan(&events, &tasks, now);
        for assignment in assignments {
            let stub = build_event_stub(
                assignment.period.start,
                self.event_duration_minutes,
                assignment.task,
            );

            let outcome = if self.dry_run {
                Outcome::DryRun
            } else {
                match sink.create_event(&stub).await {
                    Ok(event_id) => {
                        tracing::info!(
                            task_id = %assignment.task.id,
                            start = %stub.start.date_time,
                            event_id = %event_id,
                            "created event"
                        );
                        Outcome::Created { event_id }
                    }
                    Err(e) => {
                        tracing::error!(
                            task_id = %assignment.task.id,
                            start = %stub.start.date_time,
                            error = %e,
                            "failed to create event"
                        );
                        Outcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };

            report.placements.push(Placement {
                task_id: assignment.task.id.clone(),
                task_content: assignment.task.content.clone(),
                period: assignment.period,
                event_start: stub.start.date_time,
                event_end: stub.end.date_time,
                outcome,
            });
        }

        tracing::info!(
            tasks = report.tasks_fetched,
            events = report.events_fetched,
            planned = report.placements.len(),
            created = report.created(),
            failed = report.failed(),
            "scheduling run finished"
        );
        report
    }
}

/// Run one cycle against Todoist and Google Calendar using `config` and the
/// stored credentials.
pub async fn run_cycle(config: &Config, dry_run: bool) -> RunReport {
    let now = Utc::now();

    let todoist = match TodoistClient::from_stored_credentials(&config.todoist) {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Todoist is not configured");
            let mut report = RunReport::new(now);
            report.skipped = Some(e.to_string());
            return report;
        }
    };
    let google = match GoogleCalendarClient::connect(&config.google).await {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Google Calendar is not available");
            let mut report = RunReport::new(now);
            report.skipped = Some(e.to_string());
            return report;
        }
    };

    Runner::from_config(config)
        .dry_run(dry_run)
        .run_once(&todoist, &google, &google, now)
        .await
}

/// Invoke `cycle` now and then every `interval` until Ctrl-C.
pub async fn run_periodically<F, Fut>(interval: std::time::Duration, cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    run_until(interval, cycle, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "could not listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    })
    .await;
}

/// Invoke `cycle` now and then every `interval` until `shutdown` completes.
///
/// Cycles never overlap: a slow cycle delays the next tick instead of
/// running concurrently with it. A shutdown requested during a cycle lets
/// that cycle finish and then stops.
pub async fn run_until<F, Fut, S>(interval: std::time::Duration, mut cycle: F, shutdown: S)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        let run = cycle();
        tokio::pin!(run);
        tokio::select! {
            _ = &mut run => {}
            _ = &mut shutdown => {
                tracing::info!("stopping after the current run");
                run.await;
                break;
            }
        }
    }
    tracing::info!("stopping scheduler");
}
