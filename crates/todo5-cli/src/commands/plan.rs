//! Offline planning against exported JSON.
//!
//! Events use the Google Calendar event shape and tasks the Todoist task
//! shape. Either file may hold a bare array or an object with `items`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use todo5_core::integrations::{parse_events, parse_tasks};
use todo5_core::{build_event_stub, AssignmentEngine, Config, EventStub, FreePeriod};

#[derive(Args)]
pub struct PlanArgs {
    /// JSON file with calendar events
    #[arg(long)]
    events: PathBuf,
    /// JSON file with tasks
    #[arg(long)]
    tasks: PathBuf,
    /// Reference time as RFC 3339 (defaults to now)
    #[arg(long)]
    now: Option<String>,
    /// Evaluate weekday and hour rules in UTC instead of the local zone
    #[arg(long)]
    utc: bool,
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct PlannedStub {
    task_id: String,
    period: FreePeriod,
    event: EventStub,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let now = match &args.now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| format!("invalid --now '{raw}': {e}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let events = parse_events(&read_items(&args.events)?);
    let tasks = parse_tasks(&read_items(&args.tasks)?);

    let engine = AssignmentEngine::from_config(&config);
    let planned = if args.utc {
        plan_with(&engine.with_timezone(Utc), &config, &events, &tasks, now)
    } else {
        plan_with(&engine, &config, &events, &tasks, now)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    if planned.is_empty() {
        println!("nothing to schedule");
    }
    for p in &planned {
        println!(
            "{} - {}  {}",
            p.event.start.date_time.to_rfc3339(),
            p.event.end.date_time.to_rfc3339(),
            p.event.summary
        );
    }
    Ok(())
}

fn plan_with<Tz: TimeZone>(
    engine: &AssignmentEngine<Tz>,
    config: &Config,
    events: &[todo5_core::CalendarEvent],
    tasks: &[todo5_core::Task],
    now: DateTime<Utc>,
) -> Vec<PlannedStub> {
    engine
        .plan(events, tasks, now)
        .into_iter()
        .map(|a| PlannedStub {
            task_id: a.task.id.clone(),
            period: a.period,
            event: build_event_stub(
                a.period.start,
                config.scheduler.event_duration_minutes,
                a.task,
            ),
        })
        .collect()
}

fn read_items(path: &Path) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| format!("invalid JSON in {}: {e}", path.display()))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(format!("{}: expected an array or an object with \"items\"", path.display()).into()),
        },
        _ => Err(format!("{}: expected an array or an object with \"items\"", path.display()).into()),
    }
}
