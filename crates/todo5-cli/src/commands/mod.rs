pub mod auth;
pub mod config;
pub mod plan;
pub mod run;
pub mod watch;

use todo5_core::runner::{Outcome, RunReport};

/// Print a run report as JSON or as one line per placement.
pub fn print_report(report: &RunReport, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(reason) = &report.skipped {
        println!("nothing scheduled: {reason}");
        return Ok(());
    }
    if report.placements.is_empty() {
        println!("nothing to schedule");
        return Ok(());
    }
    for placement in &report.placements {
        let status = match &placement.outcome {
            Outcome::Created { event_id } => format!("created {event_id}"),
            Outcome::Failed { error } => format!("failed: {error}"),
            Outcome::DryRun => "dry run".to_string(),
        };
        println!(
            "{}  {}  [{}] {}",
            placement.event_start.to_rfc3339(),
            status,
            placement.task_id,
            placement.task_content
        );
    }
    println!(
        "{} planned, {} created, {} failed",
        report.placements.len(),
        report.created(),
        report.failed()
    );
    Ok(())
}
