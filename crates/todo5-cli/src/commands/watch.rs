use std::time::Duration;

use clap::Args;
use todo5_core::storage::MAX_INTERVAL_MINUTES;
use todo5_core::{run_cycle, run_periodically, Config};

#[derive(Args)]
pub struct WatchArgs {
    /// Minutes between runs (defaults to scheduler.interval_minutes)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_MINUTES))]
    interval: Option<u64>,
    /// Plan without creating calendar events
    #[arg(long)]
    dry_run: bool,
}

pub async fn run(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let minutes = args.interval.unwrap_or(config.scheduler.interval_minutes);
    if !(1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        return Err(format!("interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes").into());
    }
    let period = Duration::from_secs(minutes * 60);

    tracing::info!(interval_minutes = minutes, "scheduler started; press Ctrl-C to stop");
    let config = &config;
    let dry_run = args.dry_run;
    run_periodically(period, move || async move {
        let report = run_cycle(config, dry_run).await;
        if let Err(e) = super::print_report(&report, false) {
            tracing::error!(error = %e, "could not print run report");
        }
    })
    .await;
    Ok(())
}
