use clap::Args;
use todo5_core::{run_cycle, Config};

#[derive(Args)]
pub struct RunArgs {
    /// Plan without creating calendar events
    #[arg(long)]
    dry_run: bool,
    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let report = run_cycle(&config, args.dry_run).await;
    super::print_report(&report, args.json)
}
