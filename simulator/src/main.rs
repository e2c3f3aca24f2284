use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic cyclone driver for the CPS diagnostics core")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 8)]
    points: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Print the augmented track table as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Suppress progress messages from the core
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.points, args.seed, !args.quiet)
    };
    log::info!(
        "running scenario with {} points on {} levels",
        workflow_config.scenario.points,
        workflow_config.scenario.levels_hpa.len()
    );

    let result = Runner::new(workflow_config).execute()?;
    println!("{}", result.summary());

    if args.json {
        let table = result.table.to_json().context("serializing track table")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&table).context("formatting track table")?
        );
    }

    Ok(())
}
