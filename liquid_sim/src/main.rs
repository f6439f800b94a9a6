//! Liquid-democracy simulator CLI
//!
//! Run repeated election trials and compare delegated and direct voting.

use clap::Parser;
use liquid_sim::scenarios::ScenarioId;
use liquid_sim::{GraphExport, ParamSet, RunReport, SimError, TrialContext, TrialRunner};
use std::io::Write;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Liquid-democracy election simulator
#[derive(Parser, Debug)]
#[command(name = "liquid-sim")]
#[command(about = "Simulate liquid-democracy elections over synthetic social networks", long_about = None)]
struct Args {
    /// Preset parameters (baseline, single_hop, capped_weight, scale_free, random_rule, skeptical)
    #[arg(short = 'S', long, default_value = "baseline")]
    scenario: String,

    /// JSON parameter file layered over the scenario
    #[arg(short, long)]
    config: Option<String>,

    /// Parameter override, key=value (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of independent trials
    #[arg(short, long, default_value = "100")]
    trials: usize,

    /// Abort on the first failed trial
    #[arg(long)]
    fail_fast: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export trial 0 as JSON for graph visualization
    #[arg(long)]
    export: Option<String>,

    /// List preset scenarios and exit
    #[arg(long)]
    list_scenarios: bool,
}

fn load_params(args: &Args, scenario: ScenarioId) -> Result<ParamSet, SimError> {
    let mut params = scenario.params();
    if let Some(path) = &args.config {
        params.merge(&ParamSet::from_json_file(path)?);
    }
    params.apply_overrides(&args.overrides)?;
    Ok(params)
}

fn print_report(scenario: ScenarioId, report: &RunReport) {
    let s = &report.summary;
    info!("");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Scenario {} (seed={})", scenario.name(), report.seed);
    info!(
        "Trials: {} completed, {} failed",
        s.completed, s.failed
    );
    info!("Delegated accuracy:  {}", s.delegated_accuracy);
    info!("Direct accuracy:     {}", s.direct_accuracy);
    info!("Paths per trial:     {}", s.path_count);
    info!("Mean path size:      {}", s.mean_path_size);
    info!("Max path size:       {}", s.max_path_size);
    info!("Max hop distance:    {}", s.max_distance);
    info!("Resolution rounds:   {}", s.resolution_rounds);
    info!(
        "Delegation better/tied/worse: {}/{}/{}",
        s.delegation_better, s.tied, s.direct_better
    );

    for failure in &report.failures {
        error!(
            "  - trial {} seed={}: {}",
            failure.trial, failure.seed, failure.reason
        );
    }
}

/// Runs the CLI against `out`. Only the JSON report is written to `out`;
/// everything else goes through tracing.
fn run<W: Write>(args: &Args, out: &mut W) -> Result<(), SimError> {
    let scenario: ScenarioId = args
        .scenario
        .parse()
        .map_err(|_| SimError::UnknownScenario(args.scenario.clone()))?;

    let config = load_params(args, scenario)?.to_config()?;

    let context = if args.seed == 0 {
        TrialContext::from_time()
    } else {
        TrialContext::new(args.seed)
    };

    let runner = TrialRunner::new(config, context.seed())
        .with_trials(args.trials)
        .with_fail_fast(args.fail_fast);

    if let Some(path) = &args.export {
        let outcome = runner.run_outcome(0)?;
        let export = GraphExport::from_outcome(&outcome, context.trial_seed(0), Some(scenario.name()));
        export.write_to_file(path)?;
        info!("Exported trial 0 to {}", path);
    }

    let report = runner.run()?;

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
    } else {
        print_report(scenario, &report);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    // Initialize logging on stderr so stdout carries only the report
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    if args.list_scenarios {
        for scenario in ScenarioId::all() {
            println!("{:<14} {}", scenario.name(), scenario.description());
        }
        return;
    }

    if !args.json {
        info!("Liquid-democracy simulator v{}", env!("CARGO_PKG_VERSION"));
    }

    let stdout = std::io::stdout();
    if let Err(e) = run(&args, &mut stdout.lock()) {
        error!("{}", e);
        std::process::exit(1);
    }
}
