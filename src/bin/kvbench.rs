//! kvbench Binary
//!
//! Runs the built-in sled scenarios and prints each one's footprint.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use kvbench::config::{ClosePolicy, HarnessConfig, DEFAULT_RECLAIM_RATIO};
use kvbench::engine::SledEngine;
use kvbench::scheduler::Scheduler;
use kvbench::scenario;
use tracing_subscriber::{fmt, EnvFilter};

/// Exit code when at least one scenario failed
const EXIT_SCENARIO_FAILED: u8 = 1;

/// Exit code when an engine could not be closed
const EXIT_FATAL: u8 = 2;

/// kvbench
#[derive(Parser, Debug)]
#[command(name = "kvbench")]
#[command(about = "On-disk footprint benchmark for embedded key-value engines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run scenarios (the default)
    Run(RunArgs),

    /// List the built-in scenarios
    List,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Only run the named scenario (repeatable)
    #[arg(long = "only", value_name = "NAME")]
    only: Vec<String>,

    /// Parent directory for scenario scratch directories
    #[arg(long, value_name = "DIR")]
    temp_root: Option<PathBuf>,

    /// Ratio passed to each value-log reclamation pass
    #[arg(long, default_value_t = DEFAULT_RECLAIM_RATIO)]
    reclaim_ratio: f64,

    /// What a failed engine close does: abort | propagate
    #[arg(long, default_value_t = ClosePolicy::Abort)]
    close_policy: ClosePolicy,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            only: Vec::new(),
            temp_root: None,
            reclaim_ratio: DEFAULT_RECLAIM_RATIO,
            close_policy: ClosePolicy::Abort,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only metrics
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvbench=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => {
            list();
            ExitCode::SUCCESS
        }
        Some(Commands::Run(args)) => run(args),
        None => run(RunArgs::default()),
    }
}

fn list() {
    for s in scenario::builtin() {
        println!(
            "{}\t{} items, {} B keys, {} B values, {:?}",
            s.name, s.workload.num_items, s.workload.key_size, s.workload.value_size, s.engine
        );
    }
}

fn run(args: RunArgs) -> ExitCode {
    tracing::info!("kvbench v{}", kvbench::VERSION);

    let mut builder = HarnessConfig::builder()
        .reclaim_ratio(args.reclaim_ratio)
        .close_policy(args.close_policy);
    if let Some(root) = &args.temp_root {
        builder = builder.temp_root(root);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SCENARIO_FAILED);
        }
    };

    let scenarios = match scenario::select(scenario::builtin(), &args.only) {
        Ok(scenarios) => scenarios,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SCENARIO_FAILED);
        }
    };

    let outcomes = match Scheduler::new(config).run::<SledEngine>(scenarios) {
        Ok(outcomes) => outcomes,
        Err(e) if e.is_fatal() => {
            eprintln!("running scenario: {}", e);
            return ExitCode::from(EXIT_FATAL);
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_SCENARIO_FAILED);
        }
    };

    // Any failure suppresses every metrics line
    if outcomes.iter().any(|o| !o.is_success()) {
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                eprintln!("running scenario {}: {}", outcome.name, e);
            }
        }
        return ExitCode::from(EXIT_SCENARIO_FAILED);
    }

    for report in outcomes.into_iter().filter_map(|o| o.result.ok()) {
        println!("{}: {}", report.name, report.metrics);
    }

    ExitCode::SUCCESS
}
