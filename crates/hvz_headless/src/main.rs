//! Headless humans-versus-zombies runner.
//!
//! # Usage
//!
//! ```bash
//! # One run of the classic opening, with a map of the final state
//! cargo run -p hvz_headless -- run --seed 7 --ascii
//!
//! # Check that a seed replays identically
//! cargo run -p hvz_headless -- verify --scenario arena --runs 5
//!
//! # Many seeds in parallel
//! cargo run -p hvz_headless -- batch --scenario arena --count 200 --output results/arena.json
//! ```
//!
//! Summaries go to stdout as JSON; logs go to stderr. Set `RUST_LOG` to
//! override the log filter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hvz_headless::{
    ascii::{render_ascii, AsciiConfig},
    batch::{run_batch, BatchConfig},
    run_scenario, verify_runs, Scenario,
};

#[derive(Parser)]
#[command(name = "hvz_headless")]
#[command(about = "Headless humans-versus-zombies runner for testing and tuning")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scenario and print its summary
    Run {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "demo")]
        scenario: String,

        /// Random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Ticks to simulate
        #[arg(short, long, default_value = "3600")]
        ticks: u64,

        /// Stop as soon as one side is wiped out
        #[arg(long)]
        stop: bool,

        /// Print an ASCII map of the final state to stderr
        #[arg(long)]
        ascii: bool,

        /// Width of the ASCII map
        #[arg(long, default_value = "80")]
        width: usize,

        /// Height of the ASCII map
        #[arg(long, default_value = "24")]
        height: usize,
    },

    /// Verify determinism by running the same seed several times
    Verify {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "demo")]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Ticks per run
        #[arg(short, long, default_value = "1800")]
        ticks: u64,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Run many seeds in parallel and aggregate the outcomes
    Batch {
        /// Built-in scenario name or RON file
        #[arg(short, long, default_value = "demo")]
        scenario: String,

        /// Number of runs
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum ticks per run
        #[arg(short, long, default_value = "18000")]
        ticks: u64,

        /// Maximum parallel runs (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: usize,

        /// Write the full results JSON here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            ticks,
            stop,
            ascii,
            width,
            height,
        } => {
            let map = ascii.then_some(AsciiConfig { width, height });
            cmd_run(&scenario, seed, ticks, stop, map);
        }
        Commands::Verify {
            scenario,
            seed,
            ticks,
            runs,
        } => cmd_verify(&scenario, seed, ticks, runs),
        Commands::Batch {
            scenario,
            count,
            seed,
            ticks,
            parallel,
            output,
        } => cmd_batch(&scenario, count, seed, ticks, parallel, output),
    }
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(scenario = %name, error = %e, "failed to load scenario");
            eprintln!("FATAL: cannot load scenario '{name}': {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_run(name: &str, seed: u64, ticks: u64, stop: bool, ascii: Option<AsciiConfig>) {
    let scenario = load_scenario(name);
    let outcome = match run_scenario(&scenario, seed, ticks, stop) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("FATAL: run failed: {e}");
            std::process::exit(1);
        }
    };

    if let Some(config) = ascii {
        eprint!("{}", render_ascii(&outcome.simulation, &config));
    }

    match serde_json::to_string_pretty(&outcome.summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("FATAL: cannot encode summary: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_verify(name: &str, seed: u64, ticks: u64, runs: u32) {
    let scenario = load_scenario(name);
    tracing::info!(scenario = %scenario.name, seed, ticks, runs, "verifying determinism");

    let report = match verify_runs(&scenario, seed, ticks, runs) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("FATAL: verification failed to run: {e}");
            std::process::exit(1);
        }
    };

    for (i, hash) in report.hashes.iter().enumerate() {
        eprintln!("  run {}: {hash}", i + 1);
    }
    if report.deterministic {
        eprintln!("PASS: {} runs of seed {seed} matched", report.hashes.len());
    } else {
        eprintln!("FAIL: runs of seed {seed} diverged");
        std::process::exit(1);
    }
}

fn cmd_batch(
    name: &str,
    count: u32,
    seed: u64,
    ticks: u64,
    parallel: usize,
    output: Option<PathBuf>,
) {
    let scenario = load_scenario(name);
    let results = run_batch(BatchConfig {
        scenario,
        count,
        seed_start: seed,
        max_ticks: ticks,
        parallel,
    });

    let summary = &results.summary;
    eprintln!("\n=== Batch Results ===");
    eprintln!(
        "Runs: {} ok, {} failed ({:.1}s)",
        summary.runs,
        results.errors.len(),
        results.duration_seconds
    );
    eprintln!(
        "Humans won {}, zombies won {}, unresolved {}",
        summary.human_wins, summary.zombie_wins, summary.unresolved
    );
    eprintln!(
        "Mean survivors: {:.2} soldiers, {:.2} zombies",
        summary.mean_soldiers_left, summary.mean_zombies_left
    );
    if let Some(tick) = summary.mean_first_death_tick {
        eprintln!("Mean first death at tick {tick:.0}");
    }

    if let Some(path) = output {
        if let Err(e) = results.save(&path) {
            eprintln!("FATAL: cannot write '{}': {e}", path.display());
            std::process::exit(1);
        }
        eprintln!("Results saved to {}", path.display());
    } else {
        match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("cannot encode summary: {e}"),
        }
    }

    if !results.errors.is_empty() {
        std::process::exit(1);
    }
}
