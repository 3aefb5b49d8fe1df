//! Batch runner.
//!
//! Runs one scenario over a range of seeds in parallel using rayon and
//! aggregates the outcomes.

use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::runner::{run_scenario, Outcome, RunSummary};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to run.
    pub scenario: Scenario,
    /// Number of runs.
    pub count: u32,
    /// First seed; run `i` uses `seed_start + i`, wrapping at `u64::MAX`.
    pub seed_start: u64,
    /// Maximum ticks per run.
    pub max_ticks: u64,
    /// Maximum parallel runs (0 = rayon default).
    pub parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::demo(),
            count: 16,
            seed_start: 0,
            max_ticks: 60 * 60 * 5, // 5 minutes at 60 tps
            parallel: 0,
        }
    }
}

/// Error for one run in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate over all completed runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Completed runs.
    pub runs: usize,
    /// Runs where every zombie died.
    pub human_wins: usize,
    /// Runs where every soldier died.
    pub zombie_wins: usize,
    /// Runs still undecided at the tick limit.
    pub unresolved: usize,
    /// Mean soldiers alive at the end.
    pub mean_soldiers_left: f64,
    /// Mean zombies alive at the end.
    pub mean_zombies_left: f64,
    /// Mean tick of the first death, over runs that had one.
    pub mean_first_death_tick: Option<f64>,
}

impl BatchSummary {
    /// Aggregate a set of run summaries.
    #[must_use]
    pub fn from_runs(runs: &[RunSummary]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }
        let n = runs.len() as f64;
        let count = |outcome: Outcome| runs.iter().filter(|r| r.outcome == outcome).count();
        let first_deaths: Vec<u64> = runs.iter().filter_map(|r| r.first_death_tick).collect();

        Self {
            runs: runs.len(),
            human_wins: count(Outcome::HumansWin),
            zombie_wins: count(Outcome::ZombiesWin),
            unresolved: count(Outcome::Unresolved),
            mean_soldiers_left: runs.iter().map(|r| r.soldiers_left as f64).sum::<f64>() / n,
            mean_zombies_left: runs.iter().map(|r| r.zombies_left as f64).sum::<f64>() / n,
            mean_first_death_tick: (!first_deaths.is_empty()).then(|| {
                first_deaths.iter().map(|&t| t as f64).sum::<f64>() / first_deaths.len() as f64
            }),
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-run summaries, in seed order.
    pub runs: Vec<RunSummary>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Wall-clock duration.
    pub duration_seconds: f64,
    /// Runs that failed to build or run.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load results saved by [`BatchResults::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Run every seed of the batch, in parallel.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(
        scenario = %config.scenario.name,
        count = config.count,
        seed_start = config.seed_start,
        max_ticks = config.max_ticks,
        "starting batch"
    );

    let seeds: Vec<u64> = (0..u64::from(config.count))
        .map(|i| config.seed_start.wrapping_add(i))
        .collect();
    let run_all = || -> Vec<(u64, Result<RunSummary>)> {
        seeds
            .par_iter()
            .map(|&seed| {
                let result = run_scenario(&config.scenario, seed, config.max_ticks, true)
                    .map(|outcome| outcome.summary);
                (seed, result)
            })
            .collect()
    };

    let results = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "could not build thread pool, using the global one");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let mut runs = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for (seed, result) in results {
        match result {
            Ok(summary) => runs.push(summary),
            Err(e) => {
                warn!(seed, error = %e, "run failed");
                errors.push(BatchError {
                    seed,
                    message: e.to_string(),
                });
            }
        }
    }

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();
    info!(
        runs = summary.runs,
        failed = errors.len(),
        human_wins = summary.human_wins,
        zombie_wins = summary.zombie_wins,
        duration_seconds,
        "batch finished"
    );

    BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    }
}
