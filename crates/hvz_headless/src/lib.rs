//! Headless runner for the humans-versus-zombies simulation.
//!
//! Runs scenarios without a browser or renderer, for CI and tuning:
//!
//! - **run**: one seed, summary as JSON on stdout, optional ASCII map
//! - **verify**: repeat a seed and compare state hashes
//! - **batch**: many seeds in parallel, aggregated into a JSON report
//!
//! Logs go to stderr so stdout stays machine-readable.
//!
//! # Example
//!
//! ```bash
//! cargo run -p hvz_headless -- run --scenario demo --seed 7 --ascii
//! cargo run -p hvz_headless -- batch --scenario arena --count 64 --output results/arena.json
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod batch;
pub mod error;
pub mod runner;
pub mod scenario;

pub use error::{HeadlessError, Result};
pub use runner::{run_scenario, verify_runs, Outcome, RunSummary};
pub use scenario::Scenario;
