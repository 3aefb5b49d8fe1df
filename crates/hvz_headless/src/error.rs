//! Error types for the headless runner.

use thiserror::Error;

/// Errors raised while loading or running scenarios.
#[derive(Error, Debug)]
pub enum HeadlessError {
    /// Scenario file not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse a RON scenario.
    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Failed to encode JSON output.
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    /// The simulation rejected part of the setup.
    #[error("Simulation error: {0}")]
    Game(#[from] hvz_core::error::GameError),
    /// A scenario that cannot be built.
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}

/// Result type for headless operations.
pub type Result<T> = std::result::Result<T, HeadlessError>;
