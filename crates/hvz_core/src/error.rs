//! Error types for the simulation core.
//!
//! Every error here is non-fatal: the operation that produced it is
//! rejected without touching state and the simulation keeps running.

use thiserror::Error;

use crate::unit::UnitId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// Move order outside the map. The unit keeps its previous destination.
    #[error("Invalid order: ({x}; {y}) is outside the map [0, {width}] x [0, {height}]")]
    InvalidOrder {
        /// Requested x coordinate.
        x: f64,
        /// Requested y coordinate.
        y: f64,
        /// Map width.
        width: u32,
        /// Map height.
        height: u32,
    },

    /// Damage value that is not a finite, non-negative number.
    #[error("Invalid damage: {0}")]
    InvalidDamage(String),

    /// Attempt to attach something that is not a fresh unit of this
    /// simulation (foreign id, or already attached).
    #[error("Type mismatch: {0} cannot be attached to this simulation")]
    TypeMismatch(UnitId),

    /// Invalid unit reference.
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    /// Invalid player reference.
    #[error("Player not found: {0}")]
    PlayerNotFound(u32),

    /// Spawn position outside the map.
    #[error("Position ({x}; {y}) is outside the map")]
    OutOfBounds {
        /// Requested x coordinate.
        x: f64,
        /// Requested y coordinate.
        y: f64,
    },

    /// Data file parsing error.
    #[error("Failed to parse data file '{path}': {message}")]
    DataParseError {
        /// Path (or label) of the data that failed to parse.
        path: String,
        /// Error message.
        message: String,
    },

    /// Invalid simulation state.
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
