//! # HvZ Test Utilities
//!
//! Shared testing utilities for the workspace:
//! - Fixture scenarios (duels, skirmishes, crowds)
//! - Determinism test harness
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
