//! Simulation and camera configuration.
//!
//! Everything tunable lives in two plain-data structs passed by value into
//! [`Simulation`](crate::simulation::Simulation) and
//! [`CameraController`](crate::camera::CameraController). There is no global
//! settings object. Both structs deserialize from RON; any field left out
//! takes its default.
//!
//! # Example RON
//!
//! ```ron
//! SimulationConfig(
//!     tick_rate: 60,
//!     cell_size: 10,
//!     seek_interval_ms: 500,
//!     attack_interval_ms: 1000,
//!     wander_interval_ms: Some(3000),
//!     seed: 7,
//! )
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, ArchetypeTable};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};

/// Map dimensions in world units, fixed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldSize {
    /// Width in world units.
    pub width: u32,
    /// Height in world units.
    pub height: u32,
}

impl WorldSize {
    /// Largest side length accepted by [`SimulationConfig::validate_world`].
    pub const MAX_SIDE: u32 = 1 << 20;

    /// Create a world size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if a point lies in `[0, width] × [0, height]` (inclusive).
    #[must_use]
    pub fn contains(&self, pos: Vec2Fixed) -> bool {
        pos.x >= Fixed::ZERO
            && pos.y >= Fixed::ZERO
            && pos.x <= Fixed::from_num(self.width)
            && pos.y <= Fixed::from_num(self.height)
    }

    /// Clamp a point into the world rectangle.
    #[must_use]
    pub fn clamp(&self, pos: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(
            pos.x.clamp(Fixed::ZERO, Fixed::from_num(self.width)),
            pos.y.clamp(Fixed::ZERO, Fixed::from_num(self.height)),
        )
    }
}

/// Tuning for the fixed-step simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Render frames per second.
    pub fps: u32,
    /// Grid cell side length in world units.
    pub cell_size: u32,
    /// Period of the target-seeking pass.
    pub seek_interval_ms: u32,
    /// Period of the attack pass.
    pub attack_interval_ms: u32,
    /// Period of the AI wander pass. `None` disables wandering.
    pub wander_interval_ms: Option<u32>,
    /// Drags shorter than this on both axes are move orders.
    pub order_threshold: u32,
    /// Spacing between successive order points, in multiples of unit size.
    pub order_spacing: u32,
    /// Seed for wander targets and player colours.
    pub seed: u64,
    /// Per-archetype stats.
    pub archetypes: ArchetypeTable,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            fps: 60,
            cell_size: 10,
            seek_interval_ms: 500,
            attack_interval_ms: 1000,
            wander_interval_ms: Some(3000),
            order_threshold: 10,
            order_spacing: 3,
            seed: 0,
            archetypes: ArchetypeTable::default(),
        }
    }
}

impl SimulationConfig {
    /// Most grid cells a world may need at this config's `cell_size`.
    pub const MAX_GRID_CELLS: u64 = 1 << 22;

    /// Convert a millisecond period into whole ticks (at least one).
    #[must_use]
    pub fn interval_ticks(&self, ms: u32) -> u64 {
        (u64::from(ms) * u64::from(self.tick_rate) / 1000).max(1)
    }

    /// Builder: set the RNG seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: enable or disable the wander pass.
    #[must_use]
    pub const fn with_wander(mut self, interval_ms: Option<u32>) -> Self {
        self.wander_interval_ms = interval_ms;
        self
    }

    /// Parse from RON. `label` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] if the text is not valid RON
    /// for this struct.
    pub fn from_ron_str(label: &str, text: &str) -> Result<Self> {
        parse_ron(label, text)
    }

    /// Check for values the simulation cannot run with.
    ///
    /// Returns one message per problem; empty means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.tick_rate == 0 {
            errors.push("tick_rate must be positive".to_string());
        }
        if self.fps == 0 {
            errors.push("fps must be positive".to_string());
        }
        if self.cell_size == 0 {
            errors.push("cell_size must be positive".to_string());
        }

        for archetype in [Archetype::Soldier, Archetype::Zombie] {
            let stats = self.archetypes.get(archetype);
            let name = archetype.name();
            if stats.lifemax == 0 {
                errors.push(format!("{name}: lifemax must be positive"));
            }
            if stats.speed < Fixed::ZERO {
                errors.push(format!("{name}: speed must not be negative"));
            }
        }

        errors
    }

    /// Check that `world` is usable with this config: positive sides no
    /// longer than [`WorldSize::MAX_SIDE`], and a spatial grid of at most
    /// [`Self::MAX_GRID_CELLS`] cells.
    #[must_use]
    pub fn validate_world(&self, world: WorldSize) -> Vec<String> {
        let mut errors = Vec::new();

        if world.width == 0 || world.height == 0 {
            errors.push("world must have a positive size".to_string());
        }
        if world.width > WorldSize::MAX_SIDE || world.height > WorldSize::MAX_SIDE {
            errors.push(format!(
                "world {}x{} exceeds the {} unit side limit",
                world.width,
                world.height,
                WorldSize::MAX_SIDE
            ));
        } else if self.cell_size > 0 {
            let cells = u64::from(world.width.div_ceil(self.cell_size))
                * u64::from(world.height.div_ceil(self.cell_size));
            if cells > Self::MAX_GRID_CELLS {
                errors.push(format!(
                    "world {}x{} needs {cells} grid cells at cell_size {} (limit {})",
                    world.width,
                    world.height,
                    self.cell_size,
                    Self::MAX_GRID_CELLS
                ));
            }
        }

        errors
    }
}

/// Edge-scroll tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// World units the camera moves per frame while scrolling.
    pub move_speed: u32,
    /// Width of the edge band that triggers scrolling, in view pixels.
    pub move_band_size: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            move_speed: 20,
            move_band_size: 20,
        }
    }
}

impl CameraSettings {
    /// Parse from RON. `label` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::DataParseError`] on malformed input.
    pub fn from_ron_str(label: &str, text: &str) -> Result<Self> {
        parse_ron(label, text)
    }
}

fn parse_ron<T: DeserializeOwned>(label: &str, text: &str) -> Result<T> {
    ron::from_str(text).map_err(|e| {
        tracing::warn!(path = label, error = %e, "failed to parse config");
        GameError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        }
    })
}
