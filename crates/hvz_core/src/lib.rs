//! # HvZ Core
//!
//! Deterministic spatial simulation core for the Humans vs Zombies RTS.
//!
//! This crate contains the whole game model with no host attached:
//! - No drawing (frames are emitted as [`render::DrawCommand`]s)
//! - No input devices (pointer events arrive as [`input::PointerEvent`]s)
//! - No system randomness (wander and colours come from a seeded generator)
//! - Fixed-point positions
//!
//! ## Crate Structure
//!
//! - [`math`] - Fixed-point math utilities
//! - [`grid`] - Uniform spatial grid over the world
//! - [`unit`] / [`player`] - Units, health and ownership
//! - [`simulation`] - Unit storage and the per-tick movement, seek and attack passes
//! - [`camera`] - View/world transform and edge scrolling
//! - [`selection`] - Drag-to-select and click-to-order
//! - [`render`] - Draw-command emission and frame pacing
//! - [`game`] - One session wiring all of the above together

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetype;
pub mod camera;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod input;
pub mod math;
pub mod player;
pub mod render;
pub mod rng;
pub mod selection;
pub mod simulation;
pub mod systems;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetype::{Archetype, ArchetypeStats, ArchetypeTable};
    pub use crate::camera::{Camera, CameraController, EdgeZone, Viewport};
    pub use crate::config::{CameraSettings, SimulationConfig, WorldSize};
    pub use crate::error::{GameError, Result};
    pub use crate::game::{FrameReport, Game, InputResponse};
    pub use crate::grid::{CellIndex, SpatialGrid};
    pub use crate::input::{Button, PointerEvent, PointerState};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::player::{Colour, Player, PlayerId};
    pub use crate::render::{DrawCommand, Layer, RecordingRenderer, Renderer};
    pub use crate::selection::{SelectionController, SelectionOutcome, SelectionState};
    pub use crate::simulation::{Simulation, TickEvents, UnitDied};
    pub use crate::unit::{Health, Unit, UnitId};
}
