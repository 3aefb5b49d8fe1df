//! Pointer input as delivered by the host.
//!
//! Coordinates arrive in view space as `f64` and are converted to
//! fixed-point once, here. Non-finite coordinates are dropped with a warning
//! rather than propagated into the simulation.

use serde::{Deserialize, Serialize};

use crate::math::Vec2Fixed;

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    /// Primary button: drag to select, click to order.
    Left,
    /// Unused by the game.
    Middle,
    /// Opens the context action.
    Right,
}

/// A discrete pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Pointer moved to `(x, y)` in view coordinates.
    Moved {
        /// View x.
        x: f64,
        /// View y.
        y: f64,
    },
    /// Button pressed.
    Down(Button),
    /// Button released.
    Up(Button),
    /// Context menu requested (usually right-click).
    ContextMenu,
}

/// Last known pointer position in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    position: Vec2Fixed,
}

impl PointerState {
    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Record a move. Returns false (and keeps the old position) if the
    /// coordinates are not finite.
    pub fn record_move(&mut self, x: f64, y: f64) -> bool {
        match Vec2Fixed::try_from_f64(x, y) {
            Some(position) => {
                self.position = position;
                true
            }
            None => {
                tracing::warn!(x, y, "ignoring non-finite pointer position");
                false
            }
        }
    }
}
