//! Drag-to-select and click-to-order for the active player.
//!
//! A left press starts a drag. The matching release either issues a move
//! order (the pointer barely moved) or replaces the selection with every
//! owned unit inside the dragged rectangle. Only the active player's units
//! are ever selected or ordered.

use crate::camera::Camera;
use crate::config::WorldSize;
use crate::input::Button;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::PlayerId;
use crate::simulation::Simulation;
use crate::unit::UnitId;

/// Drag state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    /// No drag in progress.
    #[default]
    Idle,
    /// Left button held since `begin` (world coordinates).
    Selecting {
        /// World position of the press.
        begin: Vec2Fixed,
    },
}

/// What a pointer event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Not a left-button event, or a release with no drag in progress.
    Ignored,
    /// A drag started at this world position.
    Started {
        /// World position of the press.
        begin: Vec2Fixed,
    },
    /// Selected units were sent toward `point`.
    Ordered {
        /// World position of the click.
        point: Vec2Fixed,
        /// Units whose destination changed, ascending.
        units: Vec<UnitId>,
        /// Units whose order fell outside the map.
        rejected: Vec<UnitId>,
    },
    /// The selection was replaced.
    Selected {
        /// Top-left corner of the normalized rectangle.
        min: Vec2Fixed,
        /// Bottom-right corner of the normalized rectangle.
        max: Vec2Fixed,
        /// Newly selected units, ascending.
        units: Vec<UnitId>,
    },
}

/// Result of a context action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextAction {
    /// The host should suppress its native context menu.
    pub prevent_default: bool,
    /// Number of units that were deselected.
    pub deselected: usize,
}

/// Live selection rectangle in view coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRect {
    /// Where the drag began, clamped to the map.
    pub origin: Vec2Fixed,
    /// Pointer minus origin; may be negative.
    pub size: Vec2Fixed,
}

/// Interprets pointer drags and clicks for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionController {
    player: PlayerId,
    state: SelectionState,
}

impl SelectionController {
    /// Create a controller acting for `player`.
    #[must_use]
    pub const fn new(player: PlayerId) -> Self {
        Self {
            player,
            state: SelectionState::Idle,
        }
    }

    /// Player whose units this controller selects and orders.
    #[must_use]
    pub const fn active_player(&self) -> PlayerId {
        self.player
    }

    /// Switch the active player. Any drag in progress is dropped.
    pub fn set_active_player(&mut self, player: PlayerId) {
        self.player = player;
        self.state = SelectionState::Idle;
    }

    /// Current drag state.
    #[must_use]
    pub const fn state(&self) -> SelectionState {
        self.state
    }

    /// Handle a button press at `pointer` (view coordinates).
    pub fn pointer_down(
        &mut self,
        button: Button,
        pointer: Vec2Fixed,
        camera: &Camera,
    ) -> SelectionOutcome {
        if button != Button::Left {
            return SelectionOutcome::Ignored;
        }
        let begin = camera.to_world(pointer);
        self.state = SelectionState::Selecting { begin };
        SelectionOutcome::Started { begin }
    }

    /// Handle a button release at `pointer` (view coordinates).
    ///
    /// Any release ends the drag. Only a left release acts on it: within
    /// `order_threshold` world units of the press on both axes it is a move
    /// order, anything larger a selection.
    pub fn pointer_up(
        &mut self,
        button: Button,
        pointer: Vec2Fixed,
        camera: &Camera,
        sim: &mut Simulation,
    ) -> SelectionOutcome {
        let state = std::mem::take(&mut self.state);
        if button != Button::Left {
            return SelectionOutcome::Ignored;
        }
        let SelectionState::Selecting { begin } = state else {
            return SelectionOutcome::Ignored;
        };

        let end = camera.to_world(pointer);
        if is_order(begin, end, sim.config().order_threshold) {
            self.order(end, sim)
        } else {
            self.select(begin, end, sim)
        }
    }

    /// Handle a context action: deselect everything.
    pub fn context_menu(&mut self, sim: &mut Simulation) -> ContextAction {
        ContextAction {
            prevent_default: true,
            deselected: self.deselect_all(sim),
        }
    }

    /// Rectangle to draw for the drag in progress, if any.
    ///
    /// The origin is clamped to `[0, width] × [0, height]`; the far corner
    /// follows the pointer.
    #[must_use]
    pub fn drag_rect(
        &self,
        pointer: Vec2Fixed,
        camera: &Camera,
        world: WorldSize,
    ) -> Option<DragRect> {
        let SelectionState::Selecting { begin } = self.state else {
            return None;
        };
        let origin = world.clamp(camera.to_view(begin));
        Some(DragRect {
            origin,
            size: pointer - origin,
        })
    }

    fn order(&self, mut point: Vec2Fixed, sim: &mut Simulation) -> SelectionOutcome {
        let target = point;
        let spacing = sim.config().order_spacing;
        let mut units = Vec::new();
        let mut rejected = Vec::new();

        for id in sim.units_of(self.player) {
            let Some(unit) = sim.unit(id) else {
                continue;
            };
            if !unit.is_selected() {
                continue;
            }
            let size = sim.config().archetypes.get(unit.archetype()).size;

            match sim.goes_to(id, point) {
                Ok(()) => units.push(id),
                Err(e) => {
                    tracing::debug!(%id, error = %e, "order skipped");
                    rejected.push(id);
                }
            }
            // Ordered units drop their target and retreat
            if let Err(e) = sim.clear_target(id) {
                tracing::debug!(%id, error = %e, "retreat skipped");
            }
            // Fan out so units do not stack on one point
            point.x += Fixed::from_num(spacing * size);
        }

        tracing::debug!(player = %self.player, count = units.len(), "move order issued");
        SelectionOutcome::Ordered {
            point: target,
            units,
            rejected,
        }
    }

    fn select(&self, begin: Vec2Fixed, end: Vec2Fixed, sim: &mut Simulation) -> SelectionOutcome {
        let (min, max) = (begin.min(end), begin.max(end));
        self.deselect_all(sim);

        let inside: Vec<UnitId> = sim
            .units_of(self.player)
            .into_iter()
            .filter(|&id| {
                sim.unit(id).is_some_and(|unit| {
                    let pos = unit.pos();
                    min.x <= pos.x && pos.x <= max.x && min.y <= pos.y && pos.y <= max.y
                })
            })
            .collect();

        for &id in &inside {
            if let Err(e) = sim.set_selected(id, true) {
                tracing::warn!(%id, error = %e, "select failed");
            }
        }

        tracing::debug!(player = %self.player, count = inside.len(), "selection replaced");
        SelectionOutcome::Selected {
            min,
            max,
            units: inside,
        }
    }

    fn deselect_all(&self, sim: &mut Simulation) -> usize {
        let mut count = 0;
        for id in sim.units_of(self.player) {
            if sim.unit(id).is_some_and(|u| u.is_selected()) {
                count += 1;
            }
            if let Err(e) = sim.set_selected(id, false) {
                tracing::warn!(%id, error = %e, "deselect failed");
            }
        }
        count
    }
}

/// Check whether a press/release pair is a click (order) rather than a drag.
#[must_use]
pub fn is_order(begin: Vec2Fixed, end: Vec2Fixed, threshold: u32) -> bool {
    let threshold = Fixed::from_num(threshold);
    (begin.x - end.x).abs() < threshold && (begin.y - end.y).abs() < threshold
}
