//! Unit data model.
//!
//! Units are plain data. All behaviour (movement, seeking, attacking,
//! dying) lives in [`Simulation`](crate::simulation::Simulation), which owns
//! every unit and keeps the relations between them consistent. Relations
//! (`target`, `targeted_by`, `owner`) are stored as ids, never references.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::archetype::{Archetype, ArchetypeStats};
use crate::grid::CellIndex;
use crate::math::Vec2Fixed;
use crate::player::PlayerId;

/// Unique identifier for units. Assigned from 1 upwards and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit #{}", self.0)
    }
}

/// Health component: `lifebar` out of `lifemax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create new health component at full health.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Check if the unit is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Apply damage, returning actual damage dealt.
    /// Uses saturating subtraction so health clamps at zero.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let actual = amount.min(self.current);
        self.current -= actual;
        actual
    }

    /// Health as a fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// Movement axis of a unit's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// `pos == to`.
    Idle,
    /// `pos != to`.
    Moving,
}

/// Targeting axis of a unit's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatState {
    /// No target; scanned on every seek pass.
    Seeking,
    /// Has a target.
    Engaging(UnitId),
}

/// A simulated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub(crate) id: UnitId,
    pub(crate) archetype: Archetype,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) pos: Vec2Fixed,
    pub(crate) to: Vec2Fixed,
    pub(crate) cell: CellIndex,
    pub(crate) selected: bool,
    pub(crate) target: Option<UnitId>,
    pub(crate) targeted_by: BTreeSet<UnitId>,
    pub(crate) health: Health,
    pub(crate) damage: u32,
}

impl Unit {
    /// Create a unit at `pos` with stats from its archetype profile.
    ///
    /// The cell is a placeholder until the unit is attached to a grid.
    #[must_use]
    pub fn new(
        id: UnitId,
        archetype: Archetype,
        stats: &ArchetypeStats,
        owner: Option<PlayerId>,
        pos: Vec2Fixed,
    ) -> Self {
        Self {
            id,
            archetype,
            owner,
            pos,
            to: pos,
            cell: CellIndex::default(),
            selected: false,
            target: None,
            targeted_by: BTreeSet::new(),
            health: Health::new(stats.lifemax),
            damage: stats.damage,
        }
    }

    /// Unit identifier.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Stat profile tag.
    #[must_use]
    pub const fn archetype(&self) -> Archetype {
        self.archetype
    }

    /// Owning player, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    /// Current world position.
    #[must_use]
    pub const fn pos(&self) -> Vec2Fixed {
        self.pos
    }

    /// Current movement destination.
    #[must_use]
    pub const fn destination(&self) -> Vec2Fixed {
        self.to
    }

    /// Cached grid cell.
    #[must_use]
    pub const fn cell(&self) -> CellIndex {
        self.cell
    }

    /// Whether the unit is selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.selected
    }

    /// Current target, if any.
    #[must_use]
    pub const fn target(&self) -> Option<UnitId> {
        self.target
    }

    /// Units currently targeting this one, ascending.
    pub fn targeted_by(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.targeted_by.iter().copied()
    }

    /// Health component.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Damage dealt per attack pass. Zero once dead.
    #[must_use]
    pub const fn damage(&self) -> u32 {
        self.damage
    }

    /// Movement axis of the state machine.
    #[must_use]
    pub fn motion_state(&self) -> MotionState {
        if self.pos == self.to {
            MotionState::Idle
        } else {
            MotionState::Moving
        }
    }

    /// Targeting axis of the state machine.
    #[must_use]
    pub fn combat_state(&self) -> CombatState {
        match self.target {
            Some(target) => CombatState::Engaging(target),
            None => CombatState::Seeking,
        }
    }
}
