//! Unit archetypes and their read-only stat table.
//!
//! The archetype set is closed and small, so a unit carries an
//! [`Archetype`] tag that indexes into an [`ArchetypeTable`] instead of
//! owning its stats:
//! - [`Archetype`]: the tag (Soldier, Zombie)
//! - [`ArchetypeSet`]: bitflags used for "may this unit target that one?"
//! - [`ArchetypeStats`]: size, health, speed, range, damage and enemies
//!
//! The table is plain data and can be loaded from RON alongside the rest of
//! [`SimulationConfig`](crate::config::SimulationConfig).

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};
use crate::player::Colour;

/// A unit's stat profile tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Archetype {
    /// Player-controlled infantry. Drawn in the owner's colour.
    Soldier,
    /// Slow melee unit, usually owned by the AI side.
    Zombie,
}

impl Archetype {
    /// Every archetype, in declaration order.
    pub const ALL: [Self; 2] = [Self::Soldier, Self::Zombie];

    /// The single-member set for this archetype.
    #[must_use]
    pub const fn as_set(self) -> ArchetypeSet {
        match self {
            Self::Soldier => ArchetypeSet::SOLDIER,
            Self::Zombie => ArchetypeSet::ZOMBIE,
        }
    }

    /// Short lowercase name, used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Soldier => "soldier",
            Self::Zombie => "zombie",
        }
    }
}

/// Bitflags over [`Archetype`] for O(1) membership checks.
///
/// # Example
///
/// ```
/// use hvz_core::archetype::{Archetype, ArchetypeSet};
///
/// let set = ArchetypeSet::ZOMBIE;
/// assert!(set.contains(Archetype::Zombie));
/// assert!(!set.contains(Archetype::Soldier));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ArchetypeSet(u8);

impl ArchetypeSet {
    /// No archetypes.
    pub const EMPTY: Self = Self(0);
    /// Soldiers only.
    pub const SOLDIER: Self = Self(1 << 0);
    /// Zombies only.
    pub const ZOMBIE: Self = Self(1 << 1);

    /// Union of two sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether the archetype is a member.
    #[must_use]
    pub const fn contains(self, archetype: Archetype) -> bool {
        self.0 & archetype.as_set().0 != 0
    }

    /// Check if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Immutable per-archetype statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeStats {
    /// Radius in pixels.
    pub size: u32,
    /// Maximum (and starting) health.
    pub lifemax: u32,
    /// Movement speed in world units per tick.
    #[serde(with = "fixed_serde")]
    pub speed: Fixed,
    /// Engagement range in grid cells.
    pub range: u32,
    /// Damage per successful attack pass.
    pub damage: u32,
    /// Archetypes this one may acquire as a target.
    pub enemies: ArchetypeSet,
    /// Fixed display colour. `None` means "use the owner's colour".
    #[serde(default)]
    pub colour: Option<Colour>,
}

impl ArchetypeStats {
    /// Default soldier profile.
    #[must_use]
    pub fn soldier() -> Self {
        Self {
            size: 7,
            lifemax: 30,
            speed: Fixed::from_num(1.25),
            range: 5,
            damage: 3,
            enemies: ArchetypeSet::ZOMBIE,
            colour: None,
        }
    }

    /// Default zombie profile.
    #[must_use]
    pub fn zombie() -> Self {
        Self {
            size: 5,
            lifemax: 20,
            speed: Fixed::from_num(0.3),
            range: 1,
            damage: 1,
            enemies: ArchetypeSet::SOLDIER,
            colour: Some(Colour::BLACK),
        }
    }

    /// Check if a unit of this profile may target the given archetype.
    #[must_use]
    pub const fn can_target(&self, archetype: Archetype) -> bool {
        self.enemies.contains(archetype)
    }
}

/// Read-only lookup from [`Archetype`] to [`ArchetypeStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchetypeTable {
    soldier: ArchetypeStats,
    zombie: ArchetypeStats,
}

impl ArchetypeTable {
    /// Build a table from explicit profiles.
    #[must_use]
    pub const fn new(soldier: ArchetypeStats, zombie: ArchetypeStats) -> Self {
        Self { soldier, zombie }
    }

    /// Stats for an archetype.
    #[must_use]
    pub const fn get(&self, archetype: Archetype) -> &ArchetypeStats {
        match archetype {
            Archetype::Soldier => &self.soldier,
            Archetype::Zombie => &self.zombie,
        }
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::new(ArchetypeStats::soldier(), ArchetypeStats::zombie())
    }
}
