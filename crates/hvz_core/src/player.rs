//! Players and their unit rosters.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rng::SimRng;
use crate::unit::UnitId;

/// Player identifier. `0` is reserved for the AI-controlled side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The non-human side.
    pub const AI: Self = Self(0);

    /// Check if this is the AI side.
    #[must_use]
    pub const fn is_ai(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// Display-only RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Colour {
    /// `#000000`.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// `#FFFFFF`.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create a colour from channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Random colour drawn from the simulation RNG.
    pub fn random(rng: &mut SimRng) -> Self {
        let bits = rng.next_u64();
        Self::rgb(bits as u8, (bits >> 8) as u8, (bits >> 16) as u8)
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// A player: identity, colour and the set of owned units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    colour: Colour,
    units: BTreeSet<UnitId>,
}

impl Player {
    /// Create a player with an empty roster.
    #[must_use]
    pub fn new(id: PlayerId, colour: Colour) -> Self {
        Self {
            id,
            colour,
            units: BTreeSet::new(),
        }
    }

    /// Player identifier.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Display colour.
    #[must_use]
    pub const fn colour(&self) -> Colour {
        self.colour
    }

    /// Add a unit to the roster. Returns false if it was already owned.
    pub fn owns(&mut self, unit: UnitId) -> bool {
        self.units.insert(unit)
    }

    /// Remove a unit from the roster. Returns false if it was not owned.
    pub fn disown(&mut self, unit: UnitId) -> bool {
        self.units.remove(&unit)
    }

    /// Check roster membership.
    #[must_use]
    pub fn has_unit(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Owned units in ascending id order.
    pub fn units(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units.iter().copied()
    }

    /// Number of owned units.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}
