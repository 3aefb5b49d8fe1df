//! Core simulation loop.
//!
//! The simulation owns every unit, every player and the spatial grid, and
//! keeps the relations between them consistent. It advances in fixed ticks;
//! seeking, attacking and wandering run as interval-gated passes inside a
//! tick rather than as per-unit timers.
//!
//! # Determinism
//!
//! - No floating-point math in the tick (positions and speeds are [`Fixed`])
//! - No system randomness (wander targets come from a seeded [`SimRng`])
//! - Consistent iteration order (sorted unit ids, row-major grid scans)
//!
//! # Example
//!
//! ```
//! use hvz_core::archetype::Archetype;
//! use hvz_core::config::{SimulationConfig, WorldSize};
//! use hvz_core::math::Vec2Fixed;
//! use hvz_core::player::PlayerId;
//! use hvz_core::simulation::Simulation;
//!
//! let mut sim = Simulation::new(WorldSize::new(640, 480), SimulationConfig::default());
//! sim.add_player(PlayerId(1)).unwrap();
//!
//! let soldier = sim
//!     .spawn_unit(Archetype::Soldier, Some(PlayerId(1)), Vec2Fixed::from_int(100, 100))
//!     .unwrap();
//! sim.goes_to(soldier, Vec2Fixed::from_int(110, 100)).unwrap();
//!
//! for _ in 0..8 {
//!     sim.tick();
//! }
//! assert_eq!(sim.unit(soldier).unwrap().pos(), Vec2Fixed::from_int(110, 100));
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::config::{SimulationConfig, WorldSize};
use crate::error::{GameError, Result};
use crate::grid::SpatialGrid;
use crate::math::Vec2Fixed;
use crate::player::{Colour, Player, PlayerId};
use crate::rng::SimRng;
use crate::systems::{approach_point, in_attack_range, random_point, step_toward};
use crate::unit::{Unit, UnitId};

/// Storage for all live units.
///
/// Uses a `HashMap` for O(1) lookup by id, with deterministic iteration via
/// sorted keys when running passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitStorage {
    units: HashMap<UnitId, Unit>,
    /// Ids handed out by [`Simulation::new_unit`] but not yet attached.
    pending: BTreeSet<UnitId>,
    next_id: u64,
}

impl UnitStorage {
    /// Create empty storage. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            pending: BTreeSet::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> UnitId {
        let id = UnitId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id);
        id
    }

    fn take_pending(&mut self, id: UnitId) -> bool {
        self.pending.remove(&id)
    }

    fn insert(&mut self, unit: Unit) {
        self.units.insert(unit.id, unit);
    }

    fn remove(&mut self, id: UnitId) -> Option<Unit> {
        self.units.remove(&id)
    }

    /// Get a unit by id.
    #[must_use]
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Check if a unit is alive.
    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// Number of live units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Sorted unit ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<UnitId> {
        let mut ids: Vec<_> = self.units.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all units (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

impl Default for UnitStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// A unit picked up a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetAcquired {
    /// Unit that now has a target.
    pub attacker: UnitId,
    /// Its new target.
    pub target: UnitId,
    /// True when the target was acquired by being attacked, not by seeking.
    pub retaliation: bool,
}

/// Damage applied to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageEvent {
    /// Attacking unit, `None` for external damage.
    pub attacker: Option<UnitId>,
    /// Damaged unit.
    pub target: UnitId,
    /// Health actually removed.
    pub amount: u32,
    /// Health left afterwards.
    pub remaining: u32,
}

/// A unit reached zero health and was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitDied {
    /// The dead unit.
    pub unit: UnitId,
    /// Its archetype.
    pub archetype: Archetype,
    /// Its former owner.
    pub owner: Option<PlayerId>,
    /// Where it died.
    pub pos: Vec2Fixed,
    /// The unit that dealt the final blow, if any.
    pub killer: Option<UnitId>,
}

/// Events generated during a simulation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Tick number these events belong to.
    pub tick: u64,
    /// Units whose position changed.
    pub moved: Vec<UnitId>,
    /// Targets acquired by seeking or retaliation.
    pub acquisitions: Vec<TargetAcquired>,
    /// Damage dealt in the attack pass.
    pub damage_events: Vec<DamageEvent>,
    /// Attackers that were out of range and were sent closer.
    pub approaches: Vec<UnitId>,
    /// Units that died this tick.
    pub deaths: Vec<UnitDied>,
    /// AI units sent to a random point.
    pub wandered: Vec<UnitId>,
}

/// The core simulation.
///
/// # Pass Order
///
/// Each tick runs, in this order:
/// 1. **Movement** - every unit steps toward its destination; grid updated
/// 2. **Seek** (every `seek_interval_ms`) - idle units acquire the first
///    hostile unit in range
/// 3. **Attack** (every `attack_interval_ms`) - in range: damage, deaths
///    applied immediately; out of range: move closer
/// 4. **Wander** (every `wander_interval_ms`) - untargeted AI units roam
///
/// Within each step units are visited in ascending id order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    config: SimulationConfig,
    world: WorldSize,
    tick: u64,
    grid: SpatialGrid,
    units: UnitStorage,
    players: BTreeMap<PlayerId, Player>,
    rng: SimRng,
}

impl Simulation {
    /// Create an empty simulation over a world of the given size.
    #[must_use]
    pub fn new(world: WorldSize, config: SimulationConfig) -> Self {
        Self {
            grid: SpatialGrid::new(world, config.cell_size),
            rng: SimRng::new(config.seed),
            world,
            tick: 0,
            units: UnitStorage::new(),
            players: BTreeMap::new(),
            config,
        }
    }

    /// Current tick number. Starts at 0; the first [`tick()`](Self::tick) is tick 1.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// World dimensions.
    #[must_use]
    pub const fn world(&self) -> WorldSize {
        self.world
    }

    /// The spatial index.
    #[must_use]
    pub const fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    /// All live units.
    #[must_use]
    pub const fn units(&self) -> &UnitStorage {
        &self.units
    }

    /// Get a live unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    /// Get a player.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// All players in id order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Register a player with a colour drawn from the simulation RNG.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the id is already taken.
    pub fn add_player(&mut self, id: PlayerId) -> Result<&Player> {
        let colour = Colour::random(&mut self.rng);
        self.add_player_with_colour(id, colour)
    }

    /// Register a player with an explicit colour.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the id is already taken.
    pub fn add_player_with_colour(&mut self, id: PlayerId, colour: Colour) -> Result<&Player> {
        if self.players.contains_key(&id) {
            tracing::warn!(%id, "player already registered");
            return Err(GameError::InvalidState(format!("{id} is already registered")));
        }
        tracing::debug!(%id, %colour, "player registered");
        Ok(&*self.players.entry(id).or_insert_with(|| Player::new(id, colour)))
    }

    /// Create a unit with a fresh id. It does not take part in the
    /// simulation until passed to [`attach`](Self::attach).
    pub fn new_unit(
        &mut self,
        archetype: Archetype,
        owner: Option<PlayerId>,
        pos: Vec2Fixed,
    ) -> Unit {
        let id = self.units.allocate_id();
        Unit::new(id, archetype, self.config.archetypes.get(archetype), owner, pos)
    }

    /// Attach a unit created by [`new_unit`](Self::new_unit): index it in
    /// the grid, add it to its owner's roster and start simulating it.
    ///
    /// # Errors
    ///
    /// - [`GameError::TypeMismatch`] if the unit was not created by this
    ///   simulation or is already attached
    /// - [`GameError::OutOfBounds`] if its position is outside the map
    /// - [`GameError::PlayerNotFound`] if its owner is not registered
    ///
    /// On error the unit is dropped and its id is never reused.
    pub fn attach(&mut self, mut unit: Unit) -> Result<UnitId> {
        let id = unit.id;
        if !self.units.take_pending(id) {
            tracing::warn!(%id, "attach rejected: not a fresh unit of this simulation");
            return Err(GameError::TypeMismatch(id));
        }
        if !self.world.contains(unit.pos) {
            let (x, y) = (unit.pos.x.to_num::<f64>(), unit.pos.y.to_num::<f64>());
            tracing::warn!(%id, x, y, "attach rejected: outside the map");
            return Err(GameError::OutOfBounds { x, y });
        }
        if let Some(owner) = unit.owner {
            let Some(player) = self.players.get_mut(&owner) else {
                tracing::warn!(%id, %owner, "attach rejected: unknown owner");
                return Err(GameError::PlayerNotFound(owner.0));
            };
            player.owns(id);
        }

        unit.cell = self.grid.insert(id, unit.pos);
        tracing::trace!(%id, archetype = unit.archetype.name(), cell = ?unit.cell, "unit attached");
        self.units.insert(unit);
        Ok(id)
    }

    /// Create and attach a unit in one step.
    ///
    /// # Errors
    ///
    /// Same as [`attach`](Self::attach).
    pub fn spawn_unit(
        &mut self,
        archetype: Archetype,
        owner: Option<PlayerId>,
        pos: Vec2Fixed,
    ) -> Result<UnitId> {
        let unit = self.new_unit(archetype, owner, pos);
        self.attach(unit)
    }

    /// Set a unit's destination.
    ///
    /// # Errors
    ///
    /// - [`GameError::UnitNotFound`] if the unit is dead or unknown
    /// - [`GameError::InvalidOrder`] if `point` is outside
    ///   `[0, width] × [0, height]`; the previous destination is kept
    pub fn goes_to(&mut self, id: UnitId, point: Vec2Fixed) -> Result<()> {
        let world = self.world;
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        if !world.contains(point) {
            let (x, y) = (point.x.to_num::<f64>(), point.y.to_num::<f64>());
            tracing::warn!(%id, x, y, "order outside the map rejected");
            return Err(GameError::InvalidOrder {
                x,
                y,
                width: world.width,
                height: world.height,
            });
        }
        unit.to = point;
        Ok(())
    }

    /// Apply damage from outside the simulation.
    ///
    /// Finite amounts are rounded to the nearest integer. Returns the death
    /// event if the unit was killed.
    ///
    /// # Errors
    ///
    /// - [`GameError::InvalidDamage`] for NaN, infinite or negative amounts
    /// - [`GameError::UnitNotFound`] if the unit is dead or unknown
    pub fn deal_damage(&mut self, id: UnitId, amount: f64) -> Result<Option<UnitDied>> {
        if !amount.is_finite() || amount < 0.0 {
            tracing::warn!(%id, amount, "non-finite or negative damage rejected");
            return Err(GameError::InvalidDamage(format!("{amount} dealt to {id}")));
        }
        if !self.units.contains(id) {
            return Err(GameError::UnitNotFound(id));
        }
        let amount = amount.round().min(f64::from(u32::MAX)) as u32;
        Ok(self.apply_damage(None, id, amount).and_then(|(_, died)| died))
    }

    /// Mark a unit selected or not.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is dead or unknown.
    pub fn set_selected(&mut self, id: UnitId, selected: bool) -> Result<()> {
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        unit.selected = selected;
        Ok(())
    }

    /// Drop a unit's target (retreat). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if the unit is dead or unknown.
    pub fn clear_target(&mut self, id: UnitId) -> Result<()> {
        let unit = self.units.get_mut(id).ok_or(GameError::UnitNotFound(id))?;
        if let Some(target) = unit.target.take() {
            if let Some(target) = self.units.get_mut(target) {
                target.targeted_by.remove(&id);
            }
        }
        Ok(())
    }

    /// Owned units of a player in ascending id order. Empty for unknown players.
    #[must_use]
    pub fn units_of(&self, player: PlayerId) -> Vec<UnitId> {
        self.players
            .get(&player)
            .map(|p| p.units().collect())
            .unwrap_or_default()
    }

    /// Advance the simulation by one tick.
    ///
    /// Runs the passes in fixed order (see the type docs) and returns the
    /// events generated during this tick.
    pub fn tick(&mut self) -> TickEvents {
        self.tick += 1;
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };

        let ids = self.units.sorted_ids();

        self.run_movement(&ids, &mut events);

        if self.is_due(self.config.seek_interval_ms) {
            self.run_seek(&ids, &mut events);
        }

        if self.is_due(self.config.attack_interval_ms) {
            self.run_attack(&ids, &mut events);
        }

        if let Some(wander_ms) = self.config.wander_interval_ms {
            if self.is_due(wander_ms) {
                self.run_wander(&ids, &mut events);
            }
        }

        #[cfg(feature = "debug-validation")]
        for violation in self.validate() {
            tracing::error!(tick = self.tick, %violation, "simulation invariant violated");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
        }

        events
    }

    fn is_due(&self, interval_ms: u32) -> bool {
        self.tick % self.config.interval_ticks(interval_ms) == 0
    }

    fn run_movement(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        for &id in ids {
            let Some(unit) = self.units.get_mut(id) else {
                continue;
            };
            let speed = self.config.archetypes.get(unit.archetype).speed;
            let next = step_toward(unit.pos, unit.to, speed);
            if next != unit.pos {
                unit.pos = next;
                unit.cell = self.grid.relocate(id, unit.cell, next);
                events.moved.push(id);
            }
        }
    }

    fn run_seek(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        for &id in ids {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.target.is_some() {
                continue;
            }

            let stats = self.config.archetypes.get(unit.archetype);
            let found = self
                .grid
                .query_radius(unit.cell, stats.range)
                .into_iter()
                .find(|&other| {
                    other != id
                        && self
                            .units
                            .get(other)
                            .is_some_and(|o| stats.can_target(o.archetype) && !o.health.is_dead())
                });

            if let Some(target) = found {
                self.engage(id, target);
                tracing::trace!(%id, %target, "target acquired");
                events.acquisitions.push(TargetAcquired {
                    attacker: id,
                    target,
                    retaliation: false,
                });
            }
        }
    }

    fn run_attack(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        let cell_size = self.grid.cell_size();
        for &id in ids {
            // May have died earlier in this pass
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let Some(target_id) = unit.target else {
                continue;
            };
            let (pos, damage) = (unit.pos, unit.damage);
            let range = self.config.archetypes.get(unit.archetype).range;

            let Some(target) = self.units.get(target_id) else {
                tracing::warn!(%id, target = %target_id, "dangling target cleared");
                if let Some(unit) = self.units.get_mut(id) {
                    unit.target = None;
                }
                continue;
            };

            if in_attack_range(pos, target.pos, range, cell_size) {
                if target.target.is_none() {
                    self.engage(target_id, id);
                    events.acquisitions.push(TargetAcquired {
                        attacker: target_id,
                        target: id,
                        retaliation: true,
                    });
                }
                if let Some((hit, died)) = self.apply_damage(Some(id), target_id, damage) {
                    events.damage_events.push(hit);
                    events.deaths.extend(died);
                }
            } else {
                let point = approach_point(pos, target.pos, range, cell_size, self.world);
                match self.goes_to(id, point) {
                    Ok(()) => events.approaches.push(id),
                    Err(e) => tracing::debug!(%id, error = %e, "approach order skipped"),
                }
            }
        }
    }

    fn run_wander(&mut self, ids: &[UnitId], events: &mut TickEvents) {
        for &id in ids {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            if unit.owner != Some(PlayerId::AI) || unit.target.is_some() {
                continue;
            }
            let point = random_point(&mut self.rng, self.world);
            match self.goes_to(id, point) {
                Ok(()) => events.wandered.push(id),
                Err(e) => tracing::debug!(%id, error = %e, "wander order skipped"),
            }
        }
    }

    /// Point `attacker` at `target` and register the back-reference.
    fn engage(&mut self, attacker: UnitId, target: UnitId) {
        if let Some(unit) = self.units.get_mut(attacker) {
            unit.target = Some(target);
        }
        if let Some(unit) = self.units.get_mut(target) {
            unit.targeted_by.insert(attacker);
        }
    }

    fn apply_damage(
        &mut self,
        attacker: Option<UnitId>,
        target: UnitId,
        amount: u32,
    ) -> Option<(DamageEvent, Option<UnitDied>)> {
        let unit = self.units.get_mut(target)?;
        let dealt = unit.health.apply_damage(amount);
        let event = DamageEvent {
            attacker,
            target,
            amount: dealt,
            remaining: unit.health.current,
        };
        let died = if unit.health.is_dead() {
            self.kill(target, attacker)
        } else {
            None
        };
        Some((event, died))
    }

    /// Remove a dead unit and every reference to it.
    fn kill(&mut self, id: UnitId, killer: Option<UnitId>) -> Option<UnitDied> {
        let mut unit = self.units.remove(id)?;
        unit.damage = 0;
        unit.health.current = 0;

        if let Some(target) = unit.target.take() {
            if let Some(target) = self.units.get_mut(target) {
                target.targeted_by.remove(&id);
            }
        }
        for attacker in std::mem::take(&mut unit.targeted_by) {
            if let Some(attacker) = self.units.get_mut(attacker) {
                if attacker.target == Some(id) {
                    attacker.target = None;
                }
            }
        }
        if !self.grid.remove(id, unit.cell) {
            tracing::warn!(%id, cell = ?unit.cell, "dead unit was not in its recorded cell");
        }
        if let Some(owner) = unit.owner {
            if let Some(player) = self.players.get_mut(&owner) {
                player.disown(id);
            }
        }

        tracing::debug!(
            tick = self.tick,
            %id,
            archetype = unit.archetype.name(),
            killer = ?killer,
            "unit died"
        );
        Some(UnitDied {
            unit: id,
            archetype: unit.archetype,
            owner: unit.owner,
            pos: unit.pos,
            killer,
        })
    }

    /// Check every cross-structure invariant. Returns one message per
    /// violation; an empty list means the state is consistent.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid.len() != self.units.len() {
            errors.push(format!(
                "grid indexes {} units but {} are alive",
                self.grid.len(),
                self.units.len()
            ));
        }

        for id in self.units.sorted_ids() {
            let Some(unit) = self.units.get(id) else {
                continue;
            };
            let expected = self.grid.cell_of(unit.pos);
            if unit.cell != expected || self.grid.cell_containing(id) != Some(expected) {
                errors.push(format!("{id} is not indexed in cell {expected:?}"));
            }
            if unit.health.current > unit.health.max || unit.health.is_dead() {
                errors.push(format!("{id} has health {:?}", unit.health));
            }
            if let Some(target) = unit.target {
                let linked = self
                    .units
                    .get(target)
                    .is_some_and(|t| t.targeted_by.contains(&id));
                if !linked {
                    errors.push(format!("{id} targets {target} without a back-reference"));
                }
            }
            for attacker in &unit.targeted_by {
                let linked = self
                    .units
                    .get(*attacker)
                    .is_some_and(|a| a.target == Some(id));
                if !linked {
                    errors.push(format!("{id} lists {attacker} as attacker but is not its target"));
                }
            }
            if let Some(owner) = unit.owner {
                if !self.players.get(&owner).is_some_and(|p| p.has_unit(id)) {
                    errors.push(format!("{id} is missing from the roster of {owner}"));
                }
            }
        }

        for player in self.players.values() {
            for id in player.units() {
                if self.units.get(id).map(|u| u.owner) != Some(Some(player.id())) {
                    errors.push(format!("{} lists {id} which it does not own", player.id()));
                }
            }
        }

        errors
    }

    /// Hash of the full simulation state.
    ///
    /// Two simulations with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.rng.state().hash(&mut hasher);

        let ids = self.units.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.units.get(id) {
                id.hash(&mut hasher);
                unit.archetype.hash(&mut hasher);
                unit.owner.hash(&mut hasher);
                unit.pos.hash(&mut hasher);
                unit.to.hash(&mut hasher);
                unit.cell.hash(&mut hasher);
                unit.selected.hash(&mut hasher);
                unit.target.hash(&mut hasher);
                unit.targeted_by.hash(&mut hasher);
                unit.health.hash(&mut hasher);
                unit.damage.hash(&mut hasher);
            }
        }

        for player in self.players.values() {
            player.id().hash(&mut hasher);
            player.colour().hash(&mut hasher);
            player.unit_count().hash(&mut hasher);
            for id in player.units() {
                id.hash(&mut hasher);
            }
        }

        hasher.finish()
    }

    /// Serialize the simulation state to an in-memory snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a simulation from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::InvalidState(format!("Failed to deserialize simulation: {e}"))
        })
    }
}
