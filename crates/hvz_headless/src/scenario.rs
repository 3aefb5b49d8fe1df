//! Scenario definitions.
//!
//! A scenario is the initial state of a run: map size, simulation config,
//! the human squad and how many zombies to scatter. The built-in
//! [`Scenario::demo`] is the classic opening of five soldiers in a cross
//! around (100, 100) against a hundred zombies.

use std::path::Path;

use hvz_core::archetype::Archetype;
use hvz_core::config::{SimulationConfig, WorldSize};
use hvz_core::math::Vec2Fixed;
use hvz_core::player::PlayerId;
use hvz_core::rng::SimRng;
use hvz_core::simulation::Simulation;
use hvz_core::systems::random_point;
use serde::{Deserialize, Serialize};

use crate::error::{HeadlessError, Result};

/// The human player's id in every scenario.
pub const HUMAN: PlayerId = PlayerId(1);

/// Seed offset for zombie placement, so placement and wandering draw from
/// different streams.
const PLACEMENT_STREAM: u64 = 0x2545_F491_4F6C_DD1D;

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Map dimensions.
    pub world: WorldSize,
    /// Soldier positions for the human player.
    pub soldiers: Vec<(i32, i32)>,
    /// Zombies placed uniformly at random for the AI player.
    pub zombies: u32,
    /// Simulation parameters. The seed is overridden per run.
    #[serde(default)]
    pub config: SimulationConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::demo()
    }
}

impl Scenario {
    /// The classic opening.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            name: "demo".to_string(),
            world: WorldSize::new(1600, 1200),
            soldiers: vec![(120, 100), (100, 120), (100, 100), (80, 100), (100, 80)],
            zombies: 100,
            config: SimulationConfig::default(),
        }
    }

    /// A small, crowded arena where fights start immediately.
    #[must_use]
    pub fn arena() -> Self {
        Self {
            name: "arena".to_string(),
            world: WorldSize::new(300, 300),
            soldiers: vec![(150, 150), (130, 150), (170, 150), (150, 130), (150, 170)],
            zombies: 40,
            config: SimulationConfig::default(),
        }
    }

    /// Look up a built-in scenario by name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "demo" => Some(Self::demo()),
            "arena" => Some(Self::arena()),
            _ => None,
        }
    }

    /// Resolve a scenario argument: a built-in name or a RON file path.
    pub fn resolve(name_or_path: &str) -> Result<Self> {
        match Self::builtin(name_or_path) {
            Some(scenario) => Ok(scenario),
            None => Self::load(name_or_path),
        }
    }

    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HeadlessError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Build the initial simulation for `seed`.
    ///
    /// Players are registered AI first, so with the same seed both runs
    /// draw the same colours.
    pub fn build(&self, seed: u64) -> Result<Simulation> {
        let mut problems = self.config.validate();
        problems.extend(self.config.validate_world(self.world));
        if !problems.is_empty() {
            return Err(HeadlessError::InvalidScenario(problems.join("; ")));
        }

        let config = self.config.clone().with_seed(seed);
        let mut sim = Simulation::new(self.world, config);
        sim.add_player(PlayerId::AI)?;
        sim.add_player(HUMAN)?;

        for &(x, y) in &self.soldiers {
            sim.spawn_unit(Archetype::Soldier, Some(HUMAN), Vec2Fixed::from_int(x, y))?;
        }

        let mut rng = SimRng::new(seed ^ PLACEMENT_STREAM);
        for _ in 0..self.zombies {
            let at = random_point(&mut rng, self.world);
            sim.spawn_unit(Archetype::Zombie, Some(PlayerId::AI), at)?;
        }

        tracing::debug!(
            scenario = %self.name,
            seed,
            soldiers = self.soldiers.len(),
            zombies = self.zombies,
            "scenario built"
        );
        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hvz_test_utils::determinism::verify_serialization_determinism;

    #[test]
    fn test_demo_layout() {
        let sim = Scenario::demo().build(1).unwrap();
        assert_eq!(sim.units_of(HUMAN).len(), 5);
        assert_eq!(sim.units_of(PlayerId::AI).len(), 100);
        assert!(sim.validate().is_empty());
    }

    #[test]
    fn test_same_seed_same_setup() {
        let a = Scenario::demo().build(9).unwrap();
        let b = Scenario::demo().build(9).unwrap();
        let c = Scenario::demo().build(10).unwrap();
        assert_eq!(a.state_hash(), b.state_hash());
        assert_ne!(a.state_hash(), c.state_hash());
    }

    #[test]
    fn test_soldier_outside_world_is_rejected() {
        let mut scenario = Scenario::arena();
        scenario.soldiers.push((301, 10));
        assert!(matches!(
            scenario.build(0),
            Err(HeadlessError::Game(hvz_core::error::GameError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut scenario = Scenario::arena();
        scenario.config.cell_size = 0;
        assert!(matches!(
            scenario.build(0),
            Err(HeadlessError::InvalidScenario(msg)) if msg.contains("cell_size")
        ));
    }

    #[test]
    fn test_oversized_world_is_rejected() {
        let scenario = Scenario::from_ron_str(
            r#"(name: "vast", world: (width: 4000000000, height: 100), soldiers: [], zombies: 0)"#,
        )
        .unwrap();
        assert!(matches!(
            scenario.build(0),
            Err(HeadlessError::InvalidScenario(msg)) if msg.contains("side limit")
        ));

        let mut dense = Scenario::arena();
        dense.world = WorldSize::new(1 << 20, 1 << 20);
        dense.soldiers.clear();
        assert!(matches!(
            dense.build(0),
            Err(HeadlessError::InvalidScenario(msg)) if msg.contains("grid cells")
        ));
    }

    #[test]
    fn test_ron_round_trip() {
        let text = ron::to_string(&Scenario::arena()).unwrap();
        let parsed = Scenario::from_ron_str(&text).unwrap();
        assert_eq!(parsed, Scenario::arena());
    }

    #[test]
    fn test_ron_config_defaults() {
        let parsed = Scenario::from_ron_str(
            r#"(name: "tiny", world: (width: 100, height: 100), soldiers: [(50, 50)], zombies: 3)"#,
        )
        .unwrap();
        assert_eq!(parsed.config, SimulationConfig::default());
        assert_eq!(parsed.build(4).unwrap().units().len(), 4);
    }

    #[test]
    fn test_resolve_missing_file() {
        assert!(matches!(
            Scenario::resolve("no/such/scenario.ron"),
            Err(HeadlessError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_demo_snapshot_resumes() {
        assert!(verify_serialization_determinism(
            || Scenario::demo().build(3).unwrap(),
            120,
        ));
    }
}
