//! Single-run driver.
//!
//! Builds a scenario, advances the simulation a fixed number of ticks and
//! folds the per-tick events into a [`RunSummary`].

use hvz_core::archetype::Archetype;
use hvz_core::player::PlayerId;
use hvz_core::simulation::{Simulation, TickEvents};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scenario::{Scenario, HUMAN};

/// Which side, if any, is wiped out at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No zombies left.
    HumansWin,
    /// No soldiers left.
    ZombiesWin,
    /// Both sides still standing when the tick budget ran out.
    Unresolved,
}

/// Aggregate of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Scenario name.
    pub scenario: String,
    /// Seed used.
    pub seed: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Final state hash, hex encoded.
    pub state_hash: String,
    /// Soldiers alive at the end.
    pub soldiers_left: usize,
    /// Zombies alive at the end.
    pub zombies_left: usize,
    /// Soldiers killed.
    pub soldier_deaths: usize,
    /// Zombies killed.
    pub zombie_deaths: usize,
    /// Targets acquired by seeking.
    pub acquisitions: usize,
    /// Targets acquired by being attacked.
    pub retaliations: usize,
    /// Total damage dealt.
    pub damage_dealt: u64,
    /// Tick of the first death, if any.
    pub first_death_tick: Option<u64>,
    /// Winner, if decided.
    pub outcome: Outcome,
}

/// Running tally of tick events.
#[derive(Debug, Default)]
struct Tally {
    soldier_deaths: usize,
    zombie_deaths: usize,
    acquisitions: usize,
    retaliations: usize,
    damage_dealt: u64,
    first_death_tick: Option<u64>,
}

impl Tally {
    fn record(&mut self, events: &TickEvents) {
        for acquired in &events.acquisitions {
            if acquired.retaliation {
                self.retaliations += 1;
            } else {
                self.acquisitions += 1;
            }
        }
        self.damage_dealt += events
            .damage_events
            .iter()
            .map(|d| u64::from(d.amount))
            .sum::<u64>();
        for death in &events.deaths {
            match death.archetype {
                Archetype::Soldier => self.soldier_deaths += 1,
                Archetype::Zombie => self.zombie_deaths += 1,
            }
            self.first_death_tick.get_or_insert(events.tick);
        }
    }
}

/// Result of a run: the summary plus the final simulation.
#[derive(Debug)]
pub struct RunOutcome {
    /// Summary of the run.
    pub summary: RunSummary,
    /// Final simulation state.
    pub simulation: Simulation,
}

/// Run `scenario` with `seed` for `ticks` ticks.
///
/// With `stop_when_decided`, the run ends early on the tick one side is
/// wiped out.
pub fn run_scenario(
    scenario: &Scenario,
    seed: u64,
    ticks: u64,
    stop_when_decided: bool,
) -> Result<RunOutcome> {
    let mut sim = scenario.build(seed)?;
    let mut tally = Tally::default();

    for _ in 0..ticks {
        let events = sim.tick();
        tally.record(&events);
        if stop_when_decided && outcome_of(&sim) != Outcome::Unresolved {
            break;
        }
    }

    let violations = sim.validate();
    if !violations.is_empty() {
        tracing::error!(
            count = violations.len(),
            first = %violations[0],
            "inconsistent final state"
        );
    }

    let summary = RunSummary {
        scenario: scenario.name.clone(),
        seed,
        ticks: sim.get_tick(),
        state_hash: format!("{:016x}", sim.state_hash()),
        soldiers_left: sim.units_of(HUMAN).len(),
        zombies_left: sim.units_of(PlayerId::AI).len(),
        soldier_deaths: tally.soldier_deaths,
        zombie_deaths: tally.zombie_deaths,
        acquisitions: tally.acquisitions,
        retaliations: tally.retaliations,
        damage_dealt: tally.damage_dealt,
        first_death_tick: tally.first_death_tick,
        outcome: outcome_of(&sim),
    };

    tracing::info!(
        scenario = %summary.scenario,
        seed,
        ticks = summary.ticks,
        soldiers_left = summary.soldiers_left,
        zombies_left = summary.zombies_left,
        outcome = ?summary.outcome,
        "run finished"
    );

    Ok(RunOutcome {
        summary,
        simulation: sim,
    })
}

fn outcome_of(sim: &Simulation) -> Outcome {
    if sim.units_of(PlayerId::AI).is_empty() {
        Outcome::HumansWin
    } else if sim.units_of(HUMAN).is_empty() {
        Outcome::ZombiesWin
    } else {
        Outcome::Unresolved
    }
}

/// Report from repeating one seed several times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Seed that was repeated.
    pub seed: u64,
    /// Ticks per run.
    pub ticks: u64,
    /// Final hash of every run.
    pub hashes: Vec<String>,
    /// Whether every run matched and the snapshot round-trip held.
    pub deterministic: bool,
}

/// Run the same seed `runs` times and compare final hashes. The last run
/// is also snapshotted and restored to check the hash survives.
pub fn verify_runs(
    scenario: &Scenario,
    seed: u64,
    ticks: u64,
    runs: u32,
) -> Result<VerifyReport> {
    let mut hashes = Vec::with_capacity(runs as usize);
    let mut last = None;
    for _ in 0..runs.max(1) {
        let outcome = run_scenario(scenario, seed, ticks, false)?;
        hashes.push(outcome.summary.state_hash.clone());
        last = Some(outcome.simulation);
    }

    let mut deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if let Some(sim) = last {
        let restored = Simulation::deserialize(&sim.serialize()?)?;
        if restored.state_hash() != sim.state_hash() {
            tracing::warn!(seed, "snapshot round-trip changed the state hash");
            deterministic = false;
        }
    }

    Ok(VerifyReport {
        seed,
        ticks,
        hashes,
        deterministic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_counts_ticks_and_units() {
        let outcome = run_scenario(&Scenario::demo(), 1, 120, false).unwrap();
        let summary = outcome.summary;
        assert_eq!(summary.ticks, 120);
        assert_eq!(summary.soldiers_left + summary.soldier_deaths, 5);
        assert_eq!(summary.zombies_left + summary.zombie_deaths, 100);
        assert_eq!(summary.state_hash.len(), 16);
    }

    #[test]
    fn test_arena_produces_combat() {
        let summary = run_scenario(&Scenario::arena(), 4, 1800, false)
            .unwrap()
            .summary;
        assert!(summary.acquisitions > 0);
        assert!(summary.damage_dealt > 0);
    }

    #[test]
    fn test_stop_when_decided() {
        let mut scenario = Scenario::arena();
        scenario.zombies = 0;
        let summary = run_scenario(&scenario, 0, 500, true).unwrap().summary;
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.outcome, Outcome::HumansWin);
    }

    #[test]
    fn test_verify_runs_match() {
        let report = verify_runs(&Scenario::arena(), 8, 300, 3).unwrap();
        assert_eq!(report.hashes.len(), 3);
        assert!(report.deterministic);
    }
}
