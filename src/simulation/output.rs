//! Simulation output and serialization

use serde::{Deserialize, Serialize};

use crate::agents::rules::Priority;
use crate::core::error::Result;
use crate::core::types::Tick;
use crate::simulation::events::EventLog;
use crate::world::snapshot::WorldSnapshot;

/// Counters accumulated while the engine runs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub ticks_simulated: u64,
    pub robots_at_start: u32,
    pub robots_remaining: u32,
    pub monsters_at_start: u32,
    pub monsters_remaining: u32,

    // Robot effectors
    pub advances: u64,
    pub collisions: u64,
    pub rotations: u64,
    pub holds: u64,
    pub vacuumator_uses: u64,
    pub monsters_destroyed: u64,

    // Monster activations
    pub monster_moves: u64,
    pub monster_blocked: u64,

    pub loops_detected: u64,
    /// Indexed by `Priority::level()`
    pub rules_fired: [u64; 5],
    /// Robot collisions logged before any monster was destroyed
    pub collisions_before_first_hunt: u64,
    pub first_hunt_tick: Option<Tick>,
}

impl SimulationStats {
    pub fn record_rule(&mut self, priority: Priority) {
        self.rules_fired[priority.level()] += 1;
    }

    pub fn rule_count(&self, priority: Priority) -> u64 {
        self.rules_fired[priority.level()]
    }

    pub fn record_collision(&mut self) {
        self.collisions += 1;
        if self.first_hunt_tick.is_none() {
            self.collisions_before_first_hunt += 1;
        }
    }

    pub fn record_hunt(&mut self, tick: Tick, destroyed: usize) {
        self.vacuumator_uses += 1;
        self.monsters_destroyed += destroyed as u64;
        if destroyed > 0 && self.first_hunt_tick.is_none() {
            self.first_hunt_tick = Some(tick);
        }
    }
}

/// Complete simulation output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub final_world: WorldSnapshot,
    pub log: EventLog,
    pub statistics: SimulationStats,
}

impl SimulationOutput {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn summary(&self) -> String {
        let s = &self.statistics;
        format!(
            "Simulated {} ticks on a {}^3 grid\n\
             Robots: {}/{} remain, Monsters: {}/{} remain\n\
             {} advances, {} turns, {} holds, {} collisions, {} loops flagged\n\
             {} Vacuumator uses destroyed {} monsters",
            s.ticks_simulated,
            self.final_world.size,
            s.robots_remaining,
            s.robots_at_start,
            s.monsters_remaining,
            s.monsters_at_start,
            s.advances,
            s.rotations,
            s.holds,
            s.collisions,
            s.loops_detected,
            s.vacuumator_uses,
            s.monsters_destroyed,
        )
    }
}
