//! Reflex monster agent
//!
//! No memory between activations. Every K ticks a monster rolls once
//! against its move probability, then picks one of the six directions
//! uniformly. A blocked pick wastes the activation; there is no retry.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::check_probability;
use crate::core::error::{Result, SimError};
use crate::core::types::{Coord3, Direction, MonsterId, Tick};
use crate::world::grid::WorldGrid;

/// What an activation produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterAction {
    /// Not an activation tick
    Dormant,
    /// Activated, but the move roll failed
    Idle,
    /// Chosen direction was Void or held by another monster
    Blocked { direction: Direction },
    Move { direction: Direction, to: Coord3 },
}

impl MonsterAction {
    /// True on ticks where the monster actually tried a direction
    pub fn attempted(&self) -> bool {
        matches!(self, MonsterAction::Blocked { .. } | MonsterAction::Move { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterAgent {
    pub id: MonsterId,
    pub position: Coord3,
    pub alive: bool,
    /// Activation period K
    pub period: u64,
    pub move_probability: f64,
}

impl MonsterAgent {
    /// Fails on a zero period or a probability outside [0, 1]
    pub fn new(id: MonsterId, position: Coord3, period: u64, move_probability: f64) -> Result<Self> {
        if period == 0 {
            return Err(SimError::Configuration(format!(
                "monster {} needs an activation period of at least 1",
                id.0
            )));
        }
        check_probability("monster_move_probability", move_probability)?;

        Ok(Self {
            id,
            position,
            alive: true,
            period,
            move_probability,
        })
    }

    pub fn is_active_tick(&self, tick: Tick) -> bool {
        tick % self.period == 0
    }

    /// Decide this tick's action without committing it
    ///
    /// Draws nothing on dormant ticks, one value on a failed roll, and two
    /// values (roll, direction) otherwise.
    pub fn maybe_act<R: Rng>(
        &self,
        tick: Tick,
        rng: &mut R,
        grid: &WorldGrid,
        monsters: &[MonsterAgent],
    ) -> MonsterAction {
        if !self.is_active_tick(tick) {
            return MonsterAction::Dormant;
        }

        let roll: f64 = rng.gen();
        if roll >= self.move_probability {
            return MonsterAction::Idle;
        }

        let direction = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
        let target = self.position.step(direction);
        let taken = monsters
            .iter()
            .any(|m| m.alive && m.id != self.id && m.position == target);

        if grid.is_free(target) && !taken {
            MonsterAction::Move {
                direction,
                to: target,
            }
        } else {
            MonsterAction::Blocked { direction }
        }
    }
}
