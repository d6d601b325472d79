//! Rational robot agent: sensors, memory, rule table, effectors

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::agents::rules::{self, Decision, RobotAction};
use crate::agents::sensors::Percept;
use crate::core::error::{Result, SimError};
use crate::core::types::{Coord3, Direction, RobotId, Tick};

/// One remembered tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub tick: Tick,
    pub position: Coord3,
    pub orientation: Direction,
    pub percept: Percept,
    pub action: RobotAction,
}

/// Per-robot memory, owned exclusively by its robot
#[derive(Debug, Clone)]
pub struct RobotMemory {
    capacity: usize,
    history: VecDeque<MemoryEntry>,
    /// Void cells this robot has bumped into
    pub known_walls: AHashSet<Coord3>,
    /// Position before the last successful advance
    pub previous_position: Coord3,
    /// Consecutive ticks without moving while repeating the same action kind
    pub stationary_streak: u32,
}

impl RobotMemory {
    /// History holds at least one entry; loop tracking compares against it
    pub fn new(capacity: usize, start: Coord3) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            history: VecDeque::with_capacity(capacity.min(256)),
            known_walls: AHashSet::new(),
            previous_position: start,
            stationary_streak: 0,
        }
    }

    /// Append an entry, dropping the oldest past capacity
    pub fn record(&mut self, entry: MemoryEntry) {
        while self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(entry);
    }

    pub fn history(&self) -> impl Iterator<Item = &MemoryEntry> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn last(&self) -> Option<&MemoryEntry> {
        self.history.back()
    }

    pub fn knows_wall(&self, coord: Coord3) -> bool {
        self.known_walls.contains(&coord)
    }
}

/// Memory-bearing robot
#[derive(Debug, Clone)]
pub struct RobotAgent {
    pub id: RobotId,
    pub position: Coord3,
    pub orientation: Direction,
    pub alive: bool,
    pub memory: RobotMemory,
}

impl RobotAgent {
    pub fn new(id: RobotId, position: Coord3, orientation: Direction, memory_capacity: usize) -> Self {
        Self {
            id,
            position,
            orientation,
            alive: true,
            memory: RobotMemory::new(memory_capacity, position),
        }
    }

    /// Run the rule hierarchy against a percept
    ///
    /// Dead robots never decide; the engine filters them before dispatch.
    pub fn decide(&self, percept: &Percept) -> Result<Decision> {
        if !self.alive {
            return Err(SimError::InvalidState(format!(
                "robot {} is destroyed and cannot act",
                self.id.0
            )));
        }
        Ok(rules::decide(percept))
    }

    /// Reorientador
    pub fn turn_to(&mut self, direction: Direction) {
        self.orientation = direction;
    }

    /// Propulsor commit: move to `target` and remember where we came from
    pub fn move_to(&mut self, target: Coord3) {
        self.memory.previous_position = self.position;
        self.position = target;
    }

    /// Store a tick in memory and update loop tracking
    ///
    /// `position_before` is where the robot stood when it sensed. Returns
    /// true when the stationary same-action streak has exceeded
    /// `loop_threshold`.
    pub fn remember(
        &mut self,
        tick: Tick,
        percept: &Percept,
        action: RobotAction,
        position_before: Coord3,
        loop_threshold: u32,
    ) -> bool {
        if percept.blocked_ahead {
            self.memory.known_walls.insert(percept.ahead());
        }

        let repeated = self
            .memory
            .last()
            .is_some_and(|prev| prev.action.kind() == action.kind());
        if repeated && self.position == position_before {
            self.memory.stationary_streak += 1;
        } else {
            self.memory.stationary_streak = 0;
        }

        self.memory.record(MemoryEntry {
            tick,
            position: self.position,
            orientation: self.orientation,
            percept: *percept,
            action,
        });

        self.memory.stationary_streak > loop_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DirectionSet;

    fn percept_for(robot: &RobotAgent) -> Percept {
        Percept {
            robot: robot.id,
            position: robot.position,
            orientation: robot.orientation,
            monsters_nearby: DirectionSet::empty(),
            monster_here: false,
            blocked_ahead: false,
            robot_ahead: None,
        }
    }

    #[test]
    fn test_dead_robot_cannot_decide() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::PosX, 4);
        let p = percept_for(&robot);
        assert!(robot.decide(&p).is_ok());

        robot.alive = false;
        assert!(matches!(robot.decide(&p), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn test_memory_is_bounded() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::PosX, 3);
        for tick in 0..10 {
            let p = percept_for(&robot);
            robot.remember(tick, &p, RobotAction::Hold, robot.position, 100);
        }
        assert_eq!(robot.memory.len(), 3);
        let ticks: Vec<_> = robot.memory.history().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![7, 8, 9]);
    }

    #[test]
    fn test_zero_capacity_memory_stays_bounded() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::PosX, 0);
        for tick in 0..10 {
            let p = percept_for(&robot);
            robot.remember(tick, &p, RobotAction::Hold, robot.position, 100);
            assert_eq!(robot.memory.len(), 1);
        }
        assert_eq!(robot.memory.last().map(|e| e.tick), Some(9));
        assert_eq!(robot.memory.stationary_streak, 9);
    }

    #[test]
    fn test_blocked_percept_records_wall() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::NegX, 4);
        let p = Percept {
            blocked_ahead: true,
            ..percept_for(&robot)
        };
        robot.remember(0, &p, RobotAction::Reorient { to: Direction::NegY }, robot.position, 3);
        assert!(robot.memory.knows_wall(Coord3::new(0, 1, 1)));
    }

    #[test]
    fn test_move_tracks_previous_position() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::PosX, 4);
        robot.move_to(Coord3::new(2, 1, 1));
        assert_eq!(robot.memory.previous_position, Coord3::new(1, 1, 1));
        assert_eq!(robot.position, Coord3::new(2, 1, 1));
    }

    #[test]
    fn test_loop_flag_after_threshold() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(2, 2, 2), Direction::PosX, 16);
        let mut flags = Vec::new();
        for tick in 0..6 {
            let p = percept_for(&robot);
            let next = robot.orientation.next_in_cycle();
            robot.turn_to(next);
            flags.push(robot.remember(tick, &p, RobotAction::Reorient { to: next }, p.position, 2));
        }
        // streak: 0, 1, 2, 3, 4, 5 -> exceeds 2 from the fourth tick
        assert_eq!(flags, vec![false, false, false, true, true, true]);
    }

    #[test]
    fn test_movement_resets_loop_streak() {
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(2, 2, 2), Direction::PosX, 16);
        for tick in 0..3 {
            let p = percept_for(&robot);
            robot.remember(tick, &p, RobotAction::Hold, p.position, 10);
        }
        assert_eq!(robot.memory.stationary_streak, 2);

        let p = percept_for(&robot);
        robot.move_to(Coord3::new(3, 2, 2));
        robot.remember(3, &p, RobotAction::Advance, p.position, 10);
        assert_eq!(robot.memory.stationary_streak, 0);
    }
}
