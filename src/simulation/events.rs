//! Per-tick event log
//!
//! Append-only. One `AgentEvent` per live agent per tick, monsters first
//! then robots, each group in ascending id order.

use serde::{Deserialize, Serialize};

use crate::agents::monster::MonsterAction;
use crate::agents::rules::{Priority, RobotAction};
use crate::agents::sensors::Percept;
use crate::core::types::{AgentKind, Coord3, Direction, MonsterId, Tick};

/// Action an agent committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionTaken {
    Robot(RobotAction),
    Monster(MonsterAction),
}

/// What the action did to the world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Moved { from: Coord3, to: Coord3 },
    Turned { from: Direction, to: Direction },
    Held,
    /// Target cell was Void or held by an agent of the same kind
    Blocked { target: Coord3 },
    /// Vacuumator fired: the robot and every listed monster are gone
    Destroyed { cell: Coord3, monsters: Vec<MonsterId> },
    NoOp,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub tick: Tick,
    pub agent_id: u32,
    pub agent_kind: AgentKind,
    /// Robots only; monsters do not sense
    pub percept: Option<Percept>,
    /// Robots only
    pub rule: Option<Priority>,
    pub action: ActionTaken,
    pub result: Outcome,
    /// Diagnostic flag; never changes a decision
    pub loop_detected: bool,
}

/// Everything that happened during one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub events: Vec<AgentEvent>,
    pub robots_alive: usize,
    pub monsters_alive: usize,
}

impl TickSummary {
    pub fn loops(&self) -> impl Iterator<Item = &AgentEvent> {
        self.events.iter().filter(|e| e.loop_detected)
    }
}

/// The complete run log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    ticks: Vec<TickSummary>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, summary: TickSummary) {
        self.ticks.push(summary);
    }

    pub fn ticks(&self) -> &[TickSummary] {
        &self.ticks
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Every event in commit order
    pub fn events(&self) -> impl Iterator<Item = &AgentEvent> {
        self.ticks.iter().flat_map(|t| t.events.iter())
    }

    pub fn events_for_tick(&self, tick: Tick) -> impl Iterator<Item = &AgentEvent> {
        self.events().filter(move |e| e.tick == tick)
    }

    pub fn events_for_agent(&self, kind: AgentKind, id: u32) -> impl Iterator<Item = &AgentEvent> {
        self.events()
            .filter(move |e| e.agent_kind == kind && e.agent_id == id)
    }
}
