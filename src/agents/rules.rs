//! Robot decision hierarchy
//!
//! Rules are priority-ordered; the first rule whose condition holds for
//! the percept decides the action. Evaluation is a pure function of the
//! percept, so the same percept always yields the same decision.

use serde::{Deserialize, Serialize};

use crate::agents::sensors::Percept;
use crate::core::types::Direction;

/// Rule priorities, P0 highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Priority {
    /// P0: monster in own cell
    MonsterInCell = 0,
    /// P1: blocked ahead
    WallAhead = 1,
    /// P2: another robot ahead
    RobotAhead = 2,
    /// P3: monster adjacent (not behind)
    MonsterSighted = 3,
    /// P4: nothing sensed
    Explore = 4,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::MonsterInCell,
        Priority::WallAhead,
        Priority::RobotAhead,
        Priority::MonsterSighted,
        Priority::Explore,
    ];

    pub fn level(self) -> usize {
        self as usize
    }
}

/// Effector requested by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RobotAction {
    /// Destroy every monster in the own cell, void the cell, self-destruct
    Vacuumator,
    /// Turn to face `to`
    Reorient { to: Direction },
    /// Keep position and orientation this tick
    Hold,
    /// Propulsor: advance one cell forward
    Advance,
}

impl RobotAction {
    /// Action kind without payload, for loop tracking
    pub fn kind(&self) -> &'static str {
        match self {
            RobotAction::Vacuumator => "vacuumator",
            RobotAction::Reorient { .. } => "reorient",
            RobotAction::Hold => "hold",
            RobotAction::Advance => "advance",
        }
    }
}

/// Outcome of rule evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub priority: Priority,
    pub action: RobotAction,
}

/// A single (precondition, action) pair
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub priority: Priority,
    pub description: &'static str,
    pub condition: fn(&Percept) -> bool,
    pub action: fn(&Percept) -> RobotAction,
}

/// The robot rule table, highest priority first
pub const RULE_TABLE: [Rule; 5] = [
    Rule {
        priority: Priority::MonsterInCell,
        description: "Energómetro fired: destroy monster and self",
        condition: |p| p.monster_here,
        action: |_| RobotAction::Vacuumator,
    },
    Rule {
        priority: Priority::WallAhead,
        description: "Vacuscopio fired: turn away from the wall",
        condition: |p| p.blocked_ahead,
        action: |p| RobotAction::Reorient {
            to: p.orientation.next_in_cycle(),
        },
    },
    Rule {
        priority: Priority::RobotAhead,
        description: "Roboscanner fired: higher id yields",
        condition: |p| p.robot_ahead.is_some(),
        action: yield_to_robot,
    },
    Rule {
        priority: Priority::MonsterSighted,
        description: "Monstroscopio fired: align with the monster",
        condition: |p| !p.monsters_nearby.is_empty(),
        action: align_with_monster,
    },
    Rule {
        priority: Priority::Explore,
        description: "Nothing sensed: advance",
        condition: |_| true,
        action: |_| RobotAction::Advance,
    },
];

/// First matching rule in `rules`
pub fn evaluate_rules(rules: &[Rule], percept: &Percept) -> Option<Decision> {
    rules
        .iter()
        .find(|rule| (rule.condition)(percept))
        .map(|rule| Decision {
            priority: rule.priority,
            action: (rule.action)(percept),
        })
}

/// Evaluate the standard robot rule table
pub fn decide(percept: &Percept) -> Decision {
    evaluate_rules(&RULE_TABLE, percept).unwrap_or(Decision {
        priority: Priority::Explore,
        action: RobotAction::Advance,
    })
}

/// Human-readable description of the rule at `priority`
pub fn describe(priority: Priority) -> &'static str {
    RULE_TABLE
        .iter()
        .find(|rule| rule.priority == priority)
        .map(|rule| rule.description)
        .unwrap_or("unlisted rule")
}

/// Lower id holds, higher id turns aside
fn yield_to_robot(percept: &Percept) -> RobotAction {
    match percept.robot_ahead {
        Some(other) if other < percept.robot => RobotAction::Reorient {
            to: percept.orientation.next_in_cycle(),
        },
        _ => RobotAction::Hold,
    }
}

/// Prefer the current heading when a monster is ahead, else the
/// lowest-index detected direction. Already facing it means advancing
/// onto the monster's cell.
fn align_with_monster(percept: &Percept) -> RobotAction {
    let target = if percept.monsters_nearby.contains(percept.orientation) {
        percept.orientation
    } else {
        match percept.monsters_nearby.first() {
            Some(d) => d,
            None => return RobotAction::Advance,
        }
    };

    if target == percept.orientation {
        RobotAction::Advance
    } else {
        RobotAction::Reorient { to: target }
    }
}
