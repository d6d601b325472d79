//! Agents: the rule-driven robot and the reflex monster

pub mod monster;
pub mod robot;
pub mod rules;
pub mod sensors;

pub use monster::{MonsterAction, MonsterAgent};
pub use robot::{MemoryEntry, RobotAgent, RobotMemory};
pub use rules::{decide, describe, evaluate_rules, Decision, Priority, RobotAction, Rule, RULE_TABLE};
pub use sensors::{sense, Percept};
