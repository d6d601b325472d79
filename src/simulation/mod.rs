//! Discrete-time engine, event log and run output

pub mod engine;
pub mod events;
pub mod output;

pub use engine::{EnginePhase, SimulationEngine};
pub use events::{ActionTaken, AgentEvent, EventLog, Outcome, TickSummary};
pub use output::{SimulationOutput, SimulationStats};
