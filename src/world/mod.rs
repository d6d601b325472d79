//! The cubic world: cell grid and read-only snapshots

pub mod grid;
pub mod snapshot;

pub use grid::{AgentRef, CellState, WorldGrid};
pub use snapshot::{MonsterView, RobotView, WorldSnapshot};
