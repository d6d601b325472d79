//! Read-only world view handed to visualization and logging collaborators

use serde::{Deserialize, Serialize};

use crate::agents::monster::MonsterAgent;
use crate::agents::robot::RobotAgent;
use crate::core::types::{Coord3, Direction, MonsterId, RobotId, Tick};
use crate::world::grid::{CellState, WorldGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotView {
    pub id: RobotId,
    pub position: Coord3,
    pub orientation: Direction,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterView {
    pub id: MonsterId,
    pub position: Coord3,
    pub alive: bool,
}

/// Cell states plus every agent, dead ones included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: Tick,
    pub size: u32,
    /// Flat `(x, y, z)` order, same layout as `WorldGrid::cells`
    pub cells: Vec<CellState>,
    pub robots: Vec<RobotView>,
    pub monsters: Vec<MonsterView>,
}

impl WorldSnapshot {
    pub fn capture(
        tick: Tick,
        grid: &WorldGrid,
        robots: &[RobotAgent],
        monsters: &[MonsterAgent],
    ) -> Self {
        Self {
            tick,
            size: grid.size(),
            cells: grid.cells().to_vec(),
            robots: robots
                .iter()
                .map(|r| RobotView {
                    id: r.id,
                    position: r.position,
                    orientation: r.orientation,
                    alive: r.alive,
                })
                .collect(),
            monsters: monsters
                .iter()
                .map(|m| MonsterView {
                    id: m.id,
                    position: m.position,
                    alive: m.alive,
                })
                .collect(),
        }
    }

    /// Cell state at `coord`; `Void` outside the grid or past the stored cells
    pub fn cell(&self, coord: Coord3) -> CellState {
        let n = self.size as i32;
        let inside = [coord.x, coord.y, coord.z].iter().all(|c| (0..n).contains(c));
        if !inside {
            return CellState::Void;
        }
        let n = self.size as usize;
        self.cells
            .get((coord.x as usize * n + coord.y as usize) * n + coord.z as usize)
            .copied()
            .unwrap_or(CellState::Void)
    }

    pub fn live_robots(&self) -> impl Iterator<Item = &RobotView> {
        self.robots.iter().filter(|r| r.alive)
    }

    pub fn live_monsters(&self) -> impl Iterator<Item = &MonsterView> {
        self.monsters.iter().filter(|m| m.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_cell_matches_grid() {
        let mut grid = WorldGrid::initialize(6, 0.5, 77).unwrap();
        grid.set_void(Coord3::new(2, 3, 4)).unwrap();
        let snap = WorldSnapshot::capture(0, &grid, &[], &[]);

        for x in -1..7 {
            for y in -1..7 {
                for z in -1..7 {
                    let c = Coord3::new(x, y, z);
                    assert_eq!(snap.cell(c), grid.state(c));
                }
            }
        }
    }

    #[test]
    fn test_snapshot_keeps_dead_agents() {
        let grid = WorldGrid::initialize(5, 1.0, 0).unwrap();
        let mut robot = RobotAgent::new(RobotId(0), Coord3::new(1, 1, 1), Direction::PosZ, 4);
        robot.alive = false;
        let monster = MonsterAgent::new(MonsterId(0), Coord3::new(2, 2, 2), 3, 0.7).unwrap();

        let snap = WorldSnapshot::capture(3, &grid, &[robot], &[monster]);
        assert_eq!(snap.robots.len(), 1);
        assert_eq!(snap.live_robots().count(), 0);
        assert_eq!(snap.live_monsters().count(), 1);
        assert_eq!(snap.tick, 3);
    }

    #[test]
    fn test_truncated_snapshot_reads_missing_cells_as_void() {
        let grid = WorldGrid::initialize(5, 1.0, 0).unwrap();
        let mut snap = WorldSnapshot::capture(0, &grid, &[], &[]);
        assert_eq!(snap.cell(Coord3::new(3, 3, 3)), CellState::Free);

        snap.cells.truncate(10);
        let json = serde_json::to_string(&snap).unwrap();
        let restored: WorldSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.cell(Coord3::new(3, 3, 3)), CellState::Void);
        assert_eq!(restored.cell(Coord3::new(0, 0, 2)), CellState::Void);
    }
}
