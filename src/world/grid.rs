//! Dense cubic cell grid
//!
//! Cells are stored flat, indexed by `(x * n + y) * n + z`, so the
//! storage order matches the generation order (x-major, then y, then z).
//! Out-of-bounds reads return `Void`, so the world edge behaves like any
//! other wall. Out-of-bounds writes are errors.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agents::monster::MonsterAgent;
use crate::agents::robot::RobotAgent;
use crate::core::config::check_probability;
use crate::core::error::{Result, SimError};
use crate::core::types::{Coord3, MonsterId, RobotId};

/// State of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CellState {
    /// Transitable
    Free,
    /// Blocked; also what every out-of-bounds coordinate reads as
    #[default]
    Void,
}

/// Agent found by an occupancy query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentRef {
    Robot(RobotId),
    Monster(MonsterId),
}

/// The N×N×N world with a permanently Void outer shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldGrid {
    size: u32,
    cells: Vec<CellState>,
}

impl WorldGrid {
    /// Generate a grid from `(n, p_free, seed)`
    ///
    /// Shell cells are forced Void without consuming random draws; each
    /// interior cell takes one draw and is Free when it falls below
    /// `p_free`. Identical arguments give identical grids.
    pub fn initialize(n: u32, p_free: f64, seed: u64) -> Result<Self> {
        if n < 3 {
            return Err(SimError::Configuration(format!(
                "grid size ({}) must be at least 3",
                n
            )));
        }
        check_probability("free_probability", p_free)?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let side = n as usize;
        let mut cells = Vec::with_capacity(side * side * side);

        for x in 0..n as i32 {
            for y in 0..n as i32 {
                for z in 0..n as i32 {
                    let coord = Coord3::new(x, y, z);
                    let state = if is_shell(coord, n) {
                        CellState::Void
                    } else if rng.gen::<f64>() < p_free {
                        CellState::Free
                    } else {
                        CellState::Void
                    };
                    cells.push(state);
                }
            }
        }

        let grid = Self { size: n, cells };
        tracing::debug!(
            "Generated {}x{}x{} grid with {} free cells",
            n,
            n,
            n,
            grid.count_free()
        );
        Ok(grid)
    }

    /// Cells per axis
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Flat cell storage in `(x, y, z)` order
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub fn in_bounds(&self, coord: Coord3) -> bool {
        let n = self.size as i32;
        (0..n).contains(&coord.x) && (0..n).contains(&coord.y) && (0..n).contains(&coord.z)
    }

    /// True if any coordinate sits on the outer face of the cube
    pub fn is_shell(&self, coord: Coord3) -> bool {
        is_shell(coord, self.size)
    }

    fn index(&self, coord: Coord3) -> Option<usize> {
        if self.in_bounds(coord) {
            let n = self.size as usize;
            Some((coord.x as usize * n + coord.y as usize) * n + coord.z as usize)
        } else {
            None
        }
    }

    /// Read a cell. Returns `Void` for out-of-bounds coordinates.
    pub fn state(&self, coord: Coord3) -> CellState {
        self.index(coord)
            .map(|i| self.cells[i])
            .unwrap_or(CellState::Void)
    }

    pub fn is_free(&self, coord: Coord3) -> bool {
        self.state(coord) == CellState::Free
    }

    /// Turn a cell Void. No-op when it already is.
    pub fn set_void(&mut self, coord: Coord3) -> Result<()> {
        let i = self.index(coord).ok_or(SimError::OutOfBounds {
            coord,
            size: self.size,
        })?;
        self.cells[i] = CellState::Void;
        Ok(())
    }

    /// All Free cells in storage order
    pub fn free_cells(&self) -> Vec<Coord3> {
        let n = self.size as i32;
        let mut free = Vec::new();
        for x in 1..n - 1 {
            for y in 1..n - 1 {
                for z in 1..n - 1 {
                    let coord = Coord3::new(x, y, z);
                    if self.is_free(coord) {
                        free.push(coord);
                    }
                }
            }
        }
        free
    }

    pub fn count_free(&self) -> usize {
        self.cells.iter().filter(|c| **c == CellState::Free).count()
    }

    /// Which live agent stands on `coord`, derived from the registries
    ///
    /// Robots take precedence when a robot and a monster share the cell.
    pub fn occupant_at(
        &self,
        coord: Coord3,
        robots: &[RobotAgent],
        monsters: &[MonsterAgent],
    ) -> Option<AgentRef> {
        if !self.in_bounds(coord) {
            return None;
        }
        robots
            .iter()
            .find(|r| r.alive && r.position == coord)
            .map(|r| AgentRef::Robot(r.id))
            .or_else(|| {
                monsters
                    .iter()
                    .find(|m| m.alive && m.position == coord)
                    .map(|m| AgentRef::Monster(m.id))
            })
    }
}

fn is_shell(coord: Coord3, n: u32) -> bool {
    let last = n as i32 - 1;
    [coord.x, coord.y, coord.z]
        .iter()
        .any(|&c| c == 0 || c == last)
}
