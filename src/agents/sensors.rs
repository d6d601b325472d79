//! Robot sensor layer
//!
//! Each sensor is a pure read of the world and the live registries. The
//! engine calls `sense` right before a robot decides, so a robot sees
//! every move committed earlier in the same tick.
//!
//! | Sensor        | Reads                                              |
//! |---------------|----------------------------------------------------|
//! | Giroscopio    | own orientation                                    |
//! | Monstroscopio | live monsters in the five non-rear adjacent cells |
//! | Energómetro   | a live monster in the robot's own cell             |
//! | Vacuscopio    | the cell ahead is not Free                         |
//! | Roboscanner   | another live robot in the cell ahead               |

use serde::{Deserialize, Serialize};

use crate::agents::monster::MonsterAgent;
use crate::agents::robot::RobotAgent;
use crate::core::types::{Coord3, Direction, DirectionSet, RobotId};
use crate::world::grid::WorldGrid;

/// Everything a robot knows at decision time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percept {
    pub robot: RobotId,
    pub position: Coord3,
    /// Giroscopio
    pub orientation: Direction,
    /// Monstroscopio
    pub monsters_nearby: DirectionSet,
    /// Energómetro
    pub monster_here: bool,
    /// Vacuscopio
    pub blocked_ahead: bool,
    /// Roboscanner, carrying the id of the robot ahead
    pub robot_ahead: Option<RobotId>,
}

impl Percept {
    /// Cell directly in front of the robot
    pub fn ahead(&self) -> Coord3 {
        self.position.step(self.orientation)
    }
}

/// Read all five sensors for `robot`
pub fn sense(
    robot: &RobotAgent,
    grid: &WorldGrid,
    robots: &[RobotAgent],
    monsters: &[MonsterAgent],
) -> Percept {
    Percept {
        robot: robot.id,
        position: robot.position,
        orientation: gyroscope(robot),
        monsters_nearby: monstroscope(robot.position, robot.orientation, monsters),
        monster_here: energometer(robot.position, monsters),
        blocked_ahead: vacuscope(robot.position, robot.orientation, grid),
        robot_ahead: roboscanner(robot.id, robot.position, robot.orientation, robots),
    }
}

pub fn gyroscope(robot: &RobotAgent) -> Direction {
    robot.orientation
}

/// Directions (all but the rear) whose adjacent cell holds a live monster
pub fn monstroscope(
    position: Coord3,
    orientation: Direction,
    monsters: &[MonsterAgent],
) -> DirectionSet {
    let rear = orientation.opposite();
    Direction::ALL
        .into_iter()
        .filter(|&d| d != rear)
        .filter(|&d| monster_at(position.step(d), monsters))
        .collect()
}

pub fn energometer(position: Coord3, monsters: &[MonsterAgent]) -> bool {
    monster_at(position, monsters)
}

/// True when the cell ahead is Void or outside the grid
pub fn vacuscope(position: Coord3, orientation: Direction, grid: &WorldGrid) -> bool {
    !grid.is_free(position.step(orientation))
}

pub fn roboscanner(
    id: RobotId,
    position: Coord3,
    orientation: Direction,
    robots: &[RobotAgent],
) -> Option<RobotId> {
    let ahead = position.step(orientation);
    robots
        .iter()
        .find(|r| r.alive && r.id != id && r.position == ahead)
        .map(|r| r.id)
}

fn monster_at(coord: Coord3, monsters: &[MonsterAgent]) -> bool {
    monsters.iter().any(|m| m.alive && m.position == coord)
}
