//! Simulation engine: tick ordering, effect application, event log
//!
//! Each tick: monsters (ascending id) -> robots (ascending id) -> clock
//!
//! Commit is sequential, not snapshot-isolated. A monster's move lands
//! before the next monster decides, and every robot senses the world as
//! left by all agents that acted before it in the same tick. Registries
//! are dense arenas indexed by id; destroyed agents keep their slot with
//! `alive == false` and every live query skips them.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agents::monster::{MonsterAction, MonsterAgent};
use crate::agents::robot::RobotAgent;
use crate::agents::rules::{self, RobotAction};
use crate::agents::sensors::sense;
use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{AgentKind, Coord3, Direction, MonsterId, RobotId, Tick};
use crate::simulation::events::{ActionTaken, AgentEvent, EventLog, Outcome, TickSummary};
use crate::simulation::output::{SimulationOutput, SimulationStats};
use crate::world::grid::WorldGrid;
use crate::world::snapshot::WorldSnapshot;

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnginePhase {
    #[default]
    Idle,
    Running,
    Finished,
}

pub struct SimulationEngine {
    config: SimulationConfig,
    grid: WorldGrid,
    robots: Vec<RobotAgent>,
    monsters: Vec<MonsterAgent>,
    /// Run stream: placement, orientations, monster activations
    rng: ChaCha8Rng,
    tick: Tick,
    phase: EnginePhase,
    log: EventLog,
    stats: SimulationStats,
}

impl SimulationEngine {
    /// Generate the grid and place agents at random, all from `config.seed`
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let grid = WorldGrid::initialize(config.grid_size, config.free_probability, config.seed)?;
        let mut engine = Self::with_grid(config, grid)?;
        engine.place_agents()?;
        Ok(engine)
    }

    /// Engine over a prepared grid with empty registries
    ///
    /// `grid_size` and `free_probability` in `config` are not used; the
    /// grid is taken as given. Populate with `spawn_robot`/`spawn_monster`.
    pub fn with_grid(config: SimulationConfig, grid: WorldGrid) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1));

        Ok(Self {
            config,
            grid,
            robots: Vec::new(),
            monsters: Vec::new(),
            rng,
            tick: 0,
            phase: EnginePhase::Idle,
            log: EventLog::new(),
            stats: SimulationStats::default(),
        })
    }

    /// Random placement on distinct Free cells per kind
    fn place_agents(&mut self) -> Result<()> {
        let free = self.grid.free_cells();
        let robot_count = self.config.robot_count as usize;
        let monster_count = self.config.monster_count as usize;

        if robot_count > free.len() || monster_count > free.len() {
            return Err(SimError::Configuration(format!(
                "{} robots and {} monsters requested but only {} free cells",
                robot_count,
                monster_count,
                free.len()
            )));
        }

        let robot_cells: Vec<Coord3> = free
            .choose_multiple(&mut self.rng, robot_count)
            .copied()
            .collect();
        let monster_cells: Vec<Coord3> = free
            .choose_multiple(&mut self.rng, monster_count)
            .copied()
            .collect();

        for cell in robot_cells {
            let orientation = Direction::ALL[self.rng.gen_range(0..Direction::ALL.len())];
            self.spawn_robot(cell, orientation)?;
        }
        for cell in monster_cells {
            self.spawn_monster(cell)?;
        }

        Ok(())
    }

    /// Add a robot; ids are assigned in spawn order
    pub fn spawn_robot(&mut self, position: Coord3, orientation: Direction) -> Result<RobotId> {
        self.check_spawn(position)?;
        if self.robots.iter().any(|r| r.alive && r.position == position) {
            return Err(SimError::Configuration(format!(
                "cell {} already holds a robot",
                position
            )));
        }

        let id = RobotId(self.robots.len() as u32);
        self.robots.push(RobotAgent::new(
            id,
            position,
            orientation,
            self.config.memory_capacity,
        ));
        self.stats.robots_at_start += 1;
        Ok(id)
    }

    /// Add a monster with the configured period and move probability
    pub fn spawn_monster(&mut self, position: Coord3) -> Result<MonsterId> {
        self.check_spawn(position)?;
        if self.monsters.iter().any(|m| m.alive && m.position == position) {
            return Err(SimError::Configuration(format!(
                "cell {} already holds a monster",
                position
            )));
        }

        let id = MonsterId(self.monsters.len() as u32);
        self.monsters.push(MonsterAgent::new(
            id,
            position,
            self.config.monster_period,
            self.config.monster_move_probability,
        )?);
        self.stats.monsters_at_start += 1;
        Ok(id)
    }

    fn check_spawn(&self, position: Coord3) -> Result<()> {
        if self.phase != EnginePhase::Idle {
            return Err(SimError::InvalidState(
                "agents can only be placed before the first tick".into(),
            ));
        }
        if !self.grid.in_bounds(position) {
            return Err(SimError::OutOfBounds {
                coord: position,
                size: self.grid.size(),
            });
        }
        if !self.grid.is_free(position) {
            return Err(SimError::Configuration(format!(
                "cell {} is Void",
                position
            )));
        }
        Ok(())
    }

    // ===== LIFECYCLE =====

    /// Leave `Idle`; finishes at once when there is nothing to run
    pub fn start(&mut self) {
        if self.phase != EnginePhase::Idle {
            return;
        }
        self.phase = EnginePhase::Running;
        tracing::info!(
            "Simulation started: {}^3 grid, {} robots, {} monsters, {} ticks max",
            self.grid.size(),
            self.robots.len(),
            self.monsters.len(),
            self.config.ticks
        );
        self.check_termination();
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, EnginePhase::Finished)
    }

    fn check_termination(&mut self) {
        if self.phase != EnginePhase::Running {
            return;
        }
        let robots_alive = self.live_robot_count();
        if self.tick >= self.config.ticks || robots_alive == 0 {
            self.phase = EnginePhase::Finished;
            tracing::info!(
                "Simulation finished at tick {} ({} robots, {} monsters alive)",
                self.tick,
                robots_alive,
                self.live_monster_count()
            );
        }
    }

    /// Advance exactly one tick
    pub fn step(&mut self) -> Result<TickSummary> {
        self.start();
        if self.is_finished() {
            return Err(SimError::InvalidState(format!(
                "simulation already finished at tick {}",
                self.tick
            )));
        }

        let tick = self.tick;
        let mut events = Vec::new();

        // ===== PHASE 1: MONSTERS =====
        for i in 0..self.monsters.len() {
            if !self.monsters[i].alive {
                continue;
            }
            events.push(self.act_monster(i, tick));
        }

        // ===== PHASE 2: ROBOTS =====
        for i in 0..self.robots.len() {
            if !self.robots[i].alive {
                continue;
            }
            events.push(self.act_robot(i, tick)?);
        }

        // ===== PHASE 3: CLOCK =====
        self.tick += 1;
        self.stats.ticks_simulated = self.tick;

        let summary = TickSummary {
            tick,
            events,
            robots_alive: self.live_robot_count(),
            monsters_alive: self.live_monster_count(),
        };
        self.log.push(summary.clone());
        self.check_termination();

        Ok(summary)
    }

    /// Step until `max_ticks` ticks have run or the engine finishes
    ///
    /// `delay` only paces the loop for an external viewer.
    pub fn run(&mut self, max_ticks: u64, delay: Option<Duration>) -> Result<u64> {
        self.start();
        let mut ran = 0;
        while ran < max_ticks && !self.is_finished() {
            self.step()?;
            ran += 1;
            if let Some(delay) = delay {
                if !self.is_finished() {
                    std::thread::sleep(delay);
                }
            }
        }
        Ok(ran)
    }

    pub fn run_to_end(&mut self, delay: Option<Duration>) -> Result<u64> {
        self.run(u64::MAX, delay)
    }

    // ===== AGENT TURNS =====

    fn act_monster(&mut self, index: usize, tick: Tick) -> AgentEvent {
        let action =
            self.monsters[index].maybe_act(tick, &mut self.rng, &self.grid, &self.monsters);
        let monster = &mut self.monsters[index];

        let result = match action {
            MonsterAction::Move { to, .. } => {
                let from = monster.position;
                monster.position = to;
                self.stats.monster_moves += 1;
                tracing::debug!("Tick {}: monster {} moved {} -> {}", tick, monster.id.0, from, to);
                Outcome::Moved { from, to }
            }
            MonsterAction::Blocked { direction } => {
                self.stats.monster_blocked += 1;
                Outcome::Blocked {
                    target: monster.position.step(direction),
                }
            }
            MonsterAction::Idle => Outcome::NoOp,
            MonsterAction::Dormant => {
                tracing::trace!("Tick {}: monster {} dormant", tick, monster.id.0);
                Outcome::NoOp
            }
        };

        AgentEvent {
            tick,
            agent_id: monster.id.0,
            agent_kind: AgentKind::Monster,
            percept: None,
            rule: None,
            action: ActionTaken::Monster(action),
            result,
            loop_detected: false,
        }
    }

    fn act_robot(&mut self, index: usize, tick: Tick) -> Result<AgentEvent> {
        let percept = sense(&self.robots[index], &self.grid, &self.robots, &self.monsters);
        let decision = self.robots[index].decide(&percept)?;
        self.stats.record_rule(decision.priority);

        let position_before = self.robots[index].position;
        let result = self.apply_robot_action(index, decision.action, tick)?;

        let robot = &mut self.robots[index];
        let loop_detected = robot.remember(
            tick,
            &percept,
            decision.action,
            position_before,
            self.config.loop_threshold,
        );
        if loop_detected {
            self.stats.loops_detected += 1;
            tracing::warn!(
                "Tick {}: robot {} stuck at {} repeating {}",
                tick,
                robot.id.0,
                robot.position,
                decision.action.kind()
            );
        }

        tracing::debug!(
            "Tick {}: robot {} [{:?}: {}] {:?} -> {:?}",
            tick,
            robot.id.0,
            decision.priority,
            rules::describe(decision.priority),
            decision.action,
            result
        );

        Ok(AgentEvent {
            tick,
            agent_id: robot.id.0,
            agent_kind: AgentKind::Robot,
            percept: Some(percept),
            rule: Some(decision.priority),
            action: ActionTaken::Robot(decision.action),
            result,
            loop_detected,
        })
    }

    fn apply_robot_action(&mut self, index: usize, action: RobotAction, tick: Tick) -> Result<Outcome> {
        match action {
            RobotAction::Vacuumator => {
                let cell = self.robots[index].position;
                let mut destroyed = Vec::new();
                for monster in self.monsters.iter_mut() {
                    if monster.alive && monster.position == cell {
                        monster.alive = false;
                        destroyed.push(monster.id);
                    }
                }
                self.grid.set_void(cell)?;
                self.robots[index].alive = false;
                self.stats.record_hunt(tick, destroyed.len());
                tracing::info!(
                    "Tick {}: robot {} fired the Vacuumator at {}, destroying {} monster(s)",
                    tick,
                    self.robots[index].id.0,
                    cell,
                    destroyed.len()
                );
                Ok(Outcome::Destroyed {
                    cell,
                    monsters: destroyed,
                })
            }
            RobotAction::Reorient { to } => {
                let robot = &mut self.robots[index];
                let from = robot.orientation;
                robot.turn_to(to);
                self.stats.rotations += 1;
                Ok(Outcome::Turned { from, to })
            }
            RobotAction::Hold => {
                self.stats.holds += 1;
                Ok(Outcome::Held)
            }
            RobotAction::Advance => {
                let robot = &self.robots[index];
                let from = robot.position;
                let target = from.step(robot.orientation);
                let occupied = self
                    .robots
                    .iter()
                    .any(|r| r.alive && r.id != robot.id && r.position == target);

                if self.grid.is_free(target) && !occupied {
                    self.robots[index].move_to(target);
                    self.stats.advances += 1;
                    Ok(Outcome::Moved { from, to: target })
                } else {
                    self.stats.record_collision();
                    Ok(Outcome::Blocked { target })
                }
            }
        }
    }

    // ===== QUERIES =====

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn grid(&self) -> &WorldGrid {
        &self.grid
    }

    /// Robot registry, destroyed robots included
    pub fn robots(&self) -> &[RobotAgent] {
        &self.robots
    }

    /// Monster registry, destroyed monsters included
    pub fn monsters(&self) -> &[MonsterAgent] {
        &self.monsters
    }

    pub fn robot(&self, id: RobotId) -> Option<&RobotAgent> {
        self.robots.get(id.0 as usize)
    }

    pub fn monster(&self, id: MonsterId) -> Option<&MonsterAgent> {
        self.monsters.get(id.0 as usize)
    }

    pub fn live_robots(&self) -> impl Iterator<Item = &RobotAgent> {
        self.robots.iter().filter(|r| r.alive)
    }

    pub fn live_monsters(&self) -> impl Iterator<Item = &MonsterAgent> {
        self.monsters.iter().filter(|m| m.alive)
    }

    pub fn live_robot_count(&self) -> usize {
        self.live_robots().count()
    }

    pub fn live_monster_count(&self) -> usize {
        self.live_monsters().count()
    }

    pub fn world_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self.tick, &self.grid, &self.robots, &self.monsters)
    }

    pub fn tick_log(&self) -> &EventLog {
        &self.log
    }

    pub fn stats(&self) -> SimulationStats {
        let mut stats = self.stats.clone();
        stats.robots_remaining = self.live_robot_count() as u32;
        stats.monsters_remaining = self.live_monster_count() as u32;
        stats
    }

    /// Snapshot, log and statistics bundled for export
    pub fn output(&self) -> SimulationOutput {
        SimulationOutput {
            final_world: self.world_snapshot(),
            log: self.log.clone(),
            statistics: self.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::rules::Priority;
    use crate::world::grid::CellState;

    fn still_monsters() -> SimulationConfig {
        SimulationConfig {
            ticks: 20,
            monster_move_probability: 0.0,
            ..Default::default()
        }
    }

    fn open_engine(n: u32, config: SimulationConfig) -> SimulationEngine {
        let grid = WorldGrid::initialize(n, 1.0, config.seed).unwrap();
        SimulationEngine::with_grid(config, grid).unwrap()
    }

    #[test]
    fn test_random_placement_respects_counts() {
        let config = SimulationConfig {
            grid_size: 8,
            free_probability: 0.9,
            robot_count: 4,
            monster_count: 5,
            ..Default::default()
        };
        let engine = SimulationEngine::new(config).unwrap();

        assert_eq!(engine.robots().len(), 4);
        assert_eq!(engine.monsters().len(), 5);
        for r in engine.robots() {
            assert!(engine.grid().is_free(r.position));
        }
        for m in engine.monsters() {
            assert!(engine.grid().is_free(m.position));
        }
        let mut cells: Vec<_> = engine.robots().iter().map(|r| r.position).collect();
        cells.sort();
        cells.dedup();
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn test_too_many_agents_rejected() {
        let config = SimulationConfig {
            grid_size: 3,
            free_probability: 1.0,
            robot_count: 2,
            ..Default::default()
        };
        assert!(matches!(
            SimulationEngine::new(config),
            Err(SimError::Configuration(_))
        ));
    }

    #[test]
    fn test_spawn_rules() {
        let mut engine = open_engine(5, still_monsters());
        let c = Coord3::new(2, 2, 2);

        assert!(engine.spawn_robot(c, Direction::PosX).is_ok());
        assert!(matches!(
            engine.spawn_robot(c, Direction::NegX),
            Err(SimError::Configuration(_))
        ));
        assert!(engine.spawn_monster(c).is_ok());
        assert!(engine.spawn_monster(c).is_err());
        assert!(matches!(
            engine.spawn_monster(Coord3::new(0, 2, 2)),
            Err(SimError::Configuration(_))
        ));
        assert!(matches!(
            engine.spawn_monster(Coord3::new(9, 2, 2)),
            Err(SimError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_spawn_after_start_rejected() {
        let mut engine = open_engine(5, still_monsters());
        engine.spawn_robot(Coord3::new(1, 1, 1), Direction::PosX).unwrap();
        engine.step().unwrap();
        assert!(matches!(
            engine.spawn_monster(Coord3::new(3, 3, 3)),
            Err(SimError::InvalidState(_))
        ));
    }

    #[test]
    fn test_vacuumator_destroys_robot_monster_and_cell() {
        let mut engine = open_engine(6, still_monsters());
        let c = Coord3::new(2, 2, 2);
        let robot = engine.spawn_robot(c, Direction::PosX).unwrap();
        let monster = engine.spawn_monster(c).unwrap();

        let summary = engine.step().unwrap();

        assert!(!engine.robot(robot).unwrap().alive);
        assert!(!engine.monster(monster).unwrap().alive);
        assert_eq!(engine.grid().state(c), CellState::Void);

        let robot_event = summary
            .events
            .iter()
            .find(|e| e.agent_kind == AgentKind::Robot)
            .unwrap();
        assert_eq!(robot_event.rule, Some(Priority::MonsterInCell));
        assert_eq!(
            robot_event.result,
            Outcome::Destroyed {
                cell: c,
                monsters: vec![monster]
            }
        );
        assert!(engine.is_finished());
    }

    #[test]
    fn test_robot_advances_toward_adjacent_monster() {
        let mut engine = open_engine(7, still_monsters());
        let robot = engine
            .spawn_robot(Coord3::new(2, 3, 3), Direction::PosX)
            .unwrap();
        engine.spawn_monster(Coord3::new(3, 3, 3)).unwrap();

        engine.step().unwrap();
        assert_eq!(engine.robot(robot).unwrap().position, Coord3::new(3, 3, 3));

        engine.step().unwrap();
        assert!(!engine.robot(robot).unwrap().alive);
        assert_eq!(engine.live_monster_count(), 0);
    }

    #[test]
    fn test_robot_turns_toward_side_monster() {
        let mut engine = open_engine(7, still_monsters());
        let robot = engine
            .spawn_robot(Coord3::new(3, 3, 3), Direction::PosX)
            .unwrap();
        engine.spawn_monster(Coord3::new(3, 3, 2)).unwrap();

        let summary = engine.step().unwrap();
        assert_eq!(engine.robot(robot).unwrap().orientation, Direction::NegZ);
        assert_eq!(summary.events.last().unwrap().rule, Some(Priority::MonsterSighted));
    }

    #[test]
    fn test_facing_robots_resolve_by_id() {
        let mut engine = open_engine(7, still_monsters());
        let low = engine.spawn_robot(Coord3::new(2, 3, 3), Direction::PosX).unwrap();
        let high = engine.spawn_robot(Coord3::new(3, 3, 3), Direction::NegX).unwrap();

        let summary = engine.step().unwrap();
        let results: Vec<_> = summary.events.iter().map(|e| e.result.clone()).collect();

        assert_eq!(results[0], Outcome::Held);
        assert_eq!(
            results[1],
            Outcome::Turned {
                from: Direction::NegX,
                to: Direction::NegY
            }
        );
        assert_eq!(engine.robot(low).unwrap().orientation, Direction::PosX);
        assert_eq!(engine.robot(high).unwrap().orientation, Direction::NegY);
    }

    #[test]
    fn test_robot_follows_robot_that_moved_earlier_in_tick() {
        let mut engine = open_engine(8, still_monsters());
        let lead = engine.spawn_robot(Coord3::new(3, 3, 3), Direction::PosX).unwrap();
        let follower = engine.spawn_robot(Coord3::new(2, 3, 3), Direction::PosX).unwrap();

        engine.step().unwrap();
        assert_eq!(engine.robot(lead).unwrap().position, Coord3::new(4, 3, 3));
        assert_eq!(engine.robot(follower).unwrap().position, Coord3::new(3, 3, 3));
    }

    #[test]
    fn test_step_after_finish_is_invalid() {
        let config = SimulationConfig {
            ticks: 2,
            ..still_monsters()
        };
        let mut engine = open_engine(5, config);
        engine.spawn_robot(Coord3::new(2, 2, 2), Direction::PosX).unwrap();

        assert_eq!(engine.run_to_end(None).unwrap(), 2);
        assert!(engine.is_finished());
        assert!(matches!(engine.step(), Err(SimError::InvalidState(_))));
    }

    #[test]
    fn test_no_robots_finishes_immediately() {
        let mut engine = open_engine(5, still_monsters());
        engine.spawn_monster(Coord3::new(2, 2, 2)).unwrap();
        assert_eq!(engine.run_to_end(None).unwrap(), 0);
        assert_eq!(engine.phase(), EnginePhase::Finished);
    }

    #[test]
    fn test_run_respects_max_ticks() {
        let mut engine = open_engine(6, still_monsters());
        engine.spawn_robot(Coord3::new(2, 2, 2), Direction::PosY).unwrap();
        assert_eq!(engine.run(5, None).unwrap(), 5);
        assert_eq!(engine.tick(), 5);
        assert_eq!(engine.phase(), EnginePhase::Running);
        assert_eq!(engine.tick_log().len(), 5);
    }

    #[test]
    fn test_enclosed_robot_flags_loop() {
        let config = SimulationConfig {
            loop_threshold: 2,
            ..still_monsters()
        };
        let mut engine = open_engine(5, config);
        let here = Coord3::new(2, 2, 2);
        for n in here.neighbors() {
            engine.grid.set_void(n).unwrap();
        }
        engine.spawn_robot(here, Direction::PosX).unwrap();
        engine.run(6, None).unwrap();

        let flags: Vec<bool> = engine.tick_log().events().map(|e| e.loop_detected).collect();
        assert_eq!(flags, vec![false, false, false, true, true, true]);
        assert_eq!(engine.stats().loops_detected, 3);
        assert!(engine.robots()[0].memory.knows_wall(here.step(Direction::PosX)));
    }
}
