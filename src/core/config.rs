//! Simulation configuration with documented constants
//!
//! Every construction input of a run is collected here. Loaded from TOML
//! by collaborators, or built in code with `Default` plus overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};

/// Configuration for one simulation run
///
/// Two runs with equal configs produce identical event logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === WORLD ===
    /// Cubic extent N of the grid (cells per axis)
    ///
    /// Must be at least 3 so that an interior exists inside the
    /// Void shell.
    pub grid_size: u32,

    /// Probability that an interior cell starts Free
    ///
    /// Void probability is `1 - free_probability`. Shell cells are
    /// always Void regardless of this value.
    pub free_probability: f64,

    /// Master seed for grid generation and the run's random stream
    pub seed: u64,

    // === AGENTS ===
    /// Robots placed on distinct Free cells at construction
    pub robot_count: u32,

    /// Monsters placed on distinct Free cells at construction
    pub monster_count: u32,

    /// Maximum number of ticks before the run finishes
    pub ticks: u64,

    /// Monster activation period K
    ///
    /// Monsters only attempt a move on ticks where `tick % K == 0`.
    pub monster_period: u64,

    /// Probability that an activated monster attempts a move
    pub monster_move_probability: f64,

    // === ROBOT MEMORY ===
    /// Maximum entries kept in each robot's history ring
    pub memory_capacity: usize,

    /// Consecutive stationary same-action ticks tolerated before the
    /// tick is flagged as a behavioral loop
    ///
    /// Purely diagnostic. A robot spinning inside a closed pocket hits
    /// this after `loop_threshold + 1` turns.
    pub loop_threshold: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 6,
            free_probability: 0.8,
            seed: 42,

            robot_count: 2,
            monster_count: 2,
            ticks: 15,
            monster_period: 3,
            monster_move_probability: 0.7,

            memory_capacity: 64,
            loop_threshold: 3,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 3 {
            return Err(SimError::Configuration(format!(
                "grid_size ({}) must be at least 3",
                self.grid_size
            )));
        }

        check_probability("free_probability", self.free_probability)?;
        check_probability("monster_move_probability", self.monster_move_probability)?;

        if self.monster_period == 0 {
            return Err(SimError::Configuration(
                "monster_period must be at least 1".into(),
            ));
        }

        if self.memory_capacity == 0 {
            return Err(SimError::Configuration(
                "memory_capacity must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Probabilities must be finite values inside [0, 1]
pub(crate) fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimError::Configuration(format!(
            "{} ({}) must be within [0, 1]",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_small_grid_rejected() {
        let config = SimulationConfig {
            grid_size: 2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));
    }

    #[test]
    fn test_probabilities_outside_unit_interval_rejected() {
        for bad in [-0.1, 1.5, f64::NAN] {
            let config = SimulationConfig {
                free_probability: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "free_probability {bad} accepted");

            let config = SimulationConfig {
                monster_move_probability: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "move probability {bad} accepted");
        }
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = SimulationConfig {
            monster_period: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            grid_size = 10
            seed = 7
            monster_period = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.grid_size, 10);
        assert_eq!(config.seed, 7);
        assert_eq!(config.monster_period, 5);
        assert_eq!(config.robot_count, SimulationConfig::default().robot_count);
    }

    #[test]
    fn test_negative_count_rejected_by_toml() {
        let result = SimulationConfig::from_toml_str("robot_count = -1");
        assert!(matches!(result, Err(SimError::Toml(_))));
    }

    #[test]
    fn test_invalid_toml_values_rejected() {
        let result = SimulationConfig::from_toml_str("free_probability = 2.0");
        assert!(matches!(result, Err(SimError::Configuration(_))));
    }
}
