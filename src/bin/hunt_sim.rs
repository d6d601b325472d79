//! Headless Hunt Runner
//!
//! Runs one seeded simulation and prints the summary or the full JSON output.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use cube_hunt::core::config::SimulationConfig;
use cube_hunt::core::error::Result;
use cube_hunt::simulation::SimulationEngine;

/// Headless Hunt Runner - robots vs monsters in a cubic world
#[derive(Parser, Debug)]
#[command(name = "hunt_sim")]
#[command(about = "Run a seeded robot/monster hunt and print the results")]
struct Args {
    /// TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid side length N
    #[arg(long)]
    size: Option<u32>,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of robots
    #[arg(long)]
    robots: Option<u32>,

    /// Number of monsters
    #[arg(long)]
    monsters: Option<u32>,

    /// Maximum ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Monster activation period K
    #[arg(long)]
    period: Option<u64>,

    /// Monster move probability
    #[arg(long)]
    move_probability: Option<f64>,

    /// Pause between ticks, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Print the full simulation output as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(size) = self.size {
            config.grid_size = size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(robots) = self.robots {
            config.robot_count = robots;
        }
        if let Some(monsters) = self.monsters {
            config.monster_count = monsters;
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(period) = self.period {
            config.monster_period = period;
        }
        if let Some(p) = self.move_probability {
            config.monster_move_probability = p;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cube_hunt=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let delay = (args.delay_ms > 0).then(|| Duration::from_millis(args.delay_ms));
    let json = args.json;
    let config = args.into_config()?;

    let mut engine = SimulationEngine::new(config)?;

    let start = Instant::now();
    engine.run_to_end(delay)?;
    let elapsed = start.elapsed();

    let output = engine.output();
    if json {
        println!("{}", output.to_json()?);
    } else {
        println!("{}", output.summary());
        println!("Actual time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    }

    Ok(())
}
