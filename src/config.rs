use crate::grid::ZoneId;
use crate::pathfinding::PathfinderConfig;
use crate::smoothing::SmoothingConfig;
use crate::steering::{AgentConfig, SteeringConfig};
use crate::vision::VisionCone;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub pathfinding: PathfinderConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub steering: SteeringConfig,
    #[serde(default)]
    pub vision: VisionCone,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub agents: Vec<AgentSpawnConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// Text layout file (`#` barrier, `.` free, digit = zone); an open
    /// `cols` x `rows` grid when absent
    #[serde(default)]
    pub layout_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Consecutive failed planning ticks before an agent is parked
    #[serde(default = "default_max_failed_ticks")]
    pub max_failed_ticks: u32,
}

/// One agent to spawn; unset fields fall back to `[steering]`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentSpawnConfig {
    #[serde(default)]
    pub zones: Vec<ZoneId>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub angular_step: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub print_final_frame: bool,
}

// Default values
fn default_cols() -> i32 { 40 }
fn default_rows() -> i32 { 30 }
fn default_cell_size() -> f32 { 20.0 }
fn default_seed() -> u64 { 7 }
fn default_ticks() -> u64 { 600 }
fn default_max_failed_ticks() -> u32 { 30 }
fn default_log_filter() -> String { "info".to_string() }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            cell_size: default_cell_size(),
            layout_path: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            ticks: default_ticks(),
            max_failed_ticks: default_max_failed_ticks(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            print_final_frame: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            pathfinding: PathfinderConfig::default(),
            smoothing: SmoothingConfig::default(),
            steering: SteeringConfig::default(),
            vision: VisionCone::default(),
            simulation: SimulationConfig::default(),
            agents: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load configuration from file, or use defaults if the file is missing
    /// or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse configuration, using defaults");
                    Config::default()
                }
            },
            Err(_) => {
                info!(path = %path.display(), "no configuration file, using defaults");
                Config::default()
            }
        }
    }

    /// Per-agent settings with the spawn entry's overrides applied
    pub fn agent_config(&self, spawn: &AgentSpawnConfig) -> AgentConfig {
        let mut steering = self.steering.clone();
        if let Some(speed) = spawn.speed {
            steering.speed = speed;
        }
        if let Some(step) = spawn.angular_step {
            steering.angular_step = step;
        }
        AgentConfig {
            steering,
            pathfinding: self.pathfinding.clone(),
            smoothing: self.smoothing.clone(),
            vision: self.vision.clone(),
        }
    }
}
