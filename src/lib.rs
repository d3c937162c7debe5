pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod pathfinding;
pub mod simulation;
pub mod smoothing;
pub mod steering;
pub mod vision;

pub use config::Config;
pub use error::{NavError, NavResult};
pub use geometry::Point;
pub use grid::{Grid, GridModel, GridNode, ZoneId};
pub use pathfinding::{find_path, Path, PathfinderConfig};
pub use simulation::{AgentFrame, Simulation};
pub use smoothing::smooth_path;
pub use steering::{Agent, AgentConfig, AgentId, KinematicState, SteeringMode};
pub use vision::{VisionCone, VisionPolygon};
