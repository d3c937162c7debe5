use crate::grid::ZoneId;
use thiserror::Error;

/// Failures raised by planning and grid construction.
///
/// None of these are fatal to an agent: the steering loop recovers by
/// re-planning, and the simulation marks an agent stalled once planning keeps
/// failing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NavError {
    #[error("no path from ({}, {}) to ({}, {})", start.0, start.1, goal.0, goal.1)]
    NoPathFound { start: (i32, i32), goal: (i32, i32) },

    #[error("path smoothing needs at least 2 points, got {count}")]
    InsufficientPathPoints { count: usize },

    #[error("cell ({col}, {row}) is outside the {cols}x{rows} grid")]
    OutOfBounds {
        col: i32,
        row: i32,
        cols: i32,
        rows: i32,
    },

    #[error("no walkable node in zones {zones:?}")]
    EmptyZones { zones: Vec<ZoneId> },

    #[error("invalid grid layout at line {line}: {reason}")]
    InvalidLayout { line: usize, reason: String },

    #[error("planning failed {attempts} times this tick ({failed_ticks} failing ticks in a row)")]
    PlanningExhausted { attempts: usize, failed_ticks: u32 },
}

pub type NavResult<T> = Result<T, NavError>;
