use crate::error::{NavError, NavResult};
use crate::geometry::{angle_delta, bearing, normalize_degrees, rotate_degrees, Point};
use crate::grid::{GridModel, GridNode, ZoneId};
use crate::pathfinding::{find_path, PathfinderConfig};
use crate::smoothing::{smooth_path, SmoothingConfig};
use crate::vision::{VisionCone, VisionPolygon};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// While advancing, a waypoint whose bearing is off by more than this is
/// skipped
const MAX_TRACKING_DELTA: f32 = 45.0;

pub type AgentId = u32;

/// Steering and planning settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Pixels per tick
    pub speed: f32,
    /// Degrees per tick while turning to face a new path
    pub angular_step: f32,
    /// Heading of a freshly spawned agent
    pub initial_heading: f32,
    /// Half-width in pixels of the box that counts as reaching a waypoint
    pub waypoint_tolerance: f32,
    /// Goals tried per tick before planning gives up until the next tick
    pub max_plan_attempts: usize,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            speed: 0.5,
            angular_step: 1.0,
            initial_heading: 90.0,
            waypoint_tolerance: 1.0,
            max_plan_attempts: 8,
        }
    }
}

/// Everything an agent needs at construction
#[derive(Debug, Clone, Default)]
pub struct AgentConfig {
    pub steering: SteeringConfig,
    pub pathfinding: PathfinderConfig,
    pub smoothing: SmoothingConfig,
    pub vision: VisionCone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SteeringMode {
    /// No path; planning failed on the last attempt
    Idle,
    /// Path finished or invalidated, re-plan on the next tick
    Planning,
    /// Turning in place towards the first waypoint
    Rotating,
    /// Moving with the heading locked on the current waypoint
    Advancing,
}

/// Pose reported after every tick
#[derive(Debug, Clone, Serialize)]
pub struct KinematicState {
    pub position: Point,
    pub heading: f32,
    pub speed: f32,
    pub angular_step: f32,
    pub mode: SteeringMode,
    pub waypoint: Option<Point>,
}

/// Shortest turn direction from `heading` to `target`: +1 counter-clockwise,
/// -1 clockwise
pub fn shortest_rotation(heading: f32, target: f32) -> f32 {
    if (target - heading + 360.0).rem_euclid(360.0) <= 180.0 {
        1.0
    } else {
        -1.0
    }
}

/// A patrolling enemy: wanders between random goals in its zones
#[derive(Debug, Clone)]
pub struct Agent<R = ChaCha8Rng> {
    pub id: AgentId,
    pub position: Point,
    /// Degrees in [0, 360)
    pub heading: f32,
    /// Zones random goals are drawn from; empty means the whole grid
    pub zones: Vec<ZoneId>,
    config: AgentConfig,
    mode: SteeringMode,
    /// Remaining smoothed path, front is the current waypoint
    path: VecDeque<Point>,
    goal: Option<GridNode>,
    /// Turn direction, fixed once per waypoint while rotating
    rotation: Option<f32>,
    failed_ticks: u32,
    rng: R,
}

impl Agent<ChaCha8Rng> {
    /// Agent with a deterministic random source
    pub fn seeded(id: AgentId, position: Point, zones: Vec<ZoneId>, config: AgentConfig, seed: u64) -> Self {
        Self::new(id, position, zones, config, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Agent<R> {
    pub fn new(id: AgentId, position: Point, zones: Vec<ZoneId>, config: AgentConfig, rng: R) -> Self {
        let heading = normalize_degrees(config.steering.initial_heading);
        Agent {
            id,
            position,
            heading,
            zones,
            config,
            mode: SteeringMode::Idle,
            path: VecDeque::new(),
            goal: None,
            rotation: None,
            failed_ticks: 0,
            rng,
        }
    }

    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn goal(&self) -> Option<&GridNode> {
        self.goal.as_ref()
    }

    /// Remaining smoothed path, current waypoint first
    pub fn waypoints(&self) -> &VecDeque<Point> {
        &self.path
    }

    pub fn waypoint(&self) -> Option<Point> {
        self.path.front().copied()
    }

    /// Consecutive ticks on which planning failed
    pub fn failed_ticks(&self) -> u32 {
        self.failed_ticks
    }

    pub fn state(&self) -> KinematicState {
        KinematicState {
            position: self.position,
            heading: self.heading,
            speed: self.config.steering.speed,
            angular_step: self.config.steering.angular_step,
            mode: self.mode,
            waypoint: self.waypoint(),
        }
    }

    /// Follow an externally supplied smoothed path; the goal becomes the cell
    /// of its last point
    pub fn follow<G: GridModel>(&mut self, grid: &G, points: Vec<Point>) {
        self.goal = points.last().and_then(|p| grid.node_at(*p));
        self.path = points.into();
        self.rotation = None;
        self.mode = if self.path.is_empty() {
            SteeringMode::Planning
        } else {
            SteeringMode::Rotating
        };
    }

    /// Pick a random goal in the agent's zones, find and smooth a path to it,
    /// and start rotating towards the first waypoint.
    ///
    /// The smoothed point for the agent's own cell is dropped, so the returned
    /// path starts with the first point to move to.
    pub fn plan<G: GridModel>(&mut self, grid: &G) -> NavResult<&VecDeque<Point>> {
        self.plan_once(grid)?;
        Ok(&self.path)
    }

    fn plan_once<G: GridModel>(&mut self, grid: &G) -> NavResult<()> {
        let start = grid.node_at(self.position).ok_or_else(|| {
            let size = grid.cell_size();
            NavError::OutOfBounds {
                col: (self.position.x / size).floor() as i32,
                row: (self.position.y / size).floor() as i32,
                cols: grid.cols(),
                rows: grid.rows(),
            }
        })?;
        let goal = grid
            .random_node_in_zones(&self.zones, &mut self.rng)
            .ok_or_else(|| NavError::EmptyZones {
                zones: self.zones.clone(),
            })?;

        let path = find_path(grid, start.index(), goal.index(), &self.config.pathfinding)?;
        let mut points = smooth_path(&path.centers(), self.config.smoothing.segments)?;
        points.remove(0);

        debug!(
            agent = self.id,
            start = ?start.index(),
            goal = ?goal.index(),
            cost = path.cost,
            waypoints = points.len(),
            "planned path"
        );

        self.path = points.into();
        self.goal = Some(goal);
        self.rotation = None;
        self.mode = SteeringMode::Rotating;
        Ok(())
    }

    /// Plan with up to `max_plan_attempts` random goals
    fn replan<G: GridModel>(&mut self, grid: &G) -> NavResult<()> {
        let limit = self.config.steering.max_plan_attempts.max(1);
        let mut attempts = 0;

        while attempts < limit {
            attempts += 1;
            match self.plan_once(grid) {
                Ok(_) => {
                    self.failed_ticks = 0;
                    return Ok(());
                }
                // Retrying with another goal cannot fix these
                Err(err @ (NavError::OutOfBounds { .. } | NavError::EmptyZones { .. })) => {
                    debug!(agent = self.id, %err, "planning impossible");
                    break;
                }
                Err(err) => debug!(agent = self.id, attempt = attempts, %err, "planning attempt failed"),
            }
        }

        self.failed_ticks += 1;
        self.path.clear();
        self.goal = None;
        self.mode = SteeringMode::Idle;
        Err(NavError::PlanningExhausted {
            attempts,
            failed_ticks: self.failed_ticks,
        })
    }

    fn at_goal<G: GridModel>(&self, grid: &G) -> bool {
        match (&self.goal, grid.node_at(self.position)) {
            (Some(goal), Some(here)) => goal.index() == here.index(),
            _ => false,
        }
    }

    fn has_reached(&self, point: Point) -> bool {
        point.is_within(&self.position, self.config.steering.waypoint_tolerance)
    }

    /// Advance one simulation step
    pub fn tick<G: GridModel>(&mut self, grid: &G) -> NavResult<KinematicState> {
        if self.path.is_empty() || self.at_goal(grid) {
            self.mode = SteeringMode::Planning;
            self.replan(grid)?;
        } else if let Some(waypoint) = self.waypoint() {
            if self.has_reached(waypoint) {
                self.path.pop_front();
                self.rotation = None;
                if self.path.is_empty() {
                    self.mode = SteeringMode::Planning;
                }
            }
        }

        match self.mode {
            SteeringMode::Rotating => self.rotate_towards_waypoint(),
            SteeringMode::Advancing => self.advance_towards_waypoint(),
            SteeringMode::Idle | SteeringMode::Planning => {}
        }

        Ok(self.state())
    }

    fn rotate_towards_waypoint(&mut self) {
        let Some(target) = self.waypoint() else {
            return;
        };
        let step = self.config.steering.angular_step.abs();
        let wanted = bearing(self.position, target);

        if angle_delta(wanted, self.heading).abs() <= step + 1.0 {
            self.mode = SteeringMode::Advancing;
            return;
        }

        let heading = self.heading;
        let direction = *self.rotation.get_or_insert_with(|| shortest_rotation(heading, wanted));
        self.heading = rotate_degrees(self.heading, direction * step);
    }

    fn advance_towards_waypoint(&mut self) {
        let Some(mut target) = self.waypoint() else {
            return;
        };
        let mut wanted = bearing(self.position, target);

        // Sharp bend: drop this waypoint, but never the last one
        if angle_delta(wanted, self.heading).abs() > MAX_TRACKING_DELTA && self.path.len() > 1 {
            self.path.pop_front();
            if let Some(next) = self.waypoint() {
                target = next;
                wanted = bearing(self.position, target);
            }
        }

        self.heading = wanted;
        let distance = self.position.distance(&target);
        self.position = self.position.advanced(wanted, self.config.steering.speed.min(distance));
    }

    /// Current field of view
    pub fn cast_vision<G: GridModel>(&self, grid: &G) -> VisionPolygon {
        self.config.vision.cast(self.position, self.heading, grid)
    }
}
