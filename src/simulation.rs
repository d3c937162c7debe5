use crate::config::{AgentSpawnConfig, Config};
use crate::error::{NavError, NavResult};
use crate::grid::GridModel;
use crate::steering::{Agent, AgentId, KinematicState};
use crate::geometry::Point;
use crate::vision::VisionPolygon;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// What the presentation layer gets for one agent after a step
#[derive(Debug, Clone, Serialize)]
pub struct AgentFrame {
    pub id: AgentId,
    pub tick: u64,
    pub state: KinematicState,
    pub vision: VisionPolygon,
    /// Smoothed path still ahead, current waypoint first
    pub waypoints: Vec<Point>,
    pub stalled: bool,
}

/// Per-agent random seed, so an agent's goals do not depend on how many
/// agents were spawned before it
fn agent_seed(seed: u64, id: AgentId) -> u64 {
    seed ^ u64::from(id).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Owns the grid and every agent; ticks agents in spawn order
pub struct Simulation<G: GridModel> {
    grid: G,
    config: Config,
    agents: Vec<Agent>,
    stalled: HashSet<AgentId>,
    next_id: AgentId,
    tick: u64,
    rng: ChaCha8Rng,
}

impl<G: GridModel> Simulation<G> {
    pub fn new(grid: G, config: Config) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.simulation.seed);
        Simulation {
            grid,
            config,
            agents: Vec::new(),
            stalled: HashSet::new(),
            next_id: 1,
            tick: 0,
            rng,
        }
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn is_stalled(&self, id: AgentId) -> bool {
        self.stalled.contains(&id)
    }

    /// Agents parked after failing to plan, in spawn order
    pub fn stalled(&self) -> Vec<AgentId> {
        self.agents
            .iter()
            .map(|a| a.id)
            .filter(|id| self.stalled.contains(id))
            .collect()
    }

    /// Spawn an agent on a random walkable cell of its zones
    pub fn spawn(&mut self, spawn: &AgentSpawnConfig) -> NavResult<AgentId> {
        let node = self
            .grid
            .random_node_in_zones(&spawn.zones, &mut self.rng)
            .ok_or_else(|| NavError::EmptyZones {
                zones: spawn.zones.clone(),
            })?;

        let id = self.next_id;
        self.next_id += 1;
        let seed = agent_seed(self.config.simulation.seed, id);
        let agent = Agent::seeded(id, node.center, spawn.zones.clone(), self.config.agent_config(spawn), seed);

        debug!(agent = id, cell = ?node.index(), zones = ?spawn.zones, "spawned agent");
        self.agents.push(agent);
        Ok(id)
    }

    /// Spawn every `[[agents]]` entry of the configuration
    pub fn spawn_configured(&mut self) -> NavResult<Vec<AgentId>> {
        let spawns = self.config.agents.clone();
        spawns.iter().map(|spawn| self.spawn(spawn)).collect()
    }

    pub fn despawn(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.agents.iter().position(|a| a.id == id)?;
        self.stalled.remove(&id);
        Some(self.agents.remove(index))
    }

    /// Tick every active agent once and cast its vision.
    ///
    /// Planning failures are logged; an agent failing for
    /// `max_failed_ticks` ticks in a row is parked and no longer ticked.
    pub fn step(&mut self) -> Vec<AgentFrame> {
        self.tick += 1;
        let max_failed = self.config.simulation.max_failed_ticks.max(1);
        let mut frames = Vec::with_capacity(self.agents.len());

        for agent in &mut self.agents {
            let stalled = self.stalled.contains(&agent.id);
            if !stalled {
                if let Err(err) = agent.tick(&self.grid) {
                    warn!(agent = agent.id, tick = self.tick, error = %err, "planning failed");
                    if agent.failed_ticks() >= max_failed {
                        warn!(agent = agent.id, failed_ticks = agent.failed_ticks(), "agent stalled");
                        self.stalled.insert(agent.id);
                    }
                }
            }

            frames.push(AgentFrame {
                id: agent.id,
                tick: self.tick,
                state: agent.state(),
                vision: agent.cast_vision(&self.grid),
                waypoints: agent.waypoints().iter().copied().collect(),
                stalled: self.stalled.contains(&agent.id),
            });
        }

        frames
    }

    /// Run `ticks` steps and return the frames of the last one
    pub fn run(&mut self, ticks: u64) -> Vec<AgentFrame> {
        let mut last = Vec::new();
        for _ in 0..ticks {
            last = self.step();
        }
        last
    }
}
