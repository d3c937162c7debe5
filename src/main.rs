use sentinel_nav::config::{AgentSpawnConfig, Config, DEFAULT_CONFIG_PATH};
use sentinel_nav::{Grid, GridModel, Simulation};
use std::env;
use std::error::Error;
use std::fs;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

/// Build the grid from the configured layout file, or an open grid
fn load_grid(config: &Config) -> Result<Grid, Box<dyn Error>> {
    let grid_config = &config.grid;
    match &grid_config.layout_path {
        Some(path) => {
            let layout = fs::read_to_string(path)
                .map_err(|e| format!("failed to read layout {}: {}", path.display(), e))?;
            let grid = Grid::from_layout(&layout, grid_config.cell_size)?;
            info!(path = %path.display(), cols = grid.cols(), rows = grid.rows(), "loaded layout");
            Ok(grid)
        }
        None => Ok(Grid::new(grid_config.rows, grid_config.cols, grid_config.cell_size)),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    // RUST_LOG wins; otherwise the filter from the config file replaces the
    // startup one once the file is read
    let from_env = EnvFilter::try_from_default_env().ok();
    let has_env_filter = from_env.is_some();
    let (filter, filter_handle) = reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let mut config = Config::load(&config_path);
    if !has_env_filter {
        filter_handle.reload(EnvFilter::new(&config.logging.filter))?;
    }

    if config.agents.is_empty() {
        config.agents.push(AgentSpawnConfig::default());
    }

    let grid = load_grid(&config)?;
    let ticks = config.simulation.ticks;
    let print_final_frame = config.logging.print_final_frame;

    let mut sim = Simulation::new(grid, config);
    let ids = sim.spawn_configured()?;
    info!(agents = ids.len(), ticks, "starting simulation");

    let mut frames = Vec::new();
    for _ in 0..ticks {
        frames = sim.step();
        for frame in &frames {
            debug!(
                agent = frame.id,
                tick = frame.tick,
                x = frame.state.position.x,
                y = frame.state.position.y,
                heading = frame.state.heading,
                mode = ?frame.state.mode,
                waypoints = frame.waypoints.len(),
                "frame"
            );
        }
        if !frames.is_empty() && frames.iter().all(|f| f.stalled) {
            warn!(tick = sim.current_tick(), "every agent is stalled, stopping early");
            break;
        }
    }

    for agent in sim.agents() {
        info!(
            agent = agent.id,
            x = agent.position.x,
            y = agent.position.y,
            heading = agent.heading,
            stalled = sim.is_stalled(agent.id),
            "final pose"
        );
    }

    if print_final_frame {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    }

    Ok(())
}
