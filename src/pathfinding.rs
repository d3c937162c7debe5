use crate::error::{NavError, NavResult};
use crate::geometry::Point;
use crate::grid::{GridModel, GridNode};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::f32::consts::SQRT_2;
use tracing::trace;

/// Search options
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathfinderConfig {
    /// Allow a diagonal step when only its target cell is free
    pub allow_corner_cutting: bool,
    /// Give up after this many node expansions (0 = unbounded)
    pub max_expansions: usize,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            allow_corner_cutting: true,
            max_expansions: 0,
        }
    }
}

/// Result of a successful search
#[derive(Debug, Clone)]
pub struct Path {
    /// Start node first, goal node last
    pub nodes: Vec<GridNode>,
    /// Sum of step costs (1 orthogonal, √2 diagonal)
    pub cost: f32,
}

impl Path {
    /// Nodes after the start, i.e. the moves still to make
    pub fn steps(&self) -> &[GridNode] {
        self.nodes.get(1..).unwrap_or(&[])
    }

    pub fn centers(&self) -> Vec<Point> {
        self.nodes.iter().map(|n| n.center).collect()
    }
}

/// Octile distance: admissible and consistent for 1 / √2 step costs
pub fn octile_distance(a: (i32, i32), b: (i32, i32)) -> f32 {
    let dx = (a.0 - b.0).abs() as f32;
    let dy = (a.1 - b.1).abs() as f32;
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    long - short + short * SQRT_2
}

/// A frontier entry in the search
#[derive(Debug, Clone, Copy)]
struct PathNode {
    cell: (i32, i32),
    cost: f32,
    heuristic: f32,
}

impl PathNode {
    fn estimate(&self) -> f32 {
        self.cost + self.heuristic
    }
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .estimate()
            .total_cmp(&self.estimate())
            // Tie-breakers: closer to goal first, then row-major cell order
            .then_with(|| other.heuristic.total_cmp(&self.heuristic))
            .then_with(|| other.cell.1.cmp(&self.cell.1))
            .then_with(|| other.cell.0.cmp(&self.cell.0))
    }
}

/// A* from `start` to `goal` (both (col, row)) over the 8-connected grid.
///
/// The returned path includes the start node. `start == goal` yields a
/// single-node path with zero cost.
pub fn find_path<G: GridModel>(
    grid: &G,
    start: (i32, i32),
    goal: (i32, i32),
    config: &PathfinderConfig,
) -> NavResult<Path> {
    for &(col, row) in &[start, goal] {
        if !grid.contains(col, row) {
            return Err(NavError::OutOfBounds {
                col,
                row,
                cols: grid.cols(),
                rows: grid.rows(),
            });
        }
    }

    let no_path = NavError::NoPathFound { start, goal };
    if grid.is_barrier(goal.0, goal.1) {
        return Err(no_path);
    }
    if start == goal {
        let node = grid.node_at_index(start.0, start.1).ok_or(no_path)?;
        return Ok(Path {
            nodes: vec![node],
            cost: 0.0,
        });
    }

    let mut open: BinaryHeap<PathNode> = BinaryHeap::new();
    let mut best_costs: HashMap<(i32, i32), f32> = HashMap::new();
    let mut came_from: HashMap<(i32, i32), (i32, i32)> = HashMap::new();
    let mut closed: HashSet<(i32, i32)> = HashSet::new();

    best_costs.insert(start, 0.0);
    open.push(PathNode {
        cell: start,
        cost: 0.0,
        heuristic: octile_distance(start, goal),
    });

    let mut expansions = 0usize;
    while let Some(node) = open.pop() {
        if !closed.insert(node.cell) {
            continue; // Stale entry, already finalized with a better cost
        }

        if node.cell == goal {
            trace!(?start, ?goal, expansions, cost = node.cost, "path found");
            return reconstruct(grid, &came_from, start, goal, node.cost);
        }

        expansions += 1;
        if config.max_expansions > 0 && expansions > config.max_expansions {
            trace!(?start, ?goal, expansions, "expansion limit reached");
            break;
        }

        for (next, step_cost) in grid.neighbors(node.cell.0, node.cell.1, config.allow_corner_cutting) {
            if closed.contains(&next) {
                continue;
            }
            let cost = node.cost + step_cost;

            // Only enqueue if this is a better path
            let better = match best_costs.get(&next) {
                Some(&best) => cost < best,
                None => true,
            };
            if better {
                best_costs.insert(next, cost);
                came_from.insert(next, node.cell);
                open.push(PathNode {
                    cell: next,
                    cost,
                    heuristic: octile_distance(next, goal),
                });
            }
        }
    }

    trace!(?start, ?goal, expansions, "no path");
    Err(no_path)
}

fn reconstruct<G: GridModel>(
    grid: &G,
    came_from: &HashMap<(i32, i32), (i32, i32)>,
    start: (i32, i32),
    goal: (i32, i32),
    cost: f32,
) -> NavResult<Path> {
    let mut cells = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                cells.push(prev);
                current = prev;
            }
            None => return Err(NavError::NoPathFound { start, goal }),
        }
    }
    cells.reverse();

    let nodes = cells
        .into_iter()
        .filter_map(|(col, row)| grid.node_at_index(col, row))
        .collect();
    Ok(Path { nodes, cost })
}

/// Format path for display
pub fn format_path(path: &Path) -> String {
    if path.nodes.is_empty() {
        return "No path".to_string();
    }

    path.nodes
        .iter()
        .map(|n| format!("({},{})", n.col, n.row))
        .collect::<Vec<_>>()
        .join(" -> ")
}
