#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sentinel_nav::pathfinding::{find_path, Path as GridPath, PathfinderConfig};
use sentinel_nav::{Grid, GridModel, NavError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CELL_SIZE: f32 = 20.0;
pub const COST_EPSILON: f32 = 1e-4;

/// Pathfinding fixture, stored as JSON under test_data/
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathTestData {
    #[serde(rename = "testName")]
    pub test_name: String,
    /// One string per row: `#` barrier, `.` free
    pub layout: Vec<String>,
    pub start: (i32, i32),
    pub goal: (i32, i32),
    /// Optimal cost with corner cutting; `null` when unreachable
    #[serde(rename = "expectedCost")]
    pub expected_cost: Option<f32>,
    /// Optimal cost with corner cutting disabled; `null` when unreachable
    #[serde(rename = "expectedCostNoCornerCutting")]
    pub expected_cost_no_corner_cutting: Option<f32>,
}

/// Load a test from JSON file
pub fn load_test(path: &Path) -> Result<PathTestData, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)?;
    let test_data: PathTestData = serde_json::from_str(&contents)?;
    Ok(test_data)
}

/// Every `*.json` fixture in `dir`, sorted by file name
pub fn load_all(dir: &str) -> Vec<PathTestData> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<_> = entries.filter_map(Result::ok).collect();
    entries.sort_by_key(|e| e.file_name());

    entries
        .iter()
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|p| load_test(&p).unwrap_or_else(|e| panic!("bad fixture {}: {}", p.display(), e)))
        .collect()
}

pub fn grid_from_rows(rows: &[String]) -> Grid {
    Grid::from_layout(&rows.join("\n"), CELL_SIZE).expect("fixture layout")
}

/// Mirror left-right
pub fn flip_test_horizontal(test: &PathTestData) -> PathTestData {
    let cols = test.layout.first().map_or(0, |r| r.chars().count() as i32);
    PathTestData {
        test_name: format!("{}_h_flip", test.test_name),
        layout: test.layout.iter().map(|r| r.chars().rev().collect()).collect(),
        start: (cols - 1 - test.start.0, test.start.1),
        goal: (cols - 1 - test.goal.0, test.goal.1),
        ..test.clone()
    }
}

/// Mirror top-bottom
pub fn flip_test_vertical(test: &PathTestData) -> PathTestData {
    let rows = test.layout.len() as i32;
    PathTestData {
        test_name: format!("{}_v_flip", test.test_name),
        layout: test.layout.iter().rev().cloned().collect(),
        start: (test.start.0, rows - 1 - test.start.1),
        goal: (test.goal.0, rows - 1 - test.goal.1),
        ..test.clone()
    }
}

/// Swap start and goal; costs are symmetric
pub fn reverse_test(test: &PathTestData) -> PathTestData {
    PathTestData {
        test_name: format!("{}_reversed", test.test_name),
        start: test.goal,
        goal: test.start,
        ..test.clone()
    }
}

/// Check one variant under one corner-cutting setting
fn check_cost(test: &PathTestData, allow_corner_cutting: bool, expected: Option<f32>) -> Result<(), String> {
    let grid = grid_from_rows(&test.layout);
    let config = PathfinderConfig {
        allow_corner_cutting,
        ..PathfinderConfig::default()
    };
    let result = find_path(&grid, test.start, test.goal, &config);

    match (result, expected) {
        (Ok(path), Some(cost)) => {
            if let Err(reason) = validate_path(&grid, &path, test.start, test.goal) {
                return Err(format!("invalid path: {}\n{}", reason, visualize_path(&grid, &path)));
            }
            if (path.cost - cost).abs() > COST_EPSILON {
                return Err(format!(
                    "cost {} != expected {}\n{}",
                    path.cost,
                    cost,
                    visualize_path(&grid, &path)
                ));
            }
            Ok(())
        }
        (Err(NavError::NoPathFound { .. }), None) => Ok(()),
        (Ok(path), None) => Err(format!("expected no path, got\n{}", visualize_path(&grid, &path))),
        (Err(e), _) => Err(format!("unexpected error: {}", e)),
    }
}

/// Run a fixture in all its mirrored and reversed variants, with and without
/// corner cutting. Returns the first failing variant.
pub fn run_test(test: &PathTestData) -> Result<(), String> {
    let h = flip_test_horizontal(test);
    let v = flip_test_vertical(test);
    let hv = flip_test_vertical(&h);
    let variants = vec![reverse_test(test), reverse_test(&hv), test.clone(), h, v, hv];

    for variant in &variants {
        check_cost(variant, true, variant.expected_cost)
            .map_err(|e| format!("[{}] corner cutting: {}", variant.test_name, e))?;
        check_cost(variant, false, variant.expected_cost_no_corner_cutting)
            .map_err(|e| format!("[{}] strict: {}", variant.test_name, e))?;
    }
    Ok(())
}

/// Endpoints match, every node is walkable, consecutive nodes are 8-adjacent
/// and the reported cost is the sum of the steps
pub fn validate_path<G: GridModel>(grid: &G, path: &GridPath, start: (i32, i32), goal: (i32, i32)) -> Result<(), String> {
    let first = path.nodes.first().ok_or("empty path")?;
    let last = path.nodes.last().ok_or("empty path")?;
    if first.index() != start || last.index() != goal {
        return Err(format!("endpoints {:?} -> {:?}", first.index(), last.index()));
    }

    let mut cost = 0.0;
    for pair in path.nodes.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if !a.is_adjacent(b) || a.index() == b.index() {
            return Err(format!("{:?} -> {:?} is not a single step", a.index(), b.index()));
        }
        cost += if a.col != b.col && a.row != b.row { std::f32::consts::SQRT_2 } else { 1.0 };
    }
    if let Some(node) = path.nodes.iter().find(|n| grid.is_barrier(n.col, n.row)) {
        return Err(format!("path crosses barrier {:?}", node.index()));
    }
    if (cost - path.cost).abs() > COST_EPSILON {
        return Err(format!("step sum {} != reported cost {}", cost, path.cost));
    }
    Ok(())
}

/// Visualize a path on a grid
pub fn visualize_path(grid: &Grid, path: &GridPath) -> String {
    let start = path.nodes.first().map(|n| n.index());
    let goal = path.nodes.last().map(|n| n.index());
    let mut result = format!("Cost: {:.4}, {} nodes\n", path.cost, path.nodes.len());

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let cell = Some((col, row));
            let symbol = if cell == start {
                'S'
            } else if cell == goal {
                'D'
            } else if path.nodes.iter().any(|n| n.index() == (col, row)) {
                '*'
            } else if grid.is_barrier(col, row) {
                '█'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }

    result
}

/// Grid with each cell a barrier with probability `density`
pub fn random_grid(seed: u64, cols: i32, rows: i32, density: f64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = Grid::new(rows, cols, CELL_SIZE);
    for row in 0..rows {
        for col in 0..cols {
            if rng.gen_bool(density) {
                grid.set_barrier(col, row, true).expect("in bounds");
            }
        }
    }
    grid
}
