use crate::error::{NavError, NavResult};
use crate::geometry::Point;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::SQRT_2;

/// Identifier of a zone an agent may pick random goals from
pub type ZoneId = u8;

/// Snapshot of one grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub col: i32,
    pub row: i32,
    /// World position of the cell center
    pub center: Point,
    pub barrier: bool,
    pub zones: Vec<ZoneId>,
}

impl GridNode {
    pub fn index(&self) -> (i32, i32) {
        (self.col, self.row)
    }

    /// Whether two nodes are the same or touch, diagonals included
    pub fn is_adjacent(&self, other: &GridNode) -> bool {
        (self.col - other.col).abs() <= 1 && (self.row - other.row).abs() <= 1
    }
}

/// What the navigation core needs from a tile map.
///
/// Implementations are read-only from the core's point of view, so several
/// agents can share one grid.
pub trait GridModel {
    fn cols(&self) -> i32;
    fn rows(&self) -> i32;
    /// Side length of a square cell in pixels
    fn cell_size(&self) -> f32;
    /// Barrier test; cells outside the grid count as barriers
    fn is_barrier(&self, col: i32, row: i32) -> bool;
    fn node_at_index(&self, col: i32, row: i32) -> Option<GridNode>;
    /// Uniformly random walkable node belonging to any of `zones`, or to the
    /// whole grid when `zones` is empty
    fn random_node_in_zones<R: Rng + ?Sized>(&self, zones: &[ZoneId], rng: &mut R) -> Option<GridNode>;

    fn contains(&self, col: i32, row: i32) -> bool {
        col >= 0 && col < self.cols() && row >= 0 && row < self.rows()
    }

    /// Node containing a world position
    fn node_at(&self, point: Point) -> Option<GridNode> {
        let size = self.cell_size();
        let col = (point.x / size).floor() as i32;
        let row = (point.y / size).floor() as i32;
        self.node_at_index(col, row)
    }

    fn center_of(&self, col: i32, row: i32) -> Point {
        let size = self.cell_size();
        Point::new(col as f32 * size + size / 2.0, row as f32 * size + size / 2.0)
    }

    /// Walkable 8-connected neighbours with their step cost (1 or √2).
    ///
    /// With `allow_corner_cutting` off, a diagonal step also needs both
    /// orthogonal side cells to be free.
    fn neighbors(&self, col: i32, row: i32, allow_corner_cutting: bool) -> Vec<((i32, i32), f32)> {
        let mut result = Vec::with_capacity(8);
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (col + dx, row + dy);
                if self.is_barrier(nx, ny) {
                    continue;
                }
                let diagonal = dx != 0 && dy != 0;
                if diagonal
                    && !allow_corner_cutting
                    && (self.is_barrier(col + dx, row) || self.is_barrier(col, row + dy))
                {
                    continue;
                }
                result.push(((nx, ny), if diagonal { SQRT_2 } else { 1.0 }));
            }
        }
        result
    }
}

/// Grid structure for storing cell states
/// Cell values: 0=free/walkable, 1=barrier
#[derive(Clone, Debug)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
    pub cell_size: f32,
    pub cells: Vec<i32>,
    zones: Vec<Vec<ZoneId>>,
}

impl Grid {
    /// Create a new grid with all cells free and no zones
    pub fn new(rows: i32, cols: i32, cell_size: f32) -> Self {
        let count = (rows.max(0) * cols.max(0)) as usize;
        Grid {
            rows,
            cols,
            cell_size,
            cells: vec![0; count],
            zones: vec![Vec::new(); count],
        }
    }

    /// Create a grid with specific barrier cells given as (col, row)
    pub fn with_barriers(rows: i32, cols: i32, cell_size: f32, barriers: &[(i32, i32)]) -> NavResult<Self> {
        let mut grid = Self::new(rows, cols, cell_size);
        for &(col, row) in barriers {
            grid.set_barrier(col, row, true)?;
        }
        Ok(grid)
    }

    /// Parse a text layout, one line per row:
    /// - `#`: barrier
    /// - `.`: free cell
    /// - `0`-`9`: free cell belonging to that zone
    ///
    /// Blank lines are skipped; every row must have the same width.
    pub fn from_layout(layout: &str, cell_size: f32) -> NavResult<Self> {
        let lines: Vec<(usize, &str)> = layout
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .collect();

        let Some(&(_, first)) = lines.first() else {
            return Err(NavError::InvalidLayout {
                line: 0,
                reason: "layout has no rows".to_string(),
            });
        };

        let cols = first.chars().count() as i32;
        let rows = lines.len() as i32;
        let mut grid = Self::new(rows, cols, cell_size);

        for (row, &(line_no, line)) in lines.iter().enumerate() {
            let width = line.chars().count() as i32;
            if width != cols {
                return Err(NavError::InvalidLayout {
                    line: line_no,
                    reason: format!("expected {} columns, found {}", cols, width),
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let (col, row) = (col as i32, row as i32);
                match ch {
                    '#' => grid.set_barrier(col, row, true)?,
                    '.' => {}
                    d if d.is_ascii_digit() => grid.add_zone(col, row, d as u8 - b'0')?,
                    other => {
                        return Err(NavError::InvalidLayout {
                            line: line_no,
                            reason: format!("unexpected character {:?}", other),
                        })
                    }
                }
            }
        }

        Ok(grid)
    }

    /// Convert (col, row) coordinates to cell ID
    pub fn get_id(&self, col: i32, row: i32) -> i32 {
        col + row * self.cols
    }

    /// Convert cell ID to (col, row) coordinates
    pub fn get_coords(&self, id: i32) -> (i32, i32) {
        (id % self.cols, id / self.cols)
    }

    fn check_bounds(&self, col: i32, row: i32) -> NavResult<usize> {
        if self.contains(col, row) {
            Ok(self.get_id(col, row) as usize)
        } else {
            Err(NavError::OutOfBounds {
                col,
                row,
                cols: self.cols,
                rows: self.rows,
            })
        }
    }

    pub fn set_barrier(&mut self, col: i32, row: i32, barrier: bool) -> NavResult<()> {
        let id = self.check_bounds(col, row)?;
        self.cells[id] = if barrier { 1 } else { 0 };
        Ok(())
    }

    /// Add a cell to a zone; a cell may belong to several zones
    pub fn add_zone(&mut self, col: i32, row: i32, zone: ZoneId) -> NavResult<()> {
        let id = self.check_bounds(col, row)?;
        if !self.zones[id].contains(&zone) {
            self.zones[id].push(zone);
        }
        Ok(())
    }

    /// Walkable cells of any of `zones` (all walkable cells when empty)
    pub fn walkable_in_zones(&self, zones: &[ZoneId]) -> Vec<(i32, i32)> {
        (0..self.cells.len())
            .filter(|&id| self.cells[id] == 0)
            .filter(|&id| zones.is_empty() || self.zones[id].iter().any(|z| zones.contains(z)))
            .map(|id| self.get_coords(id as i32))
            .collect()
    }
}

impl GridModel for Grid {
    fn cols(&self) -> i32 {
        self.cols
    }

    fn rows(&self) -> i32 {
        self.rows
    }

    fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn is_barrier(&self, col: i32, row: i32) -> bool {
        if !self.contains(col, row) {
            return true; // Out of bounds is considered blocked
        }
        self.cells[self.get_id(col, row) as usize] == 1
    }

    fn node_at_index(&self, col: i32, row: i32) -> Option<GridNode> {
        if !self.contains(col, row) {
            return None;
        }
        let id = self.get_id(col, row) as usize;
        Some(GridNode {
            col,
            row,
            center: self.center_of(col, row),
            barrier: self.cells[id] == 1,
            zones: self.zones[id].clone(),
        })
    }

    fn random_node_in_zones<R: Rng + ?Sized>(&self, zones: &[ZoneId], rng: &mut R) -> Option<GridNode> {
        let candidates = self.walkable_in_zones(zones);
        let &(col, row) = candidates.choose(rng)?;
        self.node_at_index(col, row)
    }
}
