use crate::geometry::{normalize_degrees, Point};
use crate::grid::GridModel;
use serde::{Deserialize, Serialize};

/// Offset applied to rays lying exactly on 90° / 270°
const RAY_NUDGE: f32 = 0.001;
/// Offset past a grid line so the next cell lookup lands on the far side
const LINE_EPSILON: f32 = 0.001;

/// Vision cone settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionCone {
    /// Full opening angle in degrees; rays cover `heading ± field_of_view / 2`
    pub field_of_view: f32,
    /// Maximum grid lines a ray crosses along each axis
    pub reach: u32,
}

impl Default for VisionCone {
    fn default() -> Self {
        Self {
            field_of_view: 60.0,
            reach: 8,
        }
    }
}

/// Outline of the visible area as boundary segments
#[derive(Debug, Clone, Default, Serialize)]
pub struct VisionPolygon {
    pub segments: Vec<(Point, Point)>,
}

impl VisionPolygon {
    /// Segment endpoints flattened in order, ready to fill as a polygon
    pub fn vertices(&self) -> Vec<Point> {
        self.segments.iter().flat_map(|&(a, b)| [a, b]).collect()
    }
}

/// Where a single ray stopped
#[derive(Debug, Clone, Copy)]
struct RayHit {
    point: Point,
    distance: f32,
}

impl VisionCone {
    pub fn new(field_of_view: f32, reach: u32) -> Self {
        VisionCone { field_of_view, reach }
    }

    /// Ray angles from the left edge of the cone down to the right edge,
    /// one per degree, wrapped into [0, 360)
    pub fn ray_angles(&self, heading: f32) -> Vec<f32> {
        let half = self.field_of_view / 2.0;
        let count = self.field_of_view.max(0.0).floor() as u32;
        (0..=count)
            .map(|i| normalize_degrees(heading + half - i as f32))
            .collect()
    }

    /// Cast the cone and assemble the boundary segments.
    ///
    /// The first ray opens a segment from `origin`; every later contact point
    /// that is not a neighbour of the previous one opens a segment
    /// `(previous, current)`; a final segment returns to `origin`.
    pub fn cast<G: GridModel>(&self, origin: Point, heading: f32, grid: &G) -> VisionPolygon {
        let gap = grid.cell_size();
        let mut segments = Vec::new();
        let mut previous: Option<Point> = None;

        for angle in self.ray_angles(heading) {
            let contact = self.cast_ray(origin, angle, grid);
            let adjacent = previous.is_some_and(|p| is_point_neighbour(p, contact, gap));
            if !adjacent {
                segments.push((previous.unwrap_or(origin), contact));
            }
            previous = Some(contact);
        }

        segments.push((previous.unwrap_or(origin), origin));
        VisionPolygon { segments }
    }

    /// First obstacle (or reach limit) along one ray
    pub fn cast_ray<G: GridModel>(&self, origin: Point, angle: f32, grid: &G) -> Point {
        let mut angle = normalize_degrees(angle);
        if angle == 90.0 || angle == 270.0 {
            angle += RAY_NUDGE;
        }
        let tan = angle.to_radians().tan();
        let max_steps = self.reach.min(grid.cols().max(grid.rows()).max(0) as u32);

        let horizontal = horizontal_hit(origin, angle, tan, max_steps, grid);
        let vertical = vertical_hit(origin, angle, tan, max_steps, grid);

        match (horizontal, vertical) {
            (Some(h), Some(v)) if v.distance < h.distance => v.point,
            (Some(h), _) => h.point,
            (None, Some(v)) => v.point,
            (None, None) => origin,
        }
    }
}

/// Walk the horizontal grid lines the ray crosses
fn horizontal_hit<G: GridModel>(origin: Point, angle: f32, tan: f32, max_steps: u32, grid: &G) -> Option<RayHit> {
    if tan.abs() < f32::EPSILON {
        return None; // Parallel to the horizontal lines
    }
    let gap = grid.cell_size();
    let up = angle <= 180.0;

    let line = (origin.y / gap).ceil() * gap;
    let (mut ray_y, offset_y) = if up { (line - gap, gap) } else { (line + LINE_EPSILON, -gap) };
    let mut ray_x = (origin.y - ray_y) / tan + origin.x;
    let offset_x = offset_y / tan;

    for _ in 0..max_steps {
        let col = (ray_x / gap).floor() as i32;
        let row = (ray_y / gap).floor() as i32 - if up { 1 } else { 0 };
        if grid.is_barrier(col, row) {
            break;
        }
        ray_x += offset_x;
        ray_y -= offset_y;
    }

    let point = Point::new(ray_x, ray_y);
    Some(RayHit {
        point,
        distance: origin.distance(&point),
    })
}

/// Walk the vertical grid lines the ray crosses
fn vertical_hit<G: GridModel>(origin: Point, angle: f32, tan: f32, max_steps: u32, grid: &G) -> Option<RayHit> {
    let gap = grid.cell_size();
    let right = !(angle > 90.0 && angle < 270.0);

    let line = (origin.x / gap).ceil() * gap;
    let (mut ray_x, offset_x) = if right { (line + LINE_EPSILON, gap) } else { (line - gap, -gap) };
    let mut ray_y = (origin.x - ray_x) * tan + origin.y;
    let offset_y = offset_x * tan;

    for _ in 0..max_steps {
        let col = (ray_x / gap).floor() as i32 - if right { 0 } else { 1 };
        let row = (ray_y / gap).floor() as i32;
        if grid.is_barrier(col, row) {
            break;
        }
        ray_x += offset_x;
        ray_y -= offset_y;
    }

    let point = Point::new(ray_x, ray_y);
    Some(RayHit {
        point,
        distance: origin.distance(&point),
    })
}

/// Contact points within one cell of each other along both axes
fn is_point_neighbour(a: Point, b: Point, gap: f32) -> bool {
    (a.x - b.x).abs() <= gap && (a.y - b.y).abs() <= gap
}
