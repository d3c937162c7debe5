//! Path smoothing.
//!
//! The x and y coordinates of the node centers are interpolated as two
//! independent cubic splines over the node index `t = 0, 1, ..., n-1`, with
//! not-a-knot end conditions. Two points give a straight line and three
//! points the single parabola through them.

use crate::error::{NavError, NavResult};
use crate::geometry::Point;
use serde::Deserialize;

pub const DEFAULT_SEGMENTS: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Samples per segment between two consecutive nodes
    pub segments: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
        }
    }
}

/// Cubic spline over unit-spaced knots, stored as values and second
/// derivatives at each knot
#[derive(Debug, Clone)]
struct UnitSpline {
    values: Vec<f32>,
    second: Vec<f32>,
}

impl UnitSpline {
    fn fit(values: Vec<f32>) -> Self {
        let n = values.len();
        let second = match n {
            0..=2 => vec![0.0; n],
            3 => {
                let m = values[0] - 2.0 * values[1] + values[2];
                vec![m; 3]
            }
            _ => not_a_knot_second_derivatives(&values),
        };
        UnitSpline { values, second }
    }

    /// Evaluate on segment `i` at local parameter `s` in [0, 1]
    fn eval(&self, i: usize, s: f32) -> f32 {
        let (y0, y1) = (self.values[i], self.values[i + 1]);
        let (m0, m1) = (self.second[i], self.second[i + 1]);
        let r = 1.0 - s;
        r * y0 + s * y1 + ((r * r * r - r) * m0 + (s * s * s - s) * m1) / 6.0
    }
}

/// Second derivatives for n >= 4 unit-spaced knots.
///
/// Interior rows are `M[i-1] + 4 M[i] + M[i+1] = 6 (y[i-1] - 2 y[i] + y[i+1])`.
/// Not-a-knot (equal third derivative across knots 1 and n-2) gives
/// `M[0] = 2 M[1] - M[2]` and `M[n-1] = 2 M[n-2] - M[n-3]`; substituting
/// those turns the first and last interior rows into `6 M[i] = rhs`.
fn not_a_knot_second_derivatives(y: &[f32]) -> Vec<f32> {
    let n = y.len();
    let m = n - 2; // unknowns M[1..=n-2]

    let mut lower = vec![1.0_f32; m];
    let mut diag = vec![4.0_f32; m];
    let mut upper = vec![1.0_f32; m];
    let mut rhs: Vec<f32> = (1..n - 1)
        .map(|i| 6.0 * (y[i - 1] - 2.0 * y[i] + y[i + 1]))
        .collect();

    diag[0] = 6.0;
    upper[0] = 0.0;
    diag[m - 1] = 6.0;
    lower[m - 1] = 0.0;

    // Thomas algorithm
    for k in 1..m {
        let w = lower[k] / diag[k - 1];
        diag[k] -= w * upper[k - 1];
        rhs[k] -= w * rhs[k - 1];
    }
    let mut interior = vec![0.0_f32; m];
    interior[m - 1] = rhs[m - 1] / diag[m - 1];
    for k in (0..m - 1).rev() {
        interior[k] = (rhs[k] - upper[k] * interior[k + 1]) / diag[k];
    }

    let mut second = Vec::with_capacity(n);
    second.push(2.0 * interior[0] - interior[1]);
    second.extend_from_slice(&interior);
    second.push(2.0 * interior[m - 1] - interior[m - 2]);
    second
}

/// Densify a node-center sequence into a smooth point sequence.
///
/// Each segment contributes `segments` samples starting at its first node,
/// and the last node center is appended as-is, so the output starts and
/// ends exactly on the input's endpoints.
pub fn smooth_path(points: &[Point], segments: usize) -> NavResult<Vec<Point>> {
    if points.len() < 2 {
        return Err(NavError::InsufficientPathPoints { count: points.len() });
    }
    let segments = segments.max(1);

    let xs = UnitSpline::fit(points.iter().map(|p| p.x).collect());
    let ys = UnitSpline::fit(points.iter().map(|p| p.y).collect());

    let mut smooth = Vec::with_capacity((points.len() - 1) * segments + 1);
    for i in 0..points.len() - 1 {
        for k in 0..segments {
            let s = k as f32 / segments as f32;
            smooth.push(Point::new(xs.eval(i, s), ys.eval(i, s)));
        }
    }

    if let Some(&last) = points.last() {
        smooth.push(last);
    }
    Ok(smooth)
}
