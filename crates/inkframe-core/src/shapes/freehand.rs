//! Freehand paths.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pressure assumed for points recorded without one once a stroke has pressure data.
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Freehand data. Points are relative to the layer origin; the first is `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freehand {
    pub points: Vec<Point>,
    /// Pen pressure per point, empty when the input device had none.
    pub pressures: Vec<f64>,
    /// Set while the user is still drawing.
    #[serde(skip)]
    pub in_progress: bool,
}

impl Default for Freehand {
    fn default() -> Self {
        Self {
            points: vec![Point::ZERO],
            pressures: Vec::new(),
            in_progress: false,
        }
    }
}

impl Freehand {
    /// Append a point. Pressures stay either empty or one per point; missing
    /// values are filled with [`DEFAULT_PRESSURE`].
    pub fn push_point(&mut self, point: Point, pressure: Option<f64>) {
        self.points.push(point);
        let pressure = pressure.filter(|p| p.is_finite()).map(|p| p.clamp(0.0, 1.0));
        if pressure.is_none() && self.pressures.is_empty() {
            return;
        }
        self.pressures.resize(self.points.len() - 1, DEFAULT_PRESSURE);
        self.pressures.push(pressure.unwrap_or(DEFAULT_PRESSURE));
    }

    /// Simplify the path by removing redundant points.
    ///
    /// Pressures are kept for surviving points only.
    pub fn simplify(&mut self, tolerance: f64) {
        if self.points.len() < 3 {
            return;
        }
        let keep = rdp_simplify(&self.points, tolerance);
        if self.pressures.len() == self.points.len() {
            self.pressures = keep.iter().map(|&i| self.pressures[i]).collect();
        } else {
            self.pressures.clear();
        }
        self.points = keep.iter().map(|&i| self.points[i]).collect();
    }
}

/// Ramer-Douglas-Peucker line simplification. Returns the indices to keep.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<usize> {
    let mut keep = vec![0];
    rdp_range(points, 0, points.len() - 1, tolerance, &mut keep);
    keep
}

fn rdp_range(points: &[Point], start: usize, end: usize, tolerance: f64, keep: &mut Vec<usize>) {
    if end <= start + 1 {
        keep.push(end);
        return;
    }

    // Find point with maximum distance from line between first and last
    let mut max_dist = 0.0;
    let mut max_index = start;
    for i in start + 1..end {
        let dist = perpendicular_distance(points[i], points[start], points[end]);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        rdp_range(points, start, max_index, tolerance, keep);
        rdp_range(points, max_index, end, tolerance, keep);
    } else {
        keep.push(end);
    }
}

/// Calculate perpendicular distance from point to line.
fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;

    let line_len_sq = dx * dx + dy * dy;
    if line_len_sq < f64::EPSILON {
        // Line is a point
        return point.distance(line_start);
    }

    // Area of triangle * 2 / base = height
    let area2 = ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs();
    area2 / line_len_sq.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simplify() {
        let mut path = Freehand {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.1),
                Point::new(2.0, 0.0),
                Point::new(3.0, 0.1),
                Point::new(4.0, 0.0),
            ],
            pressures: vec![0.1, 0.2, 0.3, 0.4, 0.5],
            in_progress: false,
        };
        path.simplify(1.0);
        assert_eq!(path.points, vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
        assert_eq!(path.pressures, vec![0.1, 0.5]);
    }

    #[test]
    fn test_simplify_keeps_corners() {
        let mut path = Freehand {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 5.0),
                Point::new(10.0, 10.0),
            ],
            ..Freehand::default()
        };
        path.simplify(0.5);
        assert_eq!(
            path.points,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]
        );
    }

    #[test]
    fn test_push_point_keeps_pressures_aligned() {
        let mut path = Freehand::default();
        path.push_point(Point::new(1.0, 0.0), None);
        assert!(path.pressures.is_empty());

        path.push_point(Point::new(2.0, 0.0), Some(0.8));
        assert_eq!(path.pressures, vec![DEFAULT_PRESSURE, DEFAULT_PRESSURE, 0.8]);

        path.push_point(Point::new(3.0, 0.0), None);
        path.push_point(Point::new(4.0, 0.0), Some(7.0));
        assert_eq!(path.pressures.len(), path.points.len());
        assert_eq!(path.pressures[3..], [DEFAULT_PRESSURE, 1.0]);
    }

    #[test]
    fn test_mismatched_pressures_are_dropped() {
        let mut path = Freehand {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(2.0, 0.0)],
            pressures: vec![0.5],
            in_progress: false,
        };
        path.simplify(0.1);
        assert_eq!(path.points.len(), 2);
        assert!(path.pressures.is_empty());
    }
}
