//! Straight and multi-segment lines.

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};

/// Line data. Points are relative to the layer origin; the first is `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub points: Vec<Point>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            points: vec![Point::ZERO, Point::new(100.0, 0.0)],
        }
    }
}

/// Open polyline through absolute points.
pub(super) fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some((first, rest)) = points.split_first() else {
        return path;
    };
    path.move_to(*first);
    for point in rest {
        path.line_to(*point);
    }
    path
}
