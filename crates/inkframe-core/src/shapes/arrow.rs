//! Arrows: lines with decorated ends.

use kurbo::{BezPath, Circle, Point, Shape as KurboShape};
use serde::{Deserialize, Serialize};

/// Decoration drawn at an arrow end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrowhead {
    #[default]
    None,
    Arrow,
    Bar,
    Dot,
    Triangle,
}

/// Arrow data. Points are relative to the layer origin; the first is `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrow {
    pub points: Vec<Point>,
    pub start_arrowhead: Arrowhead,
    pub end_arrowhead: Arrowhead,
}

impl Default for Arrow {
    fn default() -> Self {
        Self {
            points: vec![Point::ZERO, Point::new(100.0, 0.0)],
            start_arrowhead: Arrowhead::None,
            end_arrowhead: Arrowhead::Arrow,
        }
    }
}

impl Arrowhead {
    /// Outline of the head at `tip`, pointing away from `from`.
    pub fn path(self, tip: Point, from: Point, size: f64) -> BezPath {
        let mut path = BezPath::new();
        let dir = tip - from;
        let len = dir.hypot();
        if self == Arrowhead::None || len < f64::EPSILON {
            return path;
        }
        let dir = dir / len;
        let perp = dir.turn_90();
        let back = tip - dir * size;
        let left = back + perp * (size * 0.5);
        let right = back - perp * (size * 0.5);

        match self {
            Arrowhead::None => {}
            Arrowhead::Arrow => {
                path.move_to(left);
                path.line_to(tip);
                path.line_to(right);
            }
            Arrowhead::Triangle => {
                path.move_to(left);
                path.line_to(tip);
                path.line_to(right);
                path.close_path();
            }
            Arrowhead::Bar => {
                path.move_to(tip + perp * (size * 0.5));
                path.line_to(tip - perp * (size * 0.5));
            }
            Arrowhead::Dot => {
                path.extend(Circle::new(tip - dir * (size * 0.25), size * 0.25).path_elements(0.1));
            }
        }
        path
    }
}
