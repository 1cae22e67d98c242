//! Diamond (rhombus inscribed in the layer box).

use crate::geometry::{self, Frame};
use kurbo::{BezPath, Point};

/// Vertices in top, right, bottom, left order.
pub(super) fn vertices(frame: Frame) -> [Point; 4] {
    let c = frame.center();
    [
        Point::new(c.x, frame.y),
        Point::new(frame.x + frame.width, c.y),
        Point::new(c.x, frame.y + frame.height),
        Point::new(frame.x, c.y),
    ]
}

fn contains(frame: Frame, point: Point) -> bool {
    let c = frame.center();
    let hw = frame.width / 2.0;
    let hh = frame.height / 2.0;
    if hw <= 0.0 || hh <= 0.0 {
        return false;
    }
    (point.x - c.x).abs() / hw + (point.y - c.y).abs() / hh <= 1.0
}

/// Hit-test a point given in the diamond's unrotated frame.
pub(super) fn hit_test(frame: Frame, filled: bool, stroke_width: f64, point: Point, tolerance: f64) -> bool {
    if filled && contains(frame, point) {
        return true;
    }
    let [top, right, bottom, left] = vertices(frame);
    let outline = [top, right, bottom, left, top];
    geometry::point_to_polyline_dist(point, &outline) <= tolerance + stroke_width / 2.0
}

pub(super) fn to_path(frame: Frame, corner_radius: f64) -> BezPath {
    let verts = vertices(frame);
    let mut path = BezPath::new();
    if corner_radius <= 0.0 {
        path.move_to(verts[0]);
        for v in &verts[1..] {
            path.line_to(*v);
        }
        path.close_path();
        return path;
    }

    // Cut each corner back along both edges and round it with a quad.
    let cut = |from: Point, to: Point| {
        let edge = to - from;
        let len = edge.hypot();
        if len <= f64::EPSILON {
            from
        } else {
            from + edge * (corner_radius.min(len / 2.0) / len)
        }
    };
    for i in 0..4 {
        let prev = verts[(i + 3) % 4];
        let corner = verts[i];
        let next = verts[(i + 1) % 4];
        let start = cut(corner, prev);
        let end = cut(corner, next);
        if i == 0 {
            path.move_to(start);
        } else {
            path.line_to(start);
        }
        path.quad_to(corner, end);
    }
    path.close_path();
    path
}
