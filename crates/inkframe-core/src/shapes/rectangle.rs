//! Rectangle outline and hit-testing.

use crate::geometry::Frame;
use kurbo::{BezPath, Point, RoundedRect, Shape as KurboShape};

/// Hit-test a point given in the rectangle's unrotated frame.
///
/// Filled rectangles hit anywhere inside the tolerance-inflated box; outlines
/// only hit within the border band.
pub(super) fn hit_test(frame: Frame, filled: bool, stroke_width: f64, point: Point, tolerance: f64) -> bool {
    let rect = frame.to_rect();
    if filled {
        return rect.inflate(tolerance, tolerance).contains(point);
    }
    let band = tolerance + stroke_width / 2.0;
    let outer = rect.inflate(band, band);
    let inner = rect.inflate(-band, -band);
    let inner_empty = inner.width() <= 0.0 || inner.height() <= 0.0;
    outer.contains(point) && (inner_empty || !inner.contains(point))
}

pub(super) fn to_path(frame: Frame, corner_radius: f64) -> BezPath {
    if corner_radius > 0.0 {
        RoundedRect::from_rect(frame.to_rect(), corner_radius).to_path(0.1)
    } else {
        frame.to_rect().to_path(0.1)
    }
}
