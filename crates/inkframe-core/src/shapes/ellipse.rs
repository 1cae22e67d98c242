//! Ellipse inscribed in the layer box.

use crate::geometry::Frame;
use kurbo::{BezPath, Ellipse, Point, Shape as KurboShape};

/// Hit-test a point given in the ellipse's unrotated frame.
pub(super) fn hit_test(frame: Frame, filled: bool, stroke_width: f64, point: Point, tolerance: f64) -> bool {
    let center = frame.center();
    let radius_x = frame.width / 2.0;
    let radius_y = frame.height / 2.0;
    let half_sw = stroke_width / 2.0;

    let dx_outer = (point.x - center.x) / (radius_x + tolerance + half_sw);
    let dy_outer = (point.y - center.y) / (radius_y + tolerance + half_sw);
    if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
        return false;
    }
    if filled {
        return true;
    }
    // Outline only: reject if inside inner ellipse
    let inner_rx = (radius_x - tolerance - half_sw).max(0.0);
    let inner_ry = (radius_y - tolerance - half_sw).max(0.0);
    if inner_rx < f64::EPSILON || inner_ry < f64::EPSILON {
        return true;
    }
    let dx_inner = (point.x - center.x) / inner_rx;
    let dy_inner = (point.y - center.y) / inner_ry;
    dx_inner * dx_inner + dy_inner * dy_inner > 1.0
}

pub(super) fn to_path(frame: Frame) -> BezPath {
    Ellipse::from_rect(frame.to_rect()).to_path(0.1)
}
