//! Geometry kernel.
//!
//! Pure functions for rotation-aware resizing, dimension normalization,
//! linear endpoint classification and corner rounding. Nothing in here
//! touches scene state.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Smallest committed width/height of a box-model layer.
pub const MIN_LAYER_SIZE: f64 = 1.0;

/// Largest committed width/height of a box-model layer.
pub const MAX_LAYER_SIZE: f64 = 32_767.0;

/// Fraction of the shorter side used for proportional corner rounding.
pub const PROPORTIONAL_RADIUS_FACTOR: f64 = 0.25;

/// Default adaptive corner radius in pixels.
/// A fixed radius keeps corners looking the same across element sizes.
pub const DEFAULT_ADAPTIVE_RADIUS: f64 = 32.0;

/// Below `base / ADAPTIVE_CUTOFF` the adaptive radius shrinks with the shape.
const ADAPTIVE_CUTOFF: f64 = 0.5;

const EPSILON: f64 = 1e-9;

/// Unrotated box of a layer.
///
/// Width and height may be negative while a drag is in progress; committed
/// frames are always normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Center of the box. Rotation always happens around this point.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned rect covering the unrotated box (normalized).
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }

    pub fn min_side(&self) -> f64 {
        self.width.abs().min(self.height.abs())
    }

    pub fn is_normalized(&self) -> bool {
        self.width >= 0.0 && self.height >= 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// Set of box edges being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sides {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Sides {
    pub const NONE: Sides = Sides {
        north: false,
        south: false,
        east: false,
        west: false,
    };

    pub fn new(north: bool, south: bool, east: bool, west: bool) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Whether an east or west edge is active.
    pub fn horizontal(self) -> bool {
        self.east || self.west
    }

    /// Whether a north or south edge is active.
    pub fn vertical(self) -> bool {
        self.north || self.south
    }

    /// Swap east/west and/or north/south.
    pub fn mirrored(self, flip_x: bool, flip_y: bool) -> Self {
        Self {
            north: if flip_y { self.south } else { self.north },
            south: if flip_y { self.north } else { self.south },
            east: if flip_x { self.west } else { self.east },
            west: if flip_x { self.east } else { self.west },
        }
    }

    /// Every active axis gets both of its edges, so resizing keeps the center fixed.
    pub fn symmetric(self) -> Self {
        let horizontal = self.horizontal();
        let vertical = self.vertical();
        Self::new(vertical, vertical, horizontal, horizontal)
    }

    /// Axes with no active edge become symmetric.
    fn or_centered(self) -> Self {
        let mut sides = self;
        if !sides.horizontal() {
            sides.east = true;
            sides.west = true;
        }
        if !sides.vertical() {
            sides.north = true;
            sides.south = true;
        }
        sides
    }
}

/// Compass resize handle on a layer's unrotated box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl Handle {
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
    ];

    /// Edges this handle drags.
    pub fn sides(self) -> Sides {
        match self {
            Handle::N => Sides::new(true, false, false, false),
            Handle::S => Sides::new(false, true, false, false),
            Handle::E => Sides::new(false, false, true, false),
            Handle::W => Sides::new(false, false, false, true),
            Handle::Ne => Sides::new(true, false, true, false),
            Handle::Nw => Sides::new(true, false, false, true),
            Handle::Se => Sides::new(false, true, true, false),
            Handle::Sw => Sides::new(false, true, false, true),
        }
    }

    pub fn is_corner(self) -> bool {
        matches!(self, Handle::Ne | Handle::Nw | Handle::Se | Handle::Sw)
    }

    /// Position on the unrotated box as fractions of width and height.
    pub fn anchor_fraction(self) -> (f64, f64) {
        match self {
            Handle::Nw => (0.0, 0.0),
            Handle::N => (0.5, 0.0),
            Handle::Ne => (1.0, 0.0),
            Handle::E => (1.0, 0.5),
            Handle::Se => (1.0, 1.0),
            Handle::S => (0.5, 1.0),
            Handle::Sw => (0.0, 1.0),
            Handle::W => (0.0, 0.5),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Handle::N => "n",
            Handle::S => "s",
            Handle::E => "e",
            Handle::W => "w",
            Handle::Ne => "ne",
            Handle::Nw => "nw",
            Handle::Se => "se",
            Handle::Sw => "sw",
        }
    }
}

/// Which endpoint of a two-point line a handle drags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinearEnd {
    Origin,
    End,
}

/// Shift a layer origin after a resize so the edges opposite `sides` stay
/// visually anchored despite rotation.
///
/// `near` holds half the displacement of the west/north box edges and `far`
/// half the displacement of the east/south edges, both measured with the
/// resized box still placed at `origin`. With opposite edges active
/// together the deltas add linearly, which keeps the center fixed at any
/// angle. With a single edge active the delta is projected through the
/// rotation.
pub fn adjust_for_rotation(sides: Sides, origin: Point, angle: f64, near: Vec2, far: Vec2) -> Point {
    let (sin, cos) = angle.sin_cos();
    let Point { mut x, mut y } = origin;

    if sides.east && sides.west {
        x += near.x + far.x;
    } else if sides.east {
        x += near.x * (1.0 + cos);
        y += near.x * sin;
        x += far.x * (1.0 - cos);
        y += far.x * -sin;
    } else if sides.west {
        x += near.x * (1.0 - cos);
        y += near.x * -sin;
        x += far.x * (1.0 + cos);
        y += far.x * sin;
    }

    if sides.north && sides.south {
        y += near.y + far.y;
    } else if sides.north {
        x += near.y * sin;
        y += near.y * (1.0 - cos);
        x += far.y * -sin;
        y += far.y * (1.0 + cos);
    } else if sides.south {
        x += near.y * -sin;
        y += near.y * (1.0 + cos);
        x += far.y * sin;
        y += far.y * (1.0 - cos);
    }

    Point::new(x, y)
}

/// Axis-aligned counterpart of [`adjust_for_rotation`].
pub fn adjust_axis_aligned(sides: Sides, origin: Point, near: Vec2, far: Vec2) -> Point {
    let Point { mut x, mut y } = origin;

    if sides.east && sides.west {
        x += near.x + far.x;
    } else if sides.east {
        x += near.x * 2.0;
    } else if sides.west {
        x += far.x * 2.0;
    }

    if sides.north && sides.south {
        y += near.y + far.y;
    } else if sides.north {
        y += far.y * 2.0;
    } else if sides.south {
        y += near.y * 2.0;
    }

    Point::new(x, y)
}

/// Flip negative extents into positive ones.
///
/// A negative width moves `x` left by `|width|`; height/`y` likewise. The
/// box center is preserved, so this commutes with rotation about the center.
pub fn normalize_dimensions(frame: Frame) -> Frame {
    let mut out = frame;
    if out.width < 0.0 {
        out.x -= out.width.abs();
        out.width = out.width.abs();
    }
    if out.height < 0.0 {
        out.y -= out.height.abs();
        out.height = out.height.abs();
    }
    out
}

/// Decide which endpoint of a two-point line a handle is dragging.
///
/// `second` is the end point relative to the origin. West handles take the
/// origin when the end lies to the right (or straight above/below), east
/// handles take the end in that case. `n`/`s` apply the same rule on `y`.
pub fn resolve_arrow_direction(handle: Handle, second: Vec2) -> LinearEnd {
    let origin_if = |cond: bool| if cond { LinearEnd::Origin } else { LinearEnd::End };
    match handle {
        Handle::Nw | Handle::Sw | Handle::W => origin_if(second.x >= 0.0),
        Handle::Ne | Handle::Se | Handle::E => origin_if(second.x < 0.0),
        Handle::N => origin_if(second.y >= 0.0),
        Handle::S => origin_if(second.y < 0.0),
    }
}

/// Adaptive corner radius: half the shorter side for small shapes, the
/// fixed base radius once the shape is large enough.
pub fn scaled_corner_radius(min_side: f64, base_radius: f64) -> f64 {
    if min_side <= base_radius / ADAPTIVE_CUTOFF {
        min_side * ADAPTIVE_CUTOFF
    } else {
        base_radius
    }
}

/// Proportional corner radius (a quarter of the shorter side).
pub fn proportional_corner_radius(min_side: f64) -> f64 {
    min_side * PROPORTIONAL_RADIUS_FACTOR
}

/// Clamp a committed dimension. Non-finite values collapse to `min`.
pub fn clamp_dimension(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() || value < min {
        min
    } else if value > max {
        max.max(min)
    } else {
        value
    }
}

/// Wrap an angle into `[0, 2π)`. Non-finite angles become `0`.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Rotate a point around `center`.
pub fn rotate_point(point: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return point;
    }
    Affine::rotate_about(angle, center) * point
}

/// Rotate a vector around the origin.
pub fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    if angle == 0.0 {
        return v;
    }
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Axis-aligned bounds of a frame rotated around its center.
pub fn rotated_bounds(frame: Frame, angle: f64) -> Rect {
    let rect = frame.to_rect();
    if angle == 0.0 {
        return rect;
    }
    let center = rect.center();
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    points_bounds(corners.iter().map(|p| rotate_point(*p, center, angle))).unwrap_or(rect)
}

/// Bounding rect of a point set, `None` when empty.
pub fn points_bounds(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut rect = Rect::from_points(first, first);
    for p in iter {
        rect = rect.union_pt(p);
    }
    Some(rect)
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => (point - *single).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Flags for a resize drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResizeOptions {
    /// Grow both opposite edges so the center stays fixed.
    #[serde(default)]
    pub from_center: bool,
    /// Preserve the width/height ratio.
    #[serde(default)]
    pub keep_aspect: bool,
}

/// Per-axis bounds applied when a resize is committed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub min: Size,
    pub max: Size,
}

impl SizeLimits {
    pub fn uniform(min: f64, max: f64) -> Self {
        Self {
            min: Size::new(min, min),
            max: Size::new(max, max),
        }
    }

    /// Pin axes on which `frame` has no extent to zero.
    ///
    /// Used for point-based shapes: a straight horizontal line has no height
    /// to scale, so none may be invented.
    pub fn pin_empty_axes(self, frame: &Frame) -> Self {
        let mut limits = self;
        if frame.width.abs() < EPSILON {
            limits.min.width = 0.0;
            limits.max.width = 0.0;
        }
        if frame.height.abs() < EPSILON {
            limits.min.height = 0.0;
            limits.max.height = 0.0;
        }
        limits
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self::uniform(MIN_LAYER_SIZE, MAX_LAYER_SIZE)
    }
}

/// Outcome of [`resize_frame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resized {
    /// Committed, normalized frame.
    pub frame: Frame,
    /// The drag pushed the box past its opposite vertical edge.
    pub flipped_x: bool,
    /// The drag pushed the box past its opposite horizontal edge.
    pub flipped_y: bool,
    /// A dimension had to be clamped into `limits`.
    pub clamped: bool,
}

/// Apply a handle drag to a rotated frame.
///
/// `delta` is the pointer displacement in world space. The drag is projected
/// into the frame's local axes, the transient (possibly negative) extents are
/// rotate-adjusted so the fixed edges stay put, then normalized and finally
/// clamped with the fixed edge re-anchored.
pub fn resize_frame(
    frame: Frame,
    angle: f64,
    handle: Handle,
    delta: Vec2,
    options: ResizeOptions,
    limits: SizeLimits,
) -> Resized {
    let angle = if angle.is_finite() { angle } else { 0.0 };
    let delta = if delta.x.is_finite() && delta.y.is_finite() {
        delta
    } else {
        Vec2::ZERO
    };
    let local = rotate_vec(delta, -angle);
    let dragged = handle.sides();

    let factor = if options.from_center { 2.0 } else { 1.0 };
    let mut width = frame.width;
    let mut height = frame.height;
    if dragged.east {
        width += local.x * factor;
    }
    if dragged.west {
        width -= local.x * factor;
    }
    if dragged.south {
        height += local.y * factor;
    }
    if dragged.north {
        height -= local.y * factor;
    }

    let mut sides = if options.from_center { dragged.symmetric() } else { dragged };

    if options.keep_aspect && frame.width.abs() > EPSILON && frame.height.abs() > EPSILON {
        let sx = width / frame.width;
        let sy = height / frame.height;
        let scale = match (dragged.horizontal(), dragged.vertical()) {
            (true, false) => sx,
            (false, true) => sy,
            _ => {
                if sx.abs() >= sy.abs() {
                    sx
                } else {
                    sy
                }
            }
        };
        width = frame.width * scale;
        height = frame.height * scale;
    }

    // An axis the handle does not drag but which still changed grows about its center.
    if width != frame.width && !sides.horizontal() {
        sides.east = true;
        sides.west = true;
    }
    if height != frame.height && !sides.vertical() {
        sides.north = true;
        sides.south = true;
    }

    let far = Vec2::new((frame.width - width) / 2.0, (frame.height - height) / 2.0);
    let origin = adjust_for_rotation(sides, frame.origin(), angle, Vec2::ZERO, far);
    let flipped_x = width < 0.0;
    let flipped_y = height < 0.0;
    let normalized = normalize_dimensions(Frame::new(origin.x, origin.y, width, height));

    let clamped_width = clamp_dimension(normalized.width, limits.min.width, limits.max.width);
    let clamped_height = clamp_dimension(normalized.height, limits.min.height, limits.max.height);
    let clamped = clamped_width != normalized.width || clamped_height != normalized.height;
    if !clamped {
        return Resized {
            frame: normalized,
            flipped_x,
            flipped_y,
            clamped,
        };
    }

    let anchor = sides.mirrored(flipped_x, flipped_y).or_centered();
    let far = Vec2::new(
        (normalized.width - clamped_width) / 2.0,
        (normalized.height - clamped_height) / 2.0,
    );
    let origin = adjust_for_rotation(anchor, normalized.origin(), angle, Vec2::ZERO, far);

    Resized {
        frame: Frame::new(origin.x, origin.y, clamped_width, clamped_height),
        flipped_x,
        flipped_y,
        clamped,
    }
}
