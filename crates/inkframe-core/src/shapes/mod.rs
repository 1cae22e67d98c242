//! Layer model.
//!
//! A [`Layer`] is one shape on the canvas: a shared attribute struct plus a
//! closed [`Shape`] union carrying the kind-specific data.

mod arrow;
mod diamond;
mod ellipse;
mod freehand;
mod image;
mod line;
mod rectangle;
mod text;

pub use arrow::{Arrow, Arrowhead};
pub use freehand::{DEFAULT_PRESSURE, Freehand};
pub use image::{Image, ImageStatus};
pub use line::Line;
pub use text::{FontFamily, Text, TextAlign};

use crate::geometry::{
    self, DEFAULT_ADAPTIVE_RADIUS, Frame, Handle, LinearEnd, ResizeOptions, Resized, SizeLimits,
};
use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

const EPSILON: f64 = 1e-9;

/// Arrowhead length at identity scale.
pub const ARROWHEAD_SIZE: f64 = 15.0;

/// Unique identifier for layers. Opaque text; freshly created layers use UUID v4.
pub type LayerId = String;

/// Generate a fresh layer id.
pub fn new_layer_id() -> LayerId {
    Uuid::new_v4().to_string()
}

/// Serializable color representation (RGBA8).
///
/// Persisted as `#rrggbb`, `#rrggbbaa`, or `transparent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    /// Hex form used in scene files.
    pub fn to_hex(&self) -> String {
        if *self == Self::transparent() {
            "transparent".to_string()
        } else if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

/// Error returned when a color string is not `#rgb`, `#rrggbb`, `#rrggbbaa` or `transparent`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color: {0}")]
pub struct ParseColorError(String);

impl FromStr for SerializableColor {
    type Err = ParseColorError;

    fn from_str(color: &str) -> Result<Self, Self::Err> {
        let color = color.trim();
        if color.eq_ignore_ascii_case("transparent") {
            return Ok(Self::transparent());
        }
        let invalid = || ParseColorError(color.to_string());
        let hex = color.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };
        match hex.len() {
            3 => {
                // #rgb -> #rrggbb
                let r = channel(0..1)? * 17;
                let g = channel(1..2)? * 17;
                let b = channel(2..3)? * 17;
                Ok(Self::new(r, g, b, 255))
            }
            6 => Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for SerializableColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SerializableColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Sloppiness level for the renderer's hand-drawn effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sloppiness {
    /// No roughness - clean, precise lines.
    Architect,
    /// Slight hand-drawn feel.
    #[default]
    Artist,
    /// Very sketchy, cartoon-like.
    Cartoonist,
}

impl Sloppiness {
    /// Get the roughness value for this sloppiness level.
    pub fn roughness(&self) -> f64 {
        match self {
            Sloppiness::Architect => 0.0,
            Sloppiness::Artist => 1.0,
            Sloppiness::Cartoonist => 2.0,
        }
    }

    /// Cycle to the next sloppiness level.
    pub fn next(self) -> Self {
        match self {
            Sloppiness::Architect => Sloppiness::Artist,
            Sloppiness::Artist => Sloppiness::Cartoonist,
            Sloppiness::Cartoonist => Sloppiness::Architect,
        }
    }
}

/// Fill pattern for closed shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStyle {
    #[default]
    Solid,
    Hachure,
    CrossHatch,
    Zigzag,
    Dots,
}

impl FillStyle {
    /// Cycle to the next fill style.
    pub fn next(self) -> Self {
        match self {
            FillStyle::Solid => FillStyle::Hachure,
            FillStyle::Hachure => FillStyle::CrossHatch,
            FillStyle::CrossHatch => FillStyle::Zigzag,
            FillStyle::Zigzag => FillStyle::Dots,
            FillStyle::Dots => FillStyle::Solid,
        }
    }
}

/// Stroke style for outlines, lines and arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokeStyle {
    /// Cycle to the next stroke style.
    pub fn next(self) -> Self {
        match self {
            StrokeStyle::Solid => StrokeStyle::Dashed,
            StrokeStyle::Dashed => StrokeStyle::Dotted,
            StrokeStyle::Dotted => StrokeStyle::Solid,
        }
    }
}

/// Style properties shared by every layer kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub stroke_color: SerializableColor,
    /// Fill color; `transparent` means the shape is an outline.
    pub background_color: SerializableColor,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub roughness: Sloppiness,
    /// 0 (invisible) to 100 (opaque).
    pub opacity: u8,
}

impl LayerStyle {
    pub fn is_filled(&self) -> bool {
        !self.background_color.is_transparent()
    }

    /// Get the stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Color {
        with_opacity(self.stroke_color, self.opacity)
    }

    /// Get the fill color with opacity applied, `None` for outlines.
    pub fn fill_with_opacity(&self) -> Option<Color> {
        self.is_filled()
            .then(|| with_opacity(self.background_color, self.opacity))
    }
}

fn with_opacity(color: SerializableColor, opacity: u8) -> Color {
    let alpha = (color.a as f64 * opacity.min(100) as f64 / 100.0).round() as u8;
    Color::from_rgba8(color.r, color.g, color.b, alpha)
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            stroke_color: SerializableColor::black(),
            background_color: SerializableColor::transparent(),
            fill_style: FillStyle::default(),
            stroke_width: 2.0,
            stroke_style: StrokeStyle::default(),
            roughness: Sloppiness::default(),
            opacity: 100,
        }
    }
}

/// Corner rounding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundnessKind {
    /// Radius is a fixed fraction of the shorter side.
    Proportional,
    /// Radius is fixed, shrinking only for small shapes.
    Adaptive,
}

/// Corner rounding applied to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Roundness {
    pub kind: RoundnessKind,
    /// Base radius for adaptive rounding (defaults to [`DEFAULT_ADAPTIVE_RADIUS`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Roundness {
    pub fn proportional() -> Self {
        Self {
            kind: RoundnessKind::Proportional,
            value: None,
        }
    }

    pub fn adaptive() -> Self {
        Self {
            kind: RoundnessKind::Adaptive,
            value: None,
        }
    }

    /// Default rounding for a kind, `None` when the kind can't be rounded.
    pub fn default_for(kind: ShapeKind) -> Option<Self> {
        if uses_proportional_radius(kind) {
            Some(Self::proportional())
        } else if uses_adaptive_radius(kind) {
            Some(Self::adaptive())
        } else {
            None
        }
    }
}

/// Shape kind without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeKind {
    Rectangle,
    Diamond,
    Ellipse,
    Line,
    Arrow,
    FreehandPath,
    Image,
    Text,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 8] = [
        ShapeKind::Rectangle,
        ShapeKind::Diamond,
        ShapeKind::Ellipse,
        ShapeKind::Line,
        ShapeKind::Arrow,
        ShapeKind::FreehandPath,
        ShapeKind::Image,
        ShapeKind::Text,
    ];

    /// Name used in the `type` field of scene files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Line => "line",
            ShapeKind::Arrow => "arrow",
            ShapeKind::FreehandPath => "freehand-path",
            ShapeKind::Image => "image",
            ShapeKind::Text => "text",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Kinds whose geometry lives in a point list rather than a box.
    pub fn is_point_based(&self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Arrow | ShapeKind::FreehandPath)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific layer data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Shape {
    Rectangle,
    Diamond,
    Ellipse,
    Line(Line),
    Arrow(Arrow),
    FreehandPath(Freehand),
    Image(Image),
    Text(Text),
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle => ShapeKind::Rectangle,
            Shape::Diamond => ShapeKind::Diamond,
            Shape::Ellipse => ShapeKind::Ellipse,
            Shape::Line(_) => ShapeKind::Line,
            Shape::Arrow(_) => ShapeKind::Arrow,
            Shape::FreehandPath(_) => ShapeKind::FreehandPath,
            Shape::Image(_) => ShapeKind::Image,
            Shape::Text(_) => ShapeKind::Text,
        }
    }

    /// Default data for a kind, used for fresh layers and import backfill.
    pub fn default_for(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Shape::Rectangle,
            ShapeKind::Diamond => Shape::Diamond,
            ShapeKind::Ellipse => Shape::Ellipse,
            ShapeKind::Line => Shape::Line(Line::default()),
            ShapeKind::Arrow => Shape::Arrow(Arrow::default()),
            ShapeKind::FreehandPath => Shape::FreehandPath(Freehand::default()),
            ShapeKind::Image => Shape::Image(Image::default()),
            ShapeKind::Text => Shape::Text(Text::default()),
        }
    }

    /// Points relative to the layer origin, for point-based kinds.
    pub fn points(&self) -> Option<&[Point]> {
        match self {
            Shape::Line(line) => Some(&line.points),
            Shape::Arrow(arrow) => Some(&arrow.points),
            Shape::FreehandPath(freehand) => Some(&freehand.points),
            _ => None,
        }
    }

    pub fn points_mut(&mut self) -> Option<&mut Vec<Point>> {
        match self {
            Shape::Line(line) => Some(&mut line.points),
            Shape::Arrow(arrow) => Some(&mut arrow.points),
            Shape::FreehandPath(freehand) => Some(&mut freehand.points),
            _ => None,
        }
    }
}

/// Stroke width scales with size for these kinds; the others bake a resize
/// into their geometry and keep an identity scale.
pub fn is_scalable(kind: ShapeKind) -> bool {
    matches!(
        kind,
        ShapeKind::Rectangle
            | ShapeKind::Diamond
            | ShapeKind::Ellipse
            | ShapeKind::Line
            | ShapeKind::Arrow
    )
}

pub fn uses_proportional_radius(kind: ShapeKind) -> bool {
    matches!(kind, ShapeKind::Line | ShapeKind::Arrow | ShapeKind::Diamond)
}

/// Rectangle-family kinds.
pub fn uses_adaptive_radius(kind: ShapeKind) -> bool {
    matches!(kind, ShapeKind::Rectangle | ShapeKind::Image)
}

/// Whether `layer` accepts rounding of the given kind.
pub fn can_apply_roundness(roundness: RoundnessKind, layer: &Layer) -> bool {
    match roundness {
        RoundnessKind::Proportional => uses_proportional_radius(layer.kind()),
        RoundnessKind::Adaptive => uses_adaptive_radius(layer.kind()),
    }
}

/// Whether text can be bound inside `layer`.
pub fn is_text_bindable_container(layer: &Layer, include_locked: bool) -> bool {
    let kind_ok = matches!(
        layer.kind(),
        ShapeKind::Rectangle | ShapeKind::Diamond | ShapeKind::Ellipse | ShapeKind::Arrow
    );
    kind_ok && (include_locked || !layer.locked)
}

/// Generate a seed for the renderer's hand-drawn effect (also used for version nonces).
/// Uses a simple counter + hash approach that works on all platforms.
pub fn generate_seed() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};

    static SEED_COUNTER: AtomicU32 = AtomicU32::new(1);

    let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    // splitmix32-style mixing
    let mut x = counter.wrapping_mul(0x9E3779B9);
    x ^= x >> 16;
    x = x.wrapping_mul(0x85EBCA6B);
    x ^= x >> 13;
    x = x.wrapping_mul(0xC2B2AE35);
    x ^= x >> 16;
    x
}

fn identity_scale() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

/// One shape on the canvas.
///
/// `x`/`y` are the top-left of the unrotated box for box kinds and the first
/// point for point-based kinds. Rotation is around the box center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    #[serde(flatten)]
    pub shape: Shape,
    pub name: Option<String>,
    pub seed: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    #[serde(flatten)]
    pub style: LayerStyle,
    pub roundness: Option<Roundness>,
    pub group_id: Option<String>,
    pub locked: bool,
    pub visible: bool,
    pub deleted: bool,
    pub version: u32,
    pub version_nonce: u32,
    /// Accumulated resize scale, identity for non-scalable kinds.
    pub scale: Vec2,
    #[serde(skip)]
    corner_radius: f64,
}

impl Layer {
    /// Create a layer with a fresh id and seed.
    pub fn new(shape: Shape, frame: Frame, style: LayerStyle) -> Self {
        let mut layer = Self {
            id: new_layer_id(),
            shape,
            name: None,
            seed: generate_seed(),
            x: frame.x,
            y: frame.y,
            width: frame.width,
            height: frame.height,
            angle: 0.0,
            style,
            roundness: None,
            group_id: None,
            locked: false,
            visible: true,
            deleted: false,
            version: 1,
            version_nonce: generate_seed(),
            scale: identity_scale(),
            corner_radius: 0.0,
        };
        layer.refresh_derived();
        layer
    }

    pub fn rectangle(frame: Frame) -> Self {
        Self::new(Shape::Rectangle, frame, LayerStyle::default())
    }

    pub fn diamond(frame: Frame) -> Self {
        Self::new(Shape::Diamond, frame, LayerStyle::default())
    }

    pub fn ellipse(frame: Frame) -> Self {
        Self::new(Shape::Ellipse, frame, LayerStyle::default())
    }

    /// Line through absolute points (at least one).
    pub fn line(points: &[Point]) -> Self {
        let mut layer = Self::new(Shape::Line(Line::default()), Frame::default(), LayerStyle::default());
        layer.set_absolute_points(points);
        layer
    }

    /// Arrow through absolute points (at least one), with an arrowhead at the end.
    pub fn arrow(points: &[Point]) -> Self {
        let mut layer = Self::new(Shape::Arrow(Arrow::default()), Frame::default(), LayerStyle::default());
        layer.set_absolute_points(points);
        layer
    }

    /// Freehand path starting at `origin`, marked as still being drawn.
    pub fn freehand(origin: Point) -> Self {
        let freehand = Freehand {
            in_progress: true,
            ..Freehand::default()
        };
        Self::new(
            Shape::FreehandPath(freehand),
            Frame::new(origin.x, origin.y, 0.0, 0.0),
            LayerStyle::default(),
        )
    }

    pub fn image(frame: Frame, file_id: impl Into<String>) -> Self {
        let image = Image {
            file_id: Some(file_id.into()),
            ..Image::default()
        };
        Self::new(Shape::Image(image), frame, LayerStyle::default())
    }

    /// Text at `position`. Width and height are estimated placeholders until
    /// the host reports a real layout.
    pub fn text(position: Point, content: impl Into<String>, font_size: f64) -> Self {
        let text = Text {
            text: content.into(),
            font_size,
            layout_pending: true,
            ..Text::default()
        };
        let size = text.estimate_size();
        Self::new(
            Shape::Text(text),
            Frame::new(position.x, position.y, size.width, size.height),
            LayerStyle::default(),
        )
    }

    /// Kind-default layer used to backfill missing fields on import.
    pub fn placeholder(kind: ShapeKind) -> Self {
        let frame = if kind.is_point_based() {
            Frame::default()
        } else {
            Frame::new(0.0, 0.0, 100.0, 100.0)
        };
        Self::new(Shape::default_for(kind), frame, LayerStyle::default())
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_roundness(mut self, roundness: Option<Roundness>) -> Self {
        self.roundness = roundness;
        self.refresh_derived();
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = geometry::normalize_angle(angle);
        self
    }

    /// Unrotated box. For point-based kinds this is the bounding box of the points.
    pub fn frame(&self) -> Frame {
        match self.shape.points().and_then(|pts| geometry::points_bounds(pts.iter().copied())) {
            Some(rel) => Frame::new(self.x + rel.x0, self.y + rel.y0, rel.width(), rel.height()),
            None => Frame::new(self.x, self.y, self.width, self.height),
        }
    }

    pub fn center(&self) -> Point {
        self.frame().center()
    }

    /// Axis-aligned bounds in world coordinates, accounting for rotation.
    pub fn bounds(&self) -> Rect {
        match self.absolute_points() {
            Some(points) if self.angle != 0.0 => {
                let center = self.center();
                geometry::points_bounds(
                    points
                        .into_iter()
                        .map(|p| geometry::rotate_point(p, center, self.angle)),
                )
                .unwrap_or_else(|| self.frame().to_rect())
            }
            Some(_) => self.frame().to_rect(),
            None => geometry::rotated_bounds(self.frame(), self.angle),
        }
    }

    /// Points in unrotated world coordinates, for point-based kinds.
    pub fn absolute_points(&self) -> Option<Vec<Point>> {
        let origin = Vec2::new(self.x, self.y);
        self.shape
            .points()
            .map(|pts| pts.iter().map(|p| *p + origin).collect())
    }

    /// Replace the point list from absolute points; the first point becomes the origin.
    pub fn set_absolute_points(&mut self, points: &[Point]) {
        let Some(&first) = points.first() else {
            return;
        };
        self.x = first.x;
        self.y = first.y;
        if let Some(pts) = self.shape.points_mut() {
            *pts = points.iter().map(|p| (*p - first).to_point()).collect();
        }
        self.refresh_derived();
    }

    /// Visible, unlocked and not tombstoned.
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked && !self.deleted
    }

    /// Check if a point (in world coordinates) hits this layer.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let frame = self.frame();
        let local = geometry::rotate_point(point, frame.center(), -self.angle);
        let stroke = self.effective_stroke_width();
        match &self.shape {
            Shape::Rectangle => rectangle::hit_test(frame, self.style.is_filled(), stroke, local, tolerance),
            Shape::Diamond => diamond::hit_test(frame, self.style.is_filled(), stroke, local, tolerance),
            Shape::Ellipse => ellipse::hit_test(frame, self.style.is_filled(), stroke, local, tolerance),
            Shape::Line(_) | Shape::Arrow(_) | Shape::FreehandPath(_) => {
                let points = self.absolute_points().unwrap_or_default();
                geometry::point_to_polyline_dist(local, &points) <= tolerance + stroke / 2.0
            }
            Shape::Image(_) | Shape::Text(_) => frame.to_rect().inflate(tolerance, tolerance).contains(local),
        }
    }

    /// Outline in unrotated world coordinates; apply [`Layer::transform`] to place it.
    pub fn to_path(&self) -> BezPath {
        let frame = self.frame();
        match &self.shape {
            Shape::Rectangle | Shape::Image(_) | Shape::Text(_) => rectangle::to_path(frame, self.corner_radius),
            Shape::Diamond => diamond::to_path(frame, self.corner_radius),
            Shape::Ellipse => ellipse::to_path(frame),
            Shape::Line(_) | Shape::FreehandPath(_) => line::polyline_path(&self.absolute_points().unwrap_or_default()),
            Shape::Arrow(arrow) => {
                let points = self.absolute_points().unwrap_or_default();
                let mut path = line::polyline_path(&points);
                let size = ARROWHEAD_SIZE * self.scale.x.abs().min(self.scale.y.abs());
                if let [first, second, ..] = points.as_slice() {
                    path.extend(arrow.start_arrowhead.path(*first, *second, size));
                }
                if let [.., before, last] = points.as_slice() {
                    path.extend(arrow.end_arrowhead.path(*last, *before, size));
                }
                path
            }
        }
    }

    /// Rotation around the box center.
    pub fn transform(&self) -> Affine {
        Affine::rotate_about(self.angle, self.center())
    }

    /// Effective corner radius, re-derived after every geometry change.
    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    /// Stroke width including the accumulated scale of scalable kinds.
    pub fn effective_stroke_width(&self) -> f64 {
        self.style.stroke_width * self.scale.x.abs().min(self.scale.y.abs())
    }

    /// For two-point lines and arrows, which endpoint `handle` drags.
    pub fn resolve_arrow_direction(&self, handle: Handle) -> Option<LinearEnd> {
        match &self.shape {
            Shape::Line(Line { points }) | Shape::Arrow(Arrow { points, .. }) if points.len() == 2 => {
                Some(geometry::resolve_arrow_direction(handle, points[1].to_vec2()))
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match &self.shape {
            Shape::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match &mut self.shape {
            Shape::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_freehand_mut(&mut self) -> Option<&mut Freehand> {
        match &mut self.shape {
            Shape::FreehandPath(freehand) => Some(freehand),
            _ => None,
        }
    }

    /// Freehand path the user is still drawing.
    pub fn is_stroke_in_progress(&self) -> bool {
        matches!(&self.shape, Shape::FreehandPath(f) if f.in_progress)
    }

    /// Move by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        if delta.x.is_finite() && delta.y.is_finite() {
            self.x += delta.x;
            self.y += delta.y;
        }
    }

    /// Record a mutation.
    pub fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
        self.version_nonce = generate_seed();
    }

    /// Apply a handle drag. Geometry only; the caller bumps the version.
    pub fn resize(&mut self, handle: Handle, delta: Vec2, options: ResizeOptions, limits: SizeLimits) -> Resized {
        let two_point = matches!(self.kind(), ShapeKind::Line | ShapeKind::Arrow)
            && self.shape.points().is_some_and(|pts| pts.len() == 2);
        if two_point {
            return self.drag_endpoint(handle, delta);
        }

        let before = self.frame();
        let limits = if self.kind().is_point_based() {
            limits.pin_empty_axes(&before)
        } else {
            limits
        };
        let resized = geometry::resize_frame(before, self.angle, handle, delta, options, limits);
        let after = resized.frame;

        let sx = if before.width.abs() > EPSILON { after.width / before.width } else { 1.0 };
        let sy = if before.height.abs() > EPSILON { after.height / before.height } else { 1.0 };

        if self.kind().is_point_based() {
            self.remap_points(before, &resized);
        } else {
            self.x = after.x;
            self.y = after.y;
            self.width = after.width;
            self.height = after.height;
        }

        if let Some(text) = self.as_text_mut() {
            if before.height.abs() > EPSILON {
                text.font_size *= sy;
            }
            text.layout_pending = false;
        }

        self.scale = if is_scalable(self.kind()) {
            Vec2::new(self.scale.x * sx, self.scale.y * sy)
        } else {
            identity_scale()
        };
        self.refresh_derived();
        resized
    }

    /// Move one endpoint of a two-point line, keeping the other fixed on screen.
    fn drag_endpoint(&mut self, handle: Handle, delta: Vec2) -> Resized {
        let before = self.frame();
        let (Some(end), Some(points)) = (self.resolve_arrow_direction(handle), self.absolute_points()) else {
            return Resized {
                frame: before,
                flipped_x: false,
                flipped_y: false,
                clamped: false,
            };
        };
        let delta = if delta.x.is_finite() && delta.y.is_finite() { delta } else { Vec2::ZERO };

        let center = before.center();
        let mut origin = geometry::rotate_point(points[0], center, self.angle);
        let mut tip = geometry::rotate_point(points[1], center, self.angle);
        match end {
            LinearEnd::Origin => origin += delta,
            LinearEnd::End => tip += delta,
        }

        let new_center = origin.midpoint(tip);
        let local_origin = geometry::rotate_point(origin, new_center, -self.angle);
        let local_tip = geometry::rotate_point(tip, new_center, -self.angle);
        self.set_absolute_points(&[local_origin, local_tip]);

        let before_span = points[1] - points[0];
        let after_span = local_tip - local_origin;
        Resized {
            frame: self.frame(),
            flipped_x: before_span.x * after_span.x < 0.0,
            flipped_y: before_span.y * after_span.y < 0.0,
            clamped: false,
        }
    }

    /// Map points from `before` into the resized frame, mirroring on flipped axes.
    fn remap_points(&mut self, before: Frame, resized: &Resized) {
        let Some(points) = self.absolute_points() else {
            return;
        };
        let after = resized.frame;
        let sx = if before.width.abs() > EPSILON { after.width / before.width } else { 1.0 };
        let sy = if before.height.abs() > EPSILON { after.height / before.height } else { 1.0 };
        let mapped: Vec<Point> = points
            .iter()
            .map(|p| {
                let mut u = p.x - before.x;
                let mut v = p.y - before.y;
                if resized.flipped_x {
                    u = before.width - u;
                }
                if resized.flipped_y {
                    v = before.height - v;
                }
                Point::new(after.x + u * sx, after.y + v * sy)
            })
            .collect();
        self.set_absolute_points(&mapped);
    }

    /// Recompute cached and derived values: point extents and corner radius.
    pub fn refresh_derived(&mut self) {
        if let Some(rel) = self.shape.points().and_then(|pts| geometry::points_bounds(pts.iter().copied())) {
            self.width = rel.width();
            self.height = rel.height();
        }
        let min_side = self.frame().min_side();
        self.corner_radius = match self.roundness {
            Some(r) if can_apply_roundness(r.kind, self) => match r.kind {
                RoundnessKind::Proportional => geometry::proportional_corner_radius(min_side),
                RoundnessKind::Adaptive => {
                    geometry::scaled_corner_radius(min_side, r.value.unwrap_or(DEFAULT_ADAPTIVE_RADIUS))
                }
            },
            _ => 0.0,
        };
    }

    /// Bring a layer from an untrusted source back within its invariants.
    ///
    /// Returns `true` when anything had to change.
    pub fn repair(&mut self, limits: SizeLimits) -> bool {
        let before = self.clone();

        if !self.x.is_finite() {
            self.x = 0.0;
        }
        if !self.y.is_finite() {
            self.y = 0.0;
        }
        self.angle = geometry::normalize_angle(self.angle);
        self.style.opacity = self.style.opacity.min(100);
        if !self.style.stroke_width.is_finite() || self.style.stroke_width < 0.0 {
            self.style.stroke_width = LayerStyle::default().stroke_width;
        }
        if !self.scale.x.is_finite() || !self.scale.y.is_finite() || self.scale.x == 0.0 || self.scale.y == 0.0 {
            self.scale = identity_scale();
        }
        if !is_scalable(self.kind()) {
            self.scale = identity_scale();
        }

        if let Some(points) = self.shape.points_mut() {
            points.retain(|p| p.x.is_finite() && p.y.is_finite());
            if points.is_empty() {
                points.push(Point::ZERO);
            }
            // The first point is the origin.
            let first = points[0].to_vec2();
            if first != Vec2::ZERO {
                for p in points.iter_mut() {
                    *p -= first;
                }
                self.x += first.x;
                self.y += first.y;
            }
        } else {
            let normalized = geometry::normalize_dimensions(self.frame());
            self.x = normalized.x;
            self.y = normalized.y;
            self.width = geometry::clamp_dimension(normalized.width, limits.min.width, limits.max.width);
            self.height = geometry::clamp_dimension(normalized.height, limits.min.height, limits.max.height);
        }

        if let Some(text) = self.as_text_mut() {
            if !text.font_size.is_finite() || text.font_size <= 0.0 {
                text.font_size = Text::default().font_size;
            }
        }

        self.refresh_derived();
        *self != before
    }
}
