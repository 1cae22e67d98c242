//! Scene store: the ordered layers of one open document.
//!
//! Index in [`Scene::layers`] is z-order; later layers paint above earlier
//! ones. All edits are explicit commands returning an outcome, and every
//! mutation bumps the touched layer's version.

use crate::codec::{self, CodecResult, ImportReport};
use crate::config::EngineConfig;
use crate::geometry::{self, Handle, ResizeOptions};
use crate::group::{self, Group, ViewportFit};
use crate::hit;
use crate::selection::{self, Selection};
use crate::shapes::{self, Layer, LayerId, LayerStyle, Roundness, RoundnessKind, ShapeKind};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};

/// Path simplification tolerance applied when a freehand stroke finishes.
pub const STROKE_SIMPLIFY_TOLERANCE: f64 = 0.5;

/// Result of a single-layer edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Applied,
    /// Applied, but degenerate input or size limits changed the result.
    Clamped,
    /// The layer is locked; nothing changed.
    Locked,
    /// No layer with that id; nothing changed.
    NotFound,
    /// The layer can't take this edit (wrong kind, invalid target).
    Rejected,
}

impl EditOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, EditOutcome::Applied | EditOutcome::Clamped)
    }
}

/// Result of [`Scene::remove`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub removed: Vec<LayerId>,
    /// Requested ids that don't exist.
    pub missing: Vec<LayerId>,
}

/// Document-level data persisted alongside the layers.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMetadata {
    pub format_version: u32,
    /// Timestamp of the export this scene was imported from.
    pub exported_at: Option<String>,
    /// Logical canvas dimensions, once established.
    pub canvas_size: Option<Size>,
}

impl Default for SceneMetadata {
    fn default() -> Self {
        Self {
            format_version: codec::CURRENT_VERSION,
            exported_at: None,
            canvas_size: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedFit {
    epoch: u64,
    for_export: bool,
    padding: f64,
    fit: ViewportFit,
}

/// One open document.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    layers: Vec<Layer>,
    pub metadata: SceneMetadata,
    selection: Selection,
    pub viewport: Viewport,
    config: EngineConfig,
    dimension_epoch: u64,
    cached_fit: Option<CachedFit>,
    active_stroke: Option<LayerId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Assemble a scene from already validated layers.
    pub(crate) fn from_parts(layers: Vec<Layer>, metadata: SceneMetadata, config: EngineConfig) -> Self {
        Self {
            layers,
            metadata,
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Layers in z-order, bottom first. Includes tombstoned layers.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.index_of(id).is_some()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Layers ready to paint, bottom first: not deleted and visible.
    pub fn render_list(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|layer| !layer.deleted && layer.visible)
    }

    /// Append a layer on top. Returns its id, which is fresh when the given
    /// one is empty or already taken.
    pub fn add(&mut self, mut layer: Layer) -> LayerId {
        if layer.id.is_empty() || self.contains_id(&layer.id) {
            if !layer.id.is_empty() {
                log::warn!("Layer id {} already in scene, assigning a fresh id", layer.id);
            }
            layer.id = shapes::new_layer_id();
        }
        if let Some(roundness) = layer.roundness.as_mut() {
            if roundness.kind == RoundnessKind::Adaptive
                && roundness.value.is_none()
                && self.config.adaptive_radius != geometry::DEFAULT_ADAPTIVE_RADIUS
            {
                roundness.value = Some(self.config.adaptive_radius);
            }
        }
        layer.repair(self.config.size_limits());

        let id = layer.id.clone();
        let select = !layer.is_stroke_in_progress();
        log::debug!("Adding {} layer {}", layer.kind(), id);
        self.layers.push(layer);
        if select {
            self.selection.set([id.clone()]);
        }
        id
    }

    /// Drag `handle` of a layer by a world-space `delta`.
    pub fn resize(&mut self, id: &str, handle: Handle, delta: Vec2) -> EditOutcome {
        self.resize_with(id, handle, delta, ResizeOptions::default())
    }

    pub fn resize_with(&mut self, id: &str, handle: Handle, delta: Vec2, options: ResizeOptions) -> EditOutcome {
        let limits = self.config.size_limits();
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) else {
            return EditOutcome::NotFound;
        };
        if layer.locked {
            return EditOutcome::Locked;
        }

        let frame = layer.frame();
        let (empty_w, empty_h) = (frame.width.abs() < f64::EPSILON, frame.height.abs() < f64::EPSILON);
        // Points-based layers may be flat on one axis; only a single point is degenerate.
        let zero_area = if layer.kind().is_point_based() {
            empty_w && empty_h
        } else {
            empty_w || empty_h
        };
        let degenerate = !delta.x.is_finite() || !delta.y.is_finite() || delta == Vec2::ZERO || zero_area;
        let before = layer.clone();
        let resized = layer.resize(handle, delta, options, limits);
        if *layer != before {
            layer.bump_version();
        }
        log::debug!("Resized layer {} via {} handle to {:?}", id, handle.as_str(), resized.frame);

        if resized.clamped || degenerate {
            EditOutcome::Clamped
        } else {
            EditOutcome::Applied
        }
    }

    /// Set a layer's rotation. Non-finite angles become `0`.
    pub fn rotate(&mut self, id: &str, angle: f64) -> EditOutcome {
        self.edit_unlocked(id, |layer| {
            layer.angle = geometry::normalize_angle(angle);
            if angle.is_finite() {
                EditOutcome::Applied
            } else {
                EditOutcome::Clamped
            }
        })
    }

    /// Rotate a layer so its top edge faces `cursor`, optionally snapping to 15°.
    pub fn rotate_towards(&mut self, id: &str, cursor: Point, snap: bool) -> EditOutcome {
        let Some(center) = self.layer(id).map(Layer::center) else {
            return EditOutcome::NotFound;
        };
        self.rotate(id, selection::rotation_towards(center, cursor, snap))
    }

    /// Translate layers by `delta`. Locked layers stay put.
    pub fn move_layers<S: AsRef<str>>(&mut self, ids: &[S], delta: Vec2) -> EditOutcome {
        if !delta.x.is_finite() || !delta.y.is_finite() {
            return EditOutcome::Rejected;
        }
        let mut found = false;
        let mut moved = false;
        for layer in self.layers.iter_mut() {
            if !ids.iter().any(|id| id.as_ref() == layer.id) {
                continue;
            }
            found = true;
            if layer.locked {
                continue;
            }
            layer.translate(delta);
            layer.bump_version();
            moved = true;
        }
        match (found, moved) {
            (false, _) => EditOutcome::NotFound,
            (true, false) => EditOutcome::Locked,
            (true, true) => EditOutcome::Applied,
        }
    }

    /// Apply a style edit to each listed layer.
    pub fn update_style<S: AsRef<str>>(&mut self, ids: &[S], mut edit: impl FnMut(&mut LayerStyle)) -> EditOutcome {
        let mut outcome = EditOutcome::NotFound;
        for layer in self.layers.iter_mut() {
            if !ids.iter().any(|id| id.as_ref() == layer.id) {
                continue;
            }
            edit(&mut layer.style);
            let repaired = layer.repair(self.config.size_limits());
            layer.bump_version();
            if outcome != EditOutcome::Clamped {
                outcome = if repaired { EditOutcome::Clamped } else { EditOutcome::Applied };
            }
        }
        outcome
    }

    /// Set or clear corner rounding. Rejected when the kind can't be rounded that way.
    pub fn set_roundness(&mut self, id: &str, roundness: Option<Roundness>) -> EditOutcome {
        let Some(index) = self.index_of(id) else {
            return EditOutcome::NotFound;
        };
        let layer = &mut self.layers[index];
        if let Some(r) = roundness {
            if !shapes::can_apply_roundness(r.kind, layer) {
                return EditOutcome::Rejected;
            }
        }
        layer.roundness = roundness;
        layer.refresh_derived();
        layer.bump_version();
        EditOutcome::Applied
    }

    /// Bind a text layer inside a container and center it there.
    pub fn bind_text(&mut self, text_id: &str, container_id: &str) -> EditOutcome {
        let (Some(text_index), Some(container_index)) = (self.index_of(text_id), self.index_of(container_id)) else {
            return EditOutcome::NotFound;
        };
        let container = &self.layers[container_index];
        if text_index == container_index || container.deleted || !shapes::is_text_bindable_container(container, false)
        {
            return EditOutcome::Rejected;
        }
        let center = container.center();
        let angle = container.angle;

        let text_layer = &mut self.layers[text_index];
        if text_layer.locked {
            return EditOutcome::Locked;
        }
        let Some(text) = text_layer.as_text_mut() else {
            return EditOutcome::Rejected;
        };
        text.container_id = Some(container_id.to_string());
        let offset = center - text_layer.center();
        text_layer.translate(offset);
        text_layer.angle = angle;
        text_layer.bump_version();
        EditOutcome::Applied
    }

    /// Record the measured size of a text layer, replacing its estimate.
    pub fn set_text_layout(&mut self, id: &str, size: Size) -> EditOutcome {
        let limits = self.config.size_limits();
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) else {
            return EditOutcome::NotFound;
        };
        let Some(text) = layer.as_text_mut() else {
            return EditOutcome::Rejected;
        };
        text.layout_pending = false;
        layer.width = size.width;
        layer.height = size.height;
        let clamped = layer.repair(limits);
        layer.bump_version();
        if clamped { EditOutcome::Clamped } else { EditOutcome::Applied }
    }

    fn edit_unlocked(&mut self, id: &str, edit: impl FnOnce(&mut Layer) -> EditOutcome) -> EditOutcome {
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) else {
            return EditOutcome::NotFound;
        };
        if layer.locked {
            return EditOutcome::Locked;
        }
        let outcome = edit(layer);
        if outcome.is_applied() {
            layer.bump_version();
        }
        outcome
    }

    /// Tombstone layers. Unknown ids are reported, not treated as errors.
    pub fn remove<S: AsRef<str>>(&mut self, ids: &[S]) -> RemoveReport {
        let mut report = RemoveReport::default();
        for id in ids {
            let id = id.as_ref();
            match self.layers.iter_mut().find(|layer| layer.id == id) {
                Some(layer) => {
                    if !layer.deleted {
                        layer.deleted = true;
                        layer.bump_version();
                    }
                    self.selection.remove(id);
                    if self.active_stroke.as_deref() == Some(id) {
                        self.active_stroke = None;
                    }
                    report.removed.push(id.to_string());
                }
                None => report.missing.push(id.to_string()),
            }
        }
        if !report.missing.is_empty() {
            log::debug!("Remove skipped unknown layers: {:?}", report.missing);
        }
        report
    }

    /// Union bounds of the listed, non-deleted layers.
    pub fn group_bbox<S: AsRef<str>>(&self, ids: &[S]) -> Option<Rect> {
        Group::from_layers(&self.layers, ids).map(|group| group.bounds)
    }

    /// Topmost interactive layer under a world point.
    pub fn layer_at_point(&self, point: Point) -> Option<&Layer> {
        hit::layer_at_point(&self.layers, point, self.config.hit_tolerance)
    }

    /// Replace the selection with the existing, non-deleted layers among `ids`.
    pub fn select<S: AsRef<str>>(&mut self, ids: &[S]) {
        let layers = &self.layers;
        self.selection.set(
            ids.iter()
                .filter(|id| layers.iter().any(|layer| layer.id == id.as_ref() && !layer.deleted))
                .map(|id| id.as_ref().to_string()),
        );
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Select the layer under `point`, expanded to its whole group.
    /// Clicking empty canvas clears the selection.
    pub fn select_at(&mut self, point: Point) -> Option<LayerId> {
        let Some(hit) = self.layer_at_point(point) else {
            self.selection.clear();
            return None;
        };
        let hit_id = hit.id.clone();
        let members: Vec<LayerId> = match &hit.group_id {
            Some(group_id) => self
                .layers
                .iter()
                .filter(|layer| !layer.deleted && layer.group_id.as_ref() == Some(group_id))
                .map(|layer| layer.id.clone())
                .collect(),
            None => vec![hit_id.clone()],
        };
        self.selection.set(members);
        Some(hit_id)
    }

    /// Put the selected unlocked layers into a new persisted group. Needs at
    /// least two of them; locked layers keep their membership.
    pub fn group_selection(&mut self) -> Option<String> {
        let eligible = |layer: &Layer| self.selection.contains(&layer.id) && !layer.deleted && !layer.locked;
        let members: Vec<usize> = (0..self.layers.len()).filter(|&i| eligible(&self.layers[i])).collect();
        if members.len() < 2 {
            return None;
        }
        let group_id = shapes::new_layer_id();
        for &index in &members {
            let layer = &mut self.layers[index];
            layer.group_id = Some(group_id.clone());
            layer.bump_version();
        }
        log::debug!("Grouped {} layers as {}", members.len(), group_id);
        Some(group_id)
    }

    /// Clear group membership of the selected layers. Returns how many changed.
    pub fn ungroup_selection(&mut self) -> usize {
        let mut count = 0;
        for layer in self.layers.iter_mut() {
            if self.selection.contains(&layer.id) && layer.group_id.take().is_some() {
                layer.bump_version();
                count += 1;
            }
        }
        count
    }

    /// Tombstone everything selected.
    pub fn delete_selection(&mut self) -> RemoveReport {
        let ids = self.selection.ids().to_vec();
        self.remove(ids.as_slice())
    }

    /// Move a layer to the top. Returns `false` if it was already there or doesn't exist.
    pub fn bring_to_front(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.layers.len() => {
                let mut layer = self.layers.remove(pos);
                layer.bump_version();
                self.layers.push(layer);
                true
            }
            _ => false,
        }
    }

    /// Move a layer to the bottom.
    pub fn send_to_back(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                let mut layer = self.layers.remove(pos);
                layer.bump_version();
                self.layers.insert(0, layer);
                true
            }
            _ => false,
        }
    }

    /// Move a layer one step towards the top.
    pub fn bring_forward(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(pos) if pos + 1 < self.layers.len() => {
                self.layers.swap(pos, pos + 1);
                self.layers[pos + 1].bump_version();
                true
            }
            _ => false,
        }
    }

    /// Move a layer one step towards the bottom.
    pub fn send_backward(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(pos) if pos > 0 => {
                self.layers.swap(pos, pos - 1);
                self.layers[pos - 1].bump_version();
                true
            }
            _ => false,
        }
    }

    /// Start a freehand stroke at `point`. Finishes any stroke still open.
    pub fn begin_stroke(&mut self, point: Point, pressure: Option<f64>, style: LayerStyle) -> LayerId {
        self.finish_stroke();
        let mut layer = Layer::freehand(point).with_style(style);
        if let (Some(pressure), Some(freehand)) = (pressure.filter(|p| p.is_finite()), layer.as_freehand_mut()) {
            freehand.pressures.push(pressure.clamp(0.0, 1.0));
        }
        let id = self.add(layer);
        self.active_stroke = Some(id.clone());
        id
    }

    /// Append a point to the open stroke.
    pub fn extend_stroke(&mut self, point: Point, pressure: Option<f64>) -> EditOutcome {
        if !point.x.is_finite() || !point.y.is_finite() {
            return EditOutcome::Rejected;
        }
        let Some(id) = self.active_stroke.clone() else {
            return EditOutcome::NotFound;
        };
        let Some(layer) = self.layers.iter_mut().find(|layer| layer.id == id) else {
            return EditOutcome::NotFound;
        };
        let origin = Vec2::new(layer.x, layer.y);
        let Some(freehand) = layer.as_freehand_mut() else {
            return EditOutcome::Rejected;
        };
        freehand.push_point(point - origin, pressure);
        layer.refresh_derived();
        layer.bump_version();
        EditOutcome::Applied
    }

    /// Close the open stroke, simplify it and select it.
    pub fn finish_stroke(&mut self) -> Option<LayerId> {
        let id = self.active_stroke.take()?;
        let layer = self.layers.iter_mut().find(|layer| layer.id == id)?;
        let freehand = layer.as_freehand_mut()?;
        freehand.in_progress = false;
        freehand.simplify(STROKE_SIMPLIFY_TOLERANCE);
        layer.refresh_derived();
        layer.bump_version();
        log::debug!("Finished stroke {} with {} points", id, layer.shape.points().map_or(0, <[Point]>::len));
        self.selection.set([id.clone()]);
        Some(id)
    }

    /// Fit the viewport around all non-deleted layers and establish the canvas size.
    ///
    /// The result is cached until [`Scene::reset_dimensions`]; repeated calls
    /// return it without touching the viewport.
    pub fn fit_viewport(&mut self, for_export: bool) -> Option<ViewportFit> {
        let padding = self.config.fit_padding;
        if let Some(cached) = self.cached_fit {
            if cached.epoch == self.dimension_epoch && cached.for_export == for_export && cached.padding == padding {
                return Some(cached.fit);
            }
        }
        let fit = group::fit_viewport(&self.layers, padding, for_export, self.config.export_width)?;
        self.viewport.zoom = 1.0;
        self.viewport.center_on(fit.center(), self.config.viewport_size);
        self.metadata.canvas_size = Some(fit.canvas_size);
        self.cached_fit = Some(CachedFit {
            epoch: self.dimension_epoch,
            for_export,
            padding,
            fit,
        });
        Some(fit)
    }

    /// The host re-established its dimensions; the next fit recomputes.
    pub fn reset_dimensions(&mut self, viewport_size: Size) {
        self.config.viewport_size = viewport_size;
        self.dimension_epoch += 1;
        self.cached_fit = None;
    }

    /// Replace this scene with an imported one. On error the scene is untouched.
    pub fn load(&mut self, bytes: &[u8]) -> CodecResult<ImportReport> {
        let imported = codec::import_with_report(bytes, self.config.clone())?;
        let viewport = self.viewport;
        let epoch = self.dimension_epoch + 1;
        *self = imported.scene;
        self.viewport = viewport;
        self.dimension_epoch = epoch;
        Ok(imported.report)
    }

    /// Number of layers of a kind that aren't tombstoned.
    pub fn count_kind(&self, kind: ShapeKind) -> usize {
        self.layers.iter().filter(|layer| !layer.deleted && layer.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::{DEFAULT_PRESSURE, SerializableColor, Shape};

    fn filled_rect(frame: Frame, name: &str) -> Layer {
        Layer::rectangle(frame).with_name(name).with_style(LayerStyle {
            background_color: SerializableColor::white(),
            ..LayerStyle::default()
        })
    }

    fn frame_of(scene: &Scene, id: &str) -> Frame {
        scene.layer(id).map(Layer::frame).unwrap_or_default()
    }

    #[test]
    fn test_add_selects_and_orders() {
        let mut scene = Scene::new();
        let a = scene.add(filled_rect(Frame::new(0.0, 0.0, 10.0, 10.0), "A"));
        let b = scene.add(filled_rect(Frame::new(0.0, 0.0, 10.0, 10.0), "B"));
        assert_eq!(scene.layers()[0].id, a);
        assert_eq!(scene.layers()[1].id, b);
        assert_eq!(scene.selection().ids(), [b]);
    }

    #[test]
    fn test_add_replaces_colliding_id() {
        let mut scene = Scene::new();
        let layer = Layer::rectangle(Frame::new(0.0, 0.0, 10.0, 10.0));
        let first = scene.add(layer.clone());
        let second = scene.add(layer);
        assert_ne!(first, second);

        let mut unnamed = Layer::ellipse(Frame::new(0.0, 0.0, 10.0, 10.0));
        unnamed.id.clear();
        assert!(!scene.add(unnamed).is_empty());
    }

    #[test]
    fn test_add_clamps_and_resets_scale() {
        let mut scene = Scene::new();
        let mut image = Layer::image(Frame::new(0.0, 0.0, 0.0, 50_000.0), "asset");
        image.scale = Vec2::new(3.0, 3.0);
        let id = scene.add(image);
        let layer = scene.layer(&id).unwrap();
        assert_eq!(layer.width, 1.0);
        assert_eq!(layer.height, 32_767.0);
        assert_eq!(layer.scale, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_z_order_hit_returns_topmost() {
        let mut scene = Scene::new();
        scene.add(filled_rect(Frame::new(0.0, 0.0, 100.0, 100.0), "A"));
        scene.add(filled_rect(Frame::new(10.0, 10.0, 100.0, 100.0), "B"));
        let c = scene.add(filled_rect(Frame::new(20.0, 20.0, 100.0, 100.0), "C"));
        assert_eq!(scene.layer_at_point(Point::new(50.0, 50.0)).map(|l| l.id.clone()), Some(c.clone()));

        assert!(scene.send_to_back(&c));
        let top = scene.layer_at_point(Point::new(50.0, 50.0)).and_then(|l| l.name.clone());
        assert_eq!(top.as_deref(), Some("B"));
        assert!(!scene.send_to_back(&c));
        assert!(scene.bring_forward(&c));
        assert_eq!(scene.layers()[1].id, c);
        assert!(scene.bring_to_front(&c));
        assert_eq!(scene.layers()[2].id, c);
        assert!(scene.send_backward(&c));
        assert_eq!(scene.layers()[1].id, c);
        assert!(!scene.bring_forward("missing"));
    }

    #[test]
    fn test_resize_scenario_flips_and_normalizes() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0)));
        let version = scene.layer(&id).map(|l| l.version);
        assert_eq!(scene.resize(&id, Handle::Se, Vec2::new(-20.0, -20.0)), EditOutcome::Applied);
        assert_eq!(scene.resize(&id, Handle::Se, Vec2::new(-20.0, -20.0)), EditOutcome::Applied);
        assert_eq!(frame_of(&scene, &id), Frame::new(0.0, 0.0, 60.0, 60.0));
        assert!(scene.layer(&id).map(|l| l.version) > version);

        scene.resize(&id, Handle::Se, Vec2::new(-120.0, -120.0));
        let frame = frame_of(&scene, &id);
        assert!(frame.width >= 0.0 && frame.height >= 0.0);
        assert!((frame.x + 60.0).abs() < 1e-9 && (frame.width - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_below_minimum_is_clamped() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0)));
        let outcome = scene.resize(&id, Handle::E, Vec2::new(-99.5, 0.0));
        assert_eq!(outcome, EditOutcome::Clamped);
        let frame = frame_of(&scene, &id);
        assert_eq!(frame.width, 1.0);
        assert_eq!(frame.x, 0.0);
    }

    #[test]
    fn test_resize_degenerate_input() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(scene.resize(&id, Handle::E, Vec2::new(f64::NAN, 1.0)), EditOutcome::Clamped);
        assert_eq!(scene.resize(&id, Handle::E, Vec2::ZERO), EditOutcome::Clamped);
        let frame = frame_of(&scene, &id);
        assert!(frame.width.is_finite() && (frame.width - 100.0).abs() < 1e-9);
        assert_eq!(scene.resize("nope", Handle::E, Vec2::new(1.0, 1.0)), EditOutcome::NotFound);
    }

    #[test]
    fn test_flat_line_endpoint_drag_is_applied() {
        let mut scene = Scene::new();
        let line = scene.add(Layer::line(&[Point::new(0.0, 0.0), Point::new(100.0, 0.0)]));
        assert_eq!(scene.resize(&line, Handle::E, Vec2::new(20.0, 0.0)), EditOutcome::Applied);
        assert_eq!(frame_of(&scene, &line), Frame::new(0.0, 0.0, 120.0, 0.0));

        let arrow = scene.add(Layer::arrow(&[Point::new(0.0, 50.0), Point::new(0.0, 90.0)]));
        assert_eq!(scene.resize(&arrow, Handle::S, Vec2::new(0.0, 10.0)), EditOutcome::Applied);
        assert_eq!(frame_of(&scene, &arrow), Frame::new(0.0, 50.0, 0.0, 50.0));
    }

    #[test]
    fn test_locked_layer_refuses_transforms() {
        let mut scene = Scene::new();
        let mut layer = Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0));
        layer.locked = true;
        let id = scene.add(layer);
        let before = scene.layer(&id).cloned();
        assert_eq!(scene.resize(&id, Handle::Se, Vec2::new(10.0, 10.0)), EditOutcome::Locked);
        assert_eq!(scene.rotate(&id, 1.0), EditOutcome::Locked);
        assert_eq!(scene.move_layers(&[&id], Vec2::new(5.0, 5.0)), EditOutcome::Locked);
        assert_eq!(scene.layer(&id).cloned(), before);
        // Still renders.
        assert_eq!(scene.render_list().count(), 1);
    }

    #[test]
    fn test_rotate_and_move() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0)));
        assert_eq!(scene.rotate(&id, f64::INFINITY), EditOutcome::Clamped);
        assert_eq!(scene.layer(&id).map(|l| l.angle), Some(0.0));
        assert_eq!(
            scene.rotate_towards(&id, Point::new(150.0, 50.0), true),
            EditOutcome::Applied
        );
        let angle = scene.layer(&id).map(|l| l.angle).unwrap_or_default();
        assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-9);

        assert_eq!(scene.move_layers(&[&id], Vec2::new(5.0, -5.0)), EditOutcome::Applied);
        assert_eq!(frame_of(&scene, &id).origin(), Point::new(5.0, -5.0));
        assert_eq!(scene.move_layers(&["missing"], Vec2::new(1.0, 1.0)), EditOutcome::NotFound);
    }

    #[test]
    fn test_remove_reports_missing() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 10.0, 10.0)));
        let report = scene.remove(&[id.as_str(), "ghost"]);
        assert_eq!(report.removed, vec![id.clone()]);
        assert_eq!(report.missing, vec!["ghost".to_string()]);
        assert!(scene.selection().is_empty());
        assert!(scene.layer(&id).is_some_and(|l| l.deleted));
        assert_eq!(scene.render_list().count(), 0);
        assert!(scene.layer_at_point(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_group_select_and_delete() {
        let mut scene = Scene::new();
        let a = scene.add(filled_rect(Frame::new(0.0, 0.0, 10.0, 10.0), "A"));
        let b = scene.add(filled_rect(Frame::new(100.0, 100.0, 10.0, 10.0), "B"));
        scene.add(filled_rect(Frame::new(300.0, 300.0, 10.0, 10.0), "C"));

        scene.select(&[&a, &b]);
        let group_id = scene.group_selection();
        assert!(group_id.is_some());
        assert_eq!(scene.group_bbox(&[&a, &b]), Some(Rect::new(0.0, 0.0, 110.0, 110.0)));

        scene.clear_selection();
        assert_eq!(scene.select_at(Point::new(5.0, 5.0)), Some(a.clone()));
        assert_eq!(scene.selection().len(), 2);

        let report = scene.delete_selection();
        assert_eq!(report.removed.len(), 2);
        assert_eq!(scene.render_list().count(), 1);
    }

    #[test]
    fn test_group_selection_skips_locked_layers() {
        let mut scene = Scene::new();
        let a = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 10.0, 10.0)));
        let b = scene.add(Layer::rectangle(Frame::new(20.0, 0.0, 10.0, 10.0)));
        let mut pinned = Layer::rectangle(Frame::new(40.0, 0.0, 10.0, 10.0));
        pinned.locked = true;
        let c = scene.add(pinned);

        scene.select(&[&a, &b, &c]);
        let group_id = scene.group_selection();
        assert!(group_id.is_some());
        assert_eq!(scene.layer(&a).and_then(|l| l.group_id.clone()), group_id);
        assert_eq!(scene.layer(&b).and_then(|l| l.group_id.clone()), group_id);
        assert!(scene.layer(&c).is_some_and(|l| l.group_id.is_none()));

        // One unlocked layer is not enough for a group.
        scene.select(&[&a, &c]);
        scene.ungroup_selection();
        assert!(scene.group_selection().is_none());
    }

    #[test]
    fn test_ungroup_selection() {
        let mut scene = Scene::new();
        let a = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 10.0, 10.0)));
        let b = scene.add(Layer::rectangle(Frame::new(20.0, 0.0, 10.0, 10.0)));
        scene.select(&[&a, &b]);
        scene.group_selection();
        assert_eq!(scene.ungroup_selection(), 2);
        assert!(scene.layers().iter().all(|l| l.group_id.is_none()));

        scene.select(&[&a]);
        assert!(scene.group_selection().is_none());
    }

    #[test]
    fn test_select_at_empty_clears() {
        let mut scene = Scene::new();
        scene.add(filled_rect(Frame::new(0.0, 0.0, 10.0, 10.0), "A"));
        assert!(scene.select_at(Point::new(500.0, 500.0)).is_none());
        assert!(scene.selection().is_empty());
    }

    #[test]
    fn test_update_style_and_roundness() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::ellipse(Frame::new(0.0, 0.0, 10.0, 10.0)));
        let outcome = scene.update_style(&[&id], |style| style.opacity = 40);
        assert_eq!(outcome, EditOutcome::Applied);
        assert_eq!(scene.layer(&id).map(|l| l.style.opacity), Some(40));
        assert_eq!(
            scene.update_style(&[&id], |style| style.opacity = 200),
            EditOutcome::Clamped
        );
        assert_eq!(scene.layer(&id).map(|l| l.style.opacity), Some(100));

        assert_eq!(scene.set_roundness(&id, Some(Roundness::adaptive())), EditOutcome::Rejected);
        let rect = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 40.0, 40.0)));
        assert_eq!(scene.set_roundness(&rect, Some(Roundness::adaptive())), EditOutcome::Applied);
        assert_eq!(scene.layer(&rect).map(Layer::corner_radius), Some(20.0));
    }

    #[test]
    fn test_bind_text_centers_in_container() {
        let mut scene = Scene::new();
        let container = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 200.0, 100.0)));
        let text = scene.add(Layer::text(Point::new(500.0, 500.0), "hi", 20.0));
        let line = scene.add(Layer::line(&[Point::ZERO, Point::new(10.0, 0.0)]));

        assert_eq!(scene.bind_text(&text, &container), EditOutcome::Applied);
        let layer = scene.layer(&text).unwrap();
        assert_eq!(layer.as_text().and_then(|t| t.container_id.clone()), Some(container.clone()));
        let center = layer.center();
        assert!((center.x - 100.0).abs() < 1e-9 && (center.y - 50.0).abs() < 1e-9);

        assert_eq!(scene.bind_text(&text, &line), EditOutcome::Rejected);
        assert_eq!(scene.bind_text(&container, &container), EditOutcome::Rejected);
        assert_eq!(scene.bind_text(&text, "ghost"), EditOutcome::NotFound);
    }

    #[test]
    fn test_text_layout_clears_pending() {
        let mut scene = Scene::new();
        let id = scene.add(Layer::text(Point::ZERO, "hello", 20.0));
        assert!(scene.layer(&id).and_then(Layer::as_text).is_some_and(|t| t.layout_pending));
        assert_eq!(scene.set_text_layout(&id, Size::new(48.0, 24.0)), EditOutcome::Applied);
        let layer = scene.layer(&id).unwrap();
        assert_eq!((layer.width, layer.height), (48.0, 24.0));
        assert!(!layer.as_text().is_some_and(|t| t.layout_pending));
    }

    #[test]
    fn test_freehand_stroke_lifecycle() {
        let mut scene = Scene::new();
        let id = scene.begin_stroke(Point::new(10.0, 10.0), None, LayerStyle::default());
        assert!(scene.selection().is_empty());
        for i in 1..=10 {
            let x = 10.0 + i as f64;
            assert_eq!(scene.extend_stroke(Point::new(x, 10.0), Some(0.5)), EditOutcome::Applied);
        }
        assert_eq!(scene.extend_stroke(Point::new(f64::NAN, 0.0), None), EditOutcome::Rejected);
        assert_eq!(scene.finish_stroke(), Some(id.clone()));
        assert_eq!(scene.selection().ids(), [id.clone()]);

        let layer = scene.layer(&id).unwrap();
        assert!(!layer.is_stroke_in_progress());
        // A straight stroke simplifies down to its endpoints.
        assert_eq!(layer.shape.points().map(<[Point]>::len), Some(2));
        assert_eq!(layer.frame(), Frame::new(10.0, 10.0, 10.0, 0.0));
        assert_eq!(scene.extend_stroke(Point::new(0.0, 0.0), None), EditOutcome::NotFound);
        assert_eq!(scene.finish_stroke(), None);
    }

    #[test]
    fn test_stroke_pressures_survive_finish_and_export() {
        let mut scene = Scene::new();
        let id = scene.begin_stroke(Point::new(0.0, 0.0), Some(0.4), LayerStyle::default());
        scene.extend_stroke(Point::new(10.0, 0.0), Some(0.2));
        scene.extend_stroke(Point::new(10.0, 10.0), Some(0.9));
        scene.finish_stroke();

        let pressures = |scene: &Scene| match scene.layer(&id).map(|l| &l.shape) {
            Some(Shape::FreehandPath(freehand)) => Some((freehand.points.len(), freehand.pressures.clone())),
            _ => None,
        };
        assert_eq!(pressures(&scene), Some((3, vec![0.4, 0.2, 0.9])));

        let restored = codec::import(&codec::export(&scene).unwrap()).unwrap();
        assert_eq!(pressures(&restored), Some((3, vec![0.4, 0.2, 0.9])));
    }

    #[test]
    fn test_stroke_pressure_gaps_are_filled() {
        let mut scene = Scene::new();
        let id = scene.begin_stroke(Point::new(0.0, 0.0), None, LayerStyle::default());
        scene.extend_stroke(Point::new(10.0, 0.0), None);
        scene.extend_stroke(Point::new(10.0, 10.0), Some(0.8));
        scene.extend_stroke(Point::new(0.0, 10.0), None);
        scene.finish_stroke();

        let Some(Shape::FreehandPath(freehand)) = scene.layer(&id).map(|l| &l.shape) else {
            panic!("stroke is not a freehand path");
        };
        assert_eq!(freehand.points.len(), 4);
        assert_eq!(freehand.pressures, vec![DEFAULT_PRESSURE, DEFAULT_PRESSURE, 0.8, DEFAULT_PRESSURE]);
    }

    #[test]
    fn test_fit_viewport_is_cached_per_epoch() {
        let mut scene = Scene::with_config(EngineConfig {
            fit_padding: 10.0,
            viewport_size: Size::new(800.0, 600.0),
            ..EngineConfig::default()
        });
        let id = scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0)));
        let fit = scene.fit_viewport(false).unwrap();
        assert_eq!(scene.metadata.canvas_size, Some(Size::new(120.0, 120.0)));
        assert_eq!(scene.viewport.world_to_screen(Point::new(50.0, 50.0)), Point::new(400.0, 300.0));

        scene.move_layers(&[&id], Vec2::new(500.0, 0.0));
        scene.viewport.pan(Vec2::new(7.0, 7.0));
        assert_eq!(scene.fit_viewport(false), Some(fit));
        assert_eq!(scene.viewport.offset, Vec2::new(357.0, 257.0));

        scene.reset_dimensions(Size::new(800.0, 600.0));
        let refit = scene.fit_viewport(false).unwrap();
        assert_eq!(refit.center(), Point::new(550.0, 50.0));
    }

    #[test]
    fn test_fit_empty_scene() {
        let mut scene = Scene::new();
        assert!(scene.fit_viewport(true).is_none());
        assert!(scene.metadata.canvas_size.is_none());
    }

    #[test]
    fn test_count_kind_skips_deleted() {
        let mut scene = Scene::new();
        let a = scene.add(Layer::ellipse(Frame::new(0.0, 0.0, 10.0, 10.0)));
        scene.add(Layer::ellipse(Frame::new(0.0, 0.0, 10.0, 10.0)));
        scene.remove(&[&a]);
        assert_eq!(scene.count_kind(ShapeKind::Ellipse), 1);
    }
}
