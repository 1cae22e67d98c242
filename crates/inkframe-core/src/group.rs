//! Ephemeral layer groups and viewport fitting.

use crate::shapes::{Layer, LayerId};
use kurbo::{Point, Rect, Size};

/// Transient aggregate of a layer subset. Never persisted; only the per-layer
/// `group_id` membership is.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub ids: Vec<LayerId>,
    pub bounds: Rect,
}

impl Group {
    /// Group the non-deleted layers among `ids`. `None` if none qualify.
    pub fn from_layers<S: AsRef<str>>(layers: &[Layer], ids: &[S]) -> Option<Self> {
        Self::collect(
            layers
                .iter()
                .filter(|layer| ids.iter().any(|id| id.as_ref() == layer.id)),
        )
    }

    /// Group every non-deleted layer.
    pub fn all(layers: &[Layer]) -> Option<Self> {
        Self::collect(layers.iter())
    }

    fn collect<'a>(layers: impl Iterator<Item = &'a Layer>) -> Option<Self> {
        let mut ids = Vec::new();
        let mut bounds: Option<Rect> = None;
        for layer in layers.filter(|layer| !layer.deleted) {
            ids.push(layer.id.clone());
            let b = layer.bounds();
            bounds = Some(bounds.map_or(b, |acc| acc.union(b)));
        }
        bounds.map(|bounds| Self { ids, bounds })
    }

    pub fn center(&self) -> Point {
        self.bounds.center()
    }
}

/// Result of fitting the viewport around the scene content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFit {
    /// Content bounds, rescaled to the export width when fitting for export.
    pub bounds: Rect,
    /// Factor applied to reach the export width (1 otherwise).
    pub scale: f64,
    /// Content plus padding on every side.
    pub canvas_size: Size,
}

impl ViewportFit {
    pub fn center(&self) -> Point {
        self.bounds.center()
    }
}

/// Fit all non-deleted layers. `None` for an empty scene.
pub fn fit_viewport(layers: &[Layer], padding: f64, for_export: bool, export_width: f64) -> Option<ViewportFit> {
    let group = Group::all(layers)?;
    let mut bounds = group.bounds;
    let mut scale = 1.0;
    if for_export && bounds.width() > f64::EPSILON && export_width.is_finite() && export_width > 0.0 {
        scale = export_width / bounds.width();
        bounds = Rect::from_origin_size(
            bounds.origin(),
            Size::new(export_width, bounds.height() * scale),
        );
    }
    let padding = if padding.is_finite() { padding.max(0.0) } else { 0.0 };
    let canvas_size = Size::new(bounds.width() + padding * 2.0, bounds.height() + padding * 2.0);
    Some(ViewportFit {
        bounds,
        scale,
        canvas_size,
    })
}
