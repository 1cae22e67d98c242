//! Hit-testing over a z-ordered layer sequence.
//!
//! Layers are stored bottom to top, so every search walks the slice from the
//! end and the topmost match wins.

use crate::shapes::Layer;
use kurbo::{Point, Rect};

/// Topmost non-deleted layer matching `predicate`.
pub fn find_layer_at<'a>(layers: &'a [Layer], mut predicate: impl FnMut(&Layer) -> bool) -> Option<&'a Layer> {
    layers
        .iter()
        .rev()
        .filter(|layer| !layer.deleted)
        .find(|layer| predicate(layer))
}

/// Topmost interactive layer under `point`.
pub fn layer_at_point(layers: &[Layer], point: Point, tolerance: f64) -> Option<&Layer> {
    find_layer_at(layers, |layer| layer.is_interactive() && layer.hit_test(point, tolerance))
}

/// All interactive layers under `point`, topmost first.
pub fn layers_at_point(layers: &[Layer], point: Point, tolerance: f64) -> Vec<&Layer> {
    layers
        .iter()
        .rev()
        .filter(|layer| layer.is_interactive() && layer.hit_test(point, tolerance))
        .collect()
}

/// Interactive layers whose bounds lie fully inside `rect`, bottom to top.
pub fn layers_in_rect(layers: &[Layer], rect: Rect) -> Vec<&Layer> {
    layers
        .iter()
        .filter(|layer| {
            let bounds = layer.bounds();
            layer.is_interactive() && rect.union(bounds) == rect
        })
        .collect()
}
