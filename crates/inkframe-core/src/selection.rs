//! Selection set and manipulation handles.

use crate::geometry::{self, Handle};
use crate::shapes::{Layer, LayerId};
use kurbo::{Point, Vec2};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 16.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 24.0;
/// Distance from shape edge to rotation handle (in world units).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;
/// Rotation snap increment (15°).
pub const ROTATION_SNAP: f64 = std::f64::consts::PI / 12.0;

/// Currently selected layers, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<LayerId>,
}

impl Selection {
    pub fn ids(&self) -> &[LayerId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    /// Add `id` if it isn't selected yet.
    pub fn insert(&mut self, id: LayerId) {
        if !self.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|selected| selected != id);
        self.ids.len() != before
    }

    /// Replace the selection.
    pub fn set(&mut self, ids: impl IntoIterator<Item = LayerId>) {
        self.ids.clear();
        for id in ids {
            self.insert(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// What a handle does when dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    Resize(Handle),
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleMarker {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl HandleMarker {
    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Handles for a layer: eight resize handles on its rotated box plus a
/// rotation handle above the top edge. Locked layers have none.
pub fn handles(layer: &Layer) -> Vec<HandleMarker> {
    if layer.locked {
        return Vec::new();
    }
    let frame = layer.frame();
    let center = frame.center();
    let place = |local: Point| geometry::rotate_point(local, center, layer.angle);

    let mut markers: Vec<HandleMarker> = Handle::ALL
        .into_iter()
        .map(|handle| {
            let (fx, fy) = handle.anchor_fraction();
            HandleMarker {
                position: place(Point::new(frame.x + frame.width * fx, frame.y + frame.height * fy)),
                kind: HandleKind::Resize(handle),
            }
        })
        .collect();
    markers.push(HandleMarker {
        position: place(Point::new(center.x, frame.y - ROTATE_HANDLE_OFFSET)),
        kind: HandleKind::Rotate,
    });
    markers
}

/// Find which handle (if any) is hit at the given point.
///
/// Corners are tested before edges so small shapes stay resizable diagonally.
pub fn hit_test_handles(layer: &Layer, point: Point, tolerance: f64) -> Option<HandleKind> {
    let markers = handles(layer);
    let is_corner = |marker: &&HandleMarker| matches!(marker.kind, HandleKind::Resize(h) if h.is_corner());
    markers
        .iter()
        .filter(is_corner)
        .chain(markers.iter().filter(|m| !is_corner(m)))
        .find(|marker| marker.hit_test(point, tolerance))
        .map(|marker| marker.kind)
}

/// Angle that points a layer's top edge at `cursor`.
pub fn rotation_towards(center: Point, cursor: Point, snap: bool) -> f64 {
    let Vec2 { x: dx, y: dy } = cursor - center;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    // Offset so 0 is straight up
    let mut angle = dy.atan2(dx) + std::f64::consts::FRAC_PI_2;
    if snap {
        angle = (angle / ROTATION_SNAP).round() * ROTATION_SNAP;
    }
    geometry::normalize_angle(angle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_selection_dedupes_and_keeps_order() {
        let mut selection = Selection::default();
        selection.insert("b".to_string());
        selection.insert("a".to_string());
        selection.insert("b".to_string());
        assert_eq!(selection.ids(), ["b".to_string(), "a".to_string()]);
        assert!(selection.remove("b"));
        assert!(!selection.remove("b"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn test_handles_follow_rotation() {
        let layer = Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 50.0)).with_angle(PI);
        let markers = handles(&layer);
        assert_eq!(markers.len(), 9);
        let se = markers
            .iter()
            .find(|m| m.kind == HandleKind::Resize(Handle::Se))
            .map(|m| m.position)
            .unwrap();
        // A half turn puts the se handle at the unrotated nw corner.
        assert!(se.x.abs() < 1e-9 && se.y.abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_handles() {
        let layer = Layer::rectangle(Frame::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(
            hit_test_handles(&layer, Point::new(101.0, 99.0), 4.0),
            Some(HandleKind::Resize(Handle::Se))
        );
        assert_eq!(
            hit_test_handles(&layer, Point::new(50.0, -25.0), 4.0),
            Some(HandleKind::Rotate)
        );
        assert_eq!(hit_test_handles(&layer, Point::new(50.0, 50.0), 4.0), None);

        let mut locked = layer.clone();
        locked.locked = true;
        assert_eq!(hit_test_handles(&locked, Point::new(101.0, 99.0), 4.0), None);
    }

    #[test]
    fn test_rotation_towards() {
        let center = Point::new(0.0, 0.0);
        assert!(rotation_towards(center, Point::new(0.0, -10.0), false).abs() < 1e-9);
        assert!((rotation_towards(center, Point::new(10.0, 0.0), false) - FRAC_PI_2).abs() < 1e-9);
        let snapped = rotation_towards(center, Point::new(10.0, -0.5), true);
        assert!((snapped - FRAC_PI_2).abs() < 1e-9);
        assert_eq!(rotation_towards(center, center, true), 0.0);
    }
}
