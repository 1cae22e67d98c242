//! JSON envelope of a scene file.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{format_version, source, exported_at, canvas?, layers}`.
///
/// Layers stay as raw JSON here; typing them is the migrator's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub format_version: u32,
    pub source: String,
    pub exported_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<CanvasSize>,
    pub layers: Vec<Value>,
}

/// Logical canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl From<kurbo::Size> for CanvasSize {
    fn from(size: kurbo::Size) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

impl From<CanvasSize> for kurbo::Size {
    fn from(size: CanvasSize) -> Self {
        kurbo::Size::new(size.width, size.height)
    }
}
