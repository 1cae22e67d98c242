//! Per-layer recovery and version migration.
//!
//! Every raw layer is upgraded to the current field layout, overlaid onto the
//! defaults of its kind and then typed. Fields that can't be carried over
//! fall back to the kind default and are reported as [`MigrationGap`]s; the
//! import itself carries on.

use crate::geometry::SizeLimits;
use crate::shapes::{FontFamily, Layer, Roundness, ShapeKind};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// A field that could not be migrated and fell back to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationGap {
    /// Id from the payload, when it had a usable one.
    pub layer_id: Option<String>,
    pub field: String,
    pub reason: String,
}

/// What an import had to repair or drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// `format_version` found in the payload.
    pub source_version: u32,
    pub gaps: Vec<MigrationGap>,
    /// Layers dropped entirely (unknown kind, not an object).
    pub skipped: usize,
}

impl ImportReport {
    /// No field fell back to a default and no layer was dropped.
    pub fn is_clean(&self) -> bool {
        self.gaps.is_empty() && self.skipped == 0
    }

    fn gap(&mut self, layer_id: Option<&str>, field: &str, reason: impl Into<String>) {
        let gap = MigrationGap {
            layer_id: layer_id.map(str::to_string),
            field: field.to_string(),
            reason: reason.into(),
        };
        log::warn!(
            "Migration gap in layer {}: {}: {}",
            gap.layer_id.as_deref().unwrap_or("<unknown>"),
            gap.field,
            gap.reason
        );
        self.gaps.push(gap);
    }
}

/// Type raw layers from a payload of `version`, in order.
pub(crate) fn migrate_layers(raw: Vec<Value>, version: u32, limits: SizeLimits, report: &mut ImportReport) -> Vec<Layer> {
    let mut seen = HashSet::new();
    let mut layers = Vec::with_capacity(raw.len());
    for value in raw {
        match migrate_layer(value, version, limits, &mut seen, report) {
            Some(layer) => layers.push(layer),
            None => report.skipped += 1,
        }
    }
    layers
}

fn migrate_layer(
    raw: Value,
    version: u32,
    limits: SizeLimits,
    seen: &mut HashSet<String>,
    report: &mut ImportReport,
) -> Option<Layer> {
    let Value::Object(mut fields) = raw else {
        report.gap(None, "layer", "not a JSON object, skipped");
        return None;
    };
    let payload_id = fields
        .remove("id")
        .and_then(|id| id.as_str().map(str::to_string))
        .filter(|id| !id.is_empty());
    let id = payload_id.as_deref();

    if version < 2 {
        upgrade_from_v1(&mut fields, id, report);
    }

    let kind_name = fields.get("type").and_then(Value::as_str).unwrap_or_default().to_string();
    let Some(kind) = ShapeKind::from_name(&kind_name) else {
        report.gap(id, "type", format!("unknown layer kind {kind_name:?}, skipped"));
        return None;
    };
    let has_size = fields.contains_key("width") && fields.contains_key("height");

    let mut layer = overlay_defaults(kind, fields, id, report)?;

    match payload_id {
        Some(payload_id) if !seen.contains(&payload_id) => layer.id = payload_id,
        Some(payload_id) => report.gap(Some(payload_id.as_str()), "id", format!("duplicate id, reassigned to {}", layer.id)),
        None => report.gap(None, "id", format!("missing id, assigned {}", layer.id)),
    }

    if let Some(text) = layer.as_text_mut() {
        if !has_size {
            let size = text.estimate_size();
            text.layout_pending = true;
            layer.width = size.width;
            layer.height = size.height;
        }
    }
    if layer.repair(limits) {
        log::debug!("Repaired geometry of layer {}", layer.id);
    }
    seen.insert(layer.id.clone());
    Some(layer)
}

/// Rewrite version 1 field names and encodings in place.
fn upgrade_from_v1(fields: &mut Map<String, Value>, id: Option<&str>, report: &mut ImportReport) {
    if fields.get("type").and_then(Value::as_str) == Some("freedraw") {
        fields.insert("type".to_string(), Value::from(ShapeKind::FreehandPath.as_str()));
    }

    // Opacity was a fraction.
    if let Some(opacity) = fields.remove("opacity") {
        match opacity.as_f64().filter(|o| o.is_finite()) {
            Some(fraction) => {
                let percent = (fraction * 100.0).round().clamp(0.0, 100.0) as u64;
                fields.insert("opacity".to_string(), Value::from(percent));
            }
            None => report.gap(id, "opacity", format!("expected a fraction, found {opacity}")),
        }
    }

    if let Some(is_deleted) = fields.remove("is_deleted") {
        if is_deleted.is_boolean() {
            fields.entry("deleted").or_insert(is_deleted);
        } else {
            report.gap(id, "is_deleted", format!("expected a boolean, found {is_deleted}"));
        }
    }

    if let Some(sharpness) = fields.remove("stroke_sharpness") {
        let kind = fields
            .get("type")
            .and_then(Value::as_str)
            .and_then(ShapeKind::from_name);
        let roundness = match sharpness.as_str() {
            Some("round") => Some(kind.and_then(Roundness::default_for)),
            Some("sharp") => Some(None),
            _ => None,
        };
        match roundness {
            Some(roundness) => {
                if !fields.contains_key("roundness") {
                    let value = serde_json::to_value(roundness).unwrap_or(Value::Null);
                    fields.insert("roundness".to_string(), value);
                }
            }
            None => report.gap(id, "stroke_sharpness", format!("unknown value {sharpness}")),
        }
    }

    if let Some(family) = fields.get("font_family").and_then(Value::as_u64) {
        match FontFamily::from_legacy_id(family).and_then(|f| serde_json::to_value(f).ok()) {
            Some(name) => {
                fields.insert("font_family".to_string(), name);
            }
            None => {
                fields.remove("font_family");
                report.gap(id, "font_family", format!("unknown font id {family}"));
            }
        }
    }
}

/// Overlay payload fields onto the kind defaults and type the result.
fn overlay_defaults(
    kind: ShapeKind,
    fields: Map<String, Value>,
    id: Option<&str>,
    report: &mut ImportReport,
) -> Option<Layer> {
    let placeholder = Layer::placeholder(kind);
    let Ok(Value::Object(defaults)) = serde_json::to_value(&placeholder) else {
        return None;
    };

    let mut merged = defaults.clone();
    let mut applied = Vec::new();
    for (key, value) in fields {
        if key == "type" {
            continue;
        }
        match defaults.get(&key) {
            Some(default) if compatible(&key, default, &value) => {
                merged.insert(key.clone(), value);
                applied.push(key);
            }
            Some(default) => report.gap(
                id,
                &key,
                format!("expected {}, found {}", json_type(default, &key), json_type(&value, &key)),
            ),
            None => log::debug!("Ignoring unknown field {key:?} on {kind} layer"),
        }
    }

    if let Ok(layer) = serde_json::from_value::<Layer>(Value::Object(merged.clone())) {
        return Some(layer);
    }

    // Something well-typed still doesn't fit (unknown enum value, out of
    // range integer, malformed point). Find it field by field.
    for key in applied {
        let mut probe = defaults.clone();
        if let Some(value) = merged.get(&key) {
            probe.insert(key.clone(), value.clone());
        }
        if let Err(err) = serde_json::from_value::<Layer>(Value::Object(probe)) {
            if let Some(default) = defaults.get(&key) {
                merged.insert(key.clone(), default.clone());
            }
            report.gap(id, &key, err.to_string());
        }
    }

    match serde_json::from_value::<Layer>(Value::Object(merged)) {
        Ok(layer) => Some(layer),
        Err(err) => {
            report.gap(id, "layer", format!("{err}, skipped"));
            None
        }
    }
}

/// Nullable fields and the JSON type they hold when set.
fn nullable_type(key: &str) -> Option<&'static str> {
    match key {
        "name" | "group_id" | "container_id" | "file_id" => Some("string"),
        "roundness" => Some("object"),
        _ => None,
    }
}

/// Whether `value` has the JSON type the default for `key` has.
fn compatible(key: &str, default: &Value, value: &Value) -> bool {
    match (default, value) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) => nullable_type(key) == Some(json_type(value, key)),
        (_, Value::Null) => nullable_type(key).is_some(),
        (Value::Bool(_), Value::Bool(_)) => true,
        // Integer fields stay integral.
        (Value::Number(n), Value::Number(v)) => n.is_f64() || v.is_u64(),
        (Value::String(_), Value::String(_)) => true,
        (Value::Array(_), Value::Array(_)) => true,
        (Value::Object(_), Value::Object(_)) => true,
        _ => false,
    }
}

fn json_type(value: &Value, key: &str) -> &'static str {
    match value {
        Value::Null => nullable_type(key).unwrap_or("null"),
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
