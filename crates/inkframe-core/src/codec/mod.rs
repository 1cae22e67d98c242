//! Interchange codec.
//!
//! A scene file is `zlib_deflate(lz_compress(utf8(json)))` where the JSON is
//! a [`SceneDocument`]. Changing field names, compression order or stamping
//! requires a version bump and a migration entry in [`migrate`].

mod compress;
mod migrate;
mod schema;

pub use compress::{pack, unpack};
pub use migrate::{ImportReport, MigrationGap};
pub use schema::{CanvasSize, SceneDocument};

use crate::config::EngineConfig;
use crate::scene::{Scene, SceneMetadata};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use thiserror::Error;

/// Version written by [`export`].
pub const CURRENT_VERSION: u32 = 2;
/// Oldest version [`import`] can migrate.
pub const OLDEST_VERSION: u32 = 1;
/// `source` stamp of exported files.
pub const SOURCE: &str = "inkframe-sketch";

/// Errors that can occur while encoding or decoding scene files.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Unsupported format version {found} (supported {oldest} to {current})")]
    UnsupportedFormat { found: u64, oldest: u32, current: u32 },
    #[error("Corrupt payload: {0}")]
    CorruptPayload(String),
    #[error("Encode error: {0}")]
    Encode(String),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Knobs for [`export_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Keep tombstoned layers in the file.
    pub include_deleted: bool,
    /// Timestamp to stamp instead of the current time.
    pub exported_at: Option<String>,
}

/// A decoded scene plus what had to be repaired on the way in.
#[derive(Debug, Clone)]
pub struct Imported {
    pub scene: Scene,
    pub report: ImportReport,
}

/// Current UTC time as RFC 3339 with milliseconds.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Encode a scene, skipping deleted layers.
pub fn export(scene: &Scene) -> CodecResult<Vec<u8>> {
    export_with(scene, &ExportOptions::default())
}

pub fn export_with(scene: &Scene, options: &ExportOptions) -> CodecResult<Vec<u8>> {
    let json = export_json(scene, options)?;
    pack(&json)
}

/// The JSON stage of an export, before compression.
pub fn export_json(scene: &Scene, options: &ExportOptions) -> CodecResult<String> {
    let document = to_document(scene, options)?;
    serde_json::to_string(&document).map_err(|e| CodecError::Encode(e.to_string()))
}

fn to_document(scene: &Scene, options: &ExportOptions) -> CodecResult<SceneDocument> {
    let mut layers = Vec::with_capacity(scene.len());
    for layer in scene.layers() {
        if layer.deleted && !options.include_deleted {
            continue;
        }
        let mut value = serde_json::to_value(layer).map_err(|e| CodecError::Encode(e.to_string()))?;
        // Estimated text sizes are placeholders, not data.
        if layer.as_text().is_some_and(|text| text.layout_pending) {
            if let Value::Object(fields) = &mut value {
                fields.remove("width");
                fields.remove("height");
            }
        }
        layers.push(value);
    }
    log::debug!("Exporting {} layers", layers.len());

    Ok(SceneDocument {
        format_version: CURRENT_VERSION,
        source: SOURCE.to_string(),
        exported_at: Some(options.exported_at.clone().unwrap_or_else(timestamp_now)),
        canvas: scene.metadata.canvas_size.map(CanvasSize::from),
        layers,
    })
}

/// Decode a scene file with the default configuration.
pub fn import(bytes: &[u8]) -> CodecResult<Scene> {
    import_with_report(bytes, EngineConfig::default()).map(|imported| imported.scene)
}

/// Decode a scene file, returning the migration report alongside it.
pub fn import_with_report(bytes: &[u8], config: EngineConfig) -> CodecResult<Imported> {
    let json = unpack(bytes)?;
    import_json(&json, config)
}

/// Decode the JSON stage of a scene file.
pub fn import_json(json: &str, config: EngineConfig) -> CodecResult<Imported> {
    let root: Value = serde_json::from_str(json).map_err(|e| CodecError::CorruptPayload(format!("json: {e}")))?;
    let Value::Object(mut root) = root else {
        return Err(CodecError::CorruptPayload("json: document is not an object".to_string()));
    };

    let version = match root.get("format_version") {
        None | Some(Value::Null) => OLDEST_VERSION,
        Some(value) => {
            let found = value.as_u64().ok_or_else(|| {
                CodecError::CorruptPayload(format!("format_version is not an integer: {value}"))
            })?;
            match u32::try_from(found) {
                Ok(v) if (OLDEST_VERSION..=CURRENT_VERSION).contains(&v) => v,
                _ => {
                    return Err(CodecError::UnsupportedFormat {
                        found,
                        oldest: OLDEST_VERSION,
                        current: CURRENT_VERSION,
                    });
                }
            }
        }
    };

    let raw_layers = match root.remove("layers") {
        Some(Value::Array(layers)) => layers,
        Some(other) => {
            return Err(CodecError::CorruptPayload(format!("layers is not an array: {other}")));
        }
        None => return Err(CodecError::CorruptPayload("layers missing".to_string())),
    };

    if let Some(source) = root.get("source").and_then(Value::as_str) {
        if source != SOURCE {
            log::debug!("Importing scene written by {source:?}");
        }
    }

    let mut report = ImportReport {
        source_version: version,
        ..ImportReport::default()
    };

    let canvas_size = match root.remove("canvas") {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value::<CanvasSize>(value) {
            Ok(size) if size.width.is_finite() && size.height.is_finite() => Some(size.into()),
            Ok(_) | Err(_) => {
                log::warn!("Ignoring malformed canvas dimensions");
                None
            }
        },
    };

    let layers = migrate::migrate_layers(raw_layers, version, config.size_limits(), &mut report);
    log::debug!(
        "Imported {} layers from version {} ({} gaps, {} skipped)",
        layers.len(),
        version,
        report.gaps.len(),
        report.skipped
    );

    let metadata = SceneMetadata {
        format_version: CURRENT_VERSION,
        exported_at: root.get("exported_at").and_then(Value::as_str).map(str::to_string),
        canvas_size,
    };
    Ok(Imported {
        scene: Scene::from_parts(layers, metadata, config),
        report,
    })
}
