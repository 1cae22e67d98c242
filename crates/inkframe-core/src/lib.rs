//! InkFrame Core Library
//!
//! Geometry and persistence engine for vector sketch canvases: the layer
//! model, rotation-aware resizing, hit-testing, the scene store, and the
//! compressed interchange format.

pub mod codec;
pub mod config;
pub mod geometry;
pub mod group;
pub mod hit;
pub mod scene;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod viewport;

pub use codec::{CodecError, CodecResult, ExportOptions, ImportReport, Imported, MigrationGap};
pub use config::{ConfigError, EngineConfig};
pub use geometry::{Frame, Handle, ResizeOptions, Resized, SizeLimits};
pub use group::{Group, ViewportFit};
pub use scene::{EditOutcome, RemoveReport, Scene, SceneMetadata};
pub use selection::{HandleKind, HandleMarker, Selection};
pub use shapes::{Layer, LayerId, LayerStyle, Roundness, RoundnessKind, SerializableColor, Shape, ShapeKind};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError, StorageResult};
pub use viewport::Viewport;
