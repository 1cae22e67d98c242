//! Storage abstraction for scene files.
//!
//! Backends hold codec bytes keyed by document id; encoding and decoding go
//! through [`crate::codec`], so every backend stores the same file format.

mod file;
mod memory;

pub use file::{FileStorage, SCENE_EXTENSION};
pub use memory::MemoryStorage;

use crate::codec::CodecError;
use crate::scene::Scene;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for scene storage backends.
pub trait Storage: Send + Sync {
    /// Save a scene, replacing any document with the same id.
    fn save(&self, id: &str, scene: &Scene) -> StorageResult<()>;

    /// Load a scene.
    fn load(&self, id: &str) -> StorageResult<Scene>;

    /// Delete a document. Missing documents are not an error.
    fn delete(&self, id: &str) -> StorageResult<()>;

    /// List all document ids, sorted.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a document exists.
    fn exists(&self, id: &str) -> StorageResult<bool>;
}
