//! File-based storage.

use super::{Storage, StorageError, StorageResult};
use crate::codec;
use crate::config::EngineConfig;
use crate::scene::Scene;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension of scene files written by [`FileStorage`].
pub const SCENE_EXTENSION: &str = "sketch";

/// Stores each scene as a `<id>.sketch` file in a base directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory
    /// if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    /// Create file storage in the platform data directory.
    ///
    /// On Linux: `~/.local/share/inkframe/scenes/`
    /// On Windows: `%LOCALAPPDATA%\inkframe\scenes\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Other("Could not determine a data directory".to_string()))?;
        Self::new(base.join("inkframe").join("scenes"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn document_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.{SCENE_EXTENSION}", sanitize_id(id)))
    }
}

/// Map an id onto a safe file stem.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl Storage for FileStorage {
    fn save(&self, id: &str, scene: &Scene) -> StorageResult<()> {
        let path = self.document_path(id);
        let bytes = codec::export(scene)?;
        // Write beside the target and rename so a failed save keeps the old file.
        let partial = path.with_extension(format!("{SCENE_EXTENSION}.partial"));
        fs::write(&partial, &bytes)?;
        fs::rename(&partial, &path)?;
        log::debug!("Saved scene {} ({} bytes) to {}", id, bytes.len(), path.display());
        Ok(())
    }

    fn load(&self, id: &str) -> StorageResult<Scene> {
        let path = self.document_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };
        let imported = codec::import_with_report(&bytes, EngineConfig::default())?;
        if !imported.report.is_clean() {
            log::warn!(
                "Scene {} loaded with {} migration gaps and {} skipped layers",
                id,
                imported.report.gaps.len(),
                imported.report.skipped
            );
        }
        Ok(imported.scene)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        match fs::remove_file(self.document_path(id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.base_path)?.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == SCENE_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> StorageResult<bool> {
        Ok(self.document_path(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::Layer;
    use tempfile::tempdir;

    fn scene_with_box() -> Scene {
        let mut scene = Scene::new();
        scene.add(Layer::rectangle(Frame::new(0.0, 0.0, 80.0, 40.0)).with_name("box"));
        scene
    }

    #[test]
    fn test_file_storage_save_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let scene = scene_with_box();

        storage.save("test-doc", &scene).unwrap();
        assert!(dir.path().join("test-doc.sketch").is_file());
        let loaded = storage.load("test-doc").unwrap();

        assert_eq!(loaded.layers(), scene.layers());
    }

    #[test]
    fn test_file_storage_not_found() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        let result = storage.load("nonexistent");
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_file_storage_list() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let scene = Scene::new();

        storage.save("doc2", &scene).unwrap();
        storage.save("doc1", &scene).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(storage.list().unwrap(), ["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.save("test", &Scene::new()).unwrap();
        assert!(storage.exists("test").unwrap());

        storage.delete("test").unwrap();
        assert!(!storage.exists("test").unwrap());
        storage.delete("test").unwrap();
    }

    #[test]
    fn test_file_storage_sanitizes_id() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        let scene = scene_with_box();

        storage.save("test/doc:with*special", &scene).unwrap();
        assert!(dir.path().join("test_doc_with_special.sketch").is_file());

        let loaded = storage.load("test/doc:with*special").unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_file_storage_corrupt_file() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();
        fs::write(dir.path().join("broken.sketch"), b"definitely not zlib").unwrap();

        let result = storage.load("broken");
        assert!(matches!(result, Err(StorageError::Codec(codec::CodecError::CorruptPayload(_)))));
    }

    #[test]
    fn test_new_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(storage.base_path(), nested.as_path());
    }
}
