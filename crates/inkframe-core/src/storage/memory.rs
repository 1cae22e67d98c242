//! In-memory storage implementation.

use super::{Storage, StorageError, StorageResult};
use crate::codec;
use crate::scene::Scene;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory storage for testing and ephemeral use.
///
/// Scenes are kept encoded, so a load exercises the same codec path as a file.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Create a new empty memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw encoded bytes of a stored document.
    pub fn bytes(&self, id: &str) -> StorageResult<Vec<u8>> {
        let docs = self.documents.read().map_err(lock_error)?;
        docs.get(id).cloned().ok_or_else(|| StorageError::NotFound(id.to_string()))
    }
}

fn lock_error<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Other(format!("Lock error: {e}"))
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, scene: &Scene) -> StorageResult<()> {
        let bytes = codec::export(scene)?;
        let mut docs = self.documents.write().map_err(lock_error)?;
        docs.insert(id.to_string(), bytes);
        Ok(())
    }

    fn load(&self, id: &str) -> StorageResult<Scene> {
        let bytes = self.bytes(id)?;
        Ok(codec::import(&bytes)?)
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        let mut docs = self.documents.write().map_err(lock_error)?;
        docs.remove(id);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        let docs = self.documents.read().map_err(lock_error)?;
        let mut ids: Vec<String> = docs.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, id: &str) -> StorageResult<bool> {
        let docs = self.documents.read().map_err(lock_error)?;
        Ok(docs.contains_key(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Frame;
    use crate::shapes::Layer;
    use kurbo::Point;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        let mut scene = Scene::new();
        let id = scene.add(Layer::ellipse(Frame::new(5.0, 5.0, 30.0, 20.0)));
        scene.add(Layer::arrow(&[Point::new(0.0, 0.0), Point::new(40.0, 10.0)]));

        storage.save("test", &scene).unwrap();
        let loaded = storage.load("test").unwrap();

        assert_eq!(loaded.layers(), scene.layers());
        assert!(loaded.layer(&id).is_some());
    }

    #[test]
    fn test_not_found() {
        let storage = MemoryStorage::new();
        assert!(matches!(storage.load("nonexistent"), Err(StorageError::NotFound(_))));
        assert!(matches!(storage.bytes("nonexistent"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_exists_and_delete() {
        let storage = MemoryStorage::new();

        assert!(!storage.exists("test").unwrap());
        storage.save("test", &Scene::new()).unwrap();
        assert!(storage.exists("test").unwrap());

        storage.delete("test").unwrap();
        assert!(!storage.exists("test").unwrap());
    }

    #[test]
    fn test_list_is_sorted() {
        let storage = MemoryStorage::new();
        storage.save("doc2", &Scene::new()).unwrap();
        storage.save("doc1", &Scene::new()).unwrap();

        assert_eq!(storage.list().unwrap(), ["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_stored_bytes_are_codec_output() {
        let storage = MemoryStorage::new();
        storage.save("test", &Scene::new()).unwrap();

        let json = codec::unpack(&storage.bytes("test").unwrap()).unwrap();
        assert!(json.contains("\"format_version\":2"));
    }
}
