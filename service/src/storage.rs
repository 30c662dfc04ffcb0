use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use atelier_core::storage::{ArtStorage, path_basename};

/// In-process object store. Backs local deployments and tests; production
/// installs swap in a real blob backend behind the same trait.
#[derive(Default)]
pub struct MemoryArtStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn object(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(path).cloned()
    }
}

#[async_trait]
impl ArtStorage for MemoryArtStorage {
    async fn store(&self, content: &[u8], destination_hint: &str) -> Result<String> {
        let mut objects = self.objects.write().await;

        let path = if objects.contains_key(destination_hint) {
            let basename = path_basename(destination_hint);
            let directory = &destination_hint[..destination_hint.len() - basename.len()];
            format!("{directory}{}_{basename}", Uuid::new_v4().simple())
        } else {
            destination_hint.to_owned()
        };

        objects.insert(path.clone(), content.to_vec());
        Ok(path)
    }

    async fn relocate(&self, old_path: &str, new_path: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        let Some(content) = objects.remove(old_path) else {
            bail!("stored object missing: {old_path}");
        };

        objects.insert(new_path.to_owned(), content);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.objects.write().await.remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.objects.read().await.contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_relocate_and_delete() {
        let storage = MemoryArtStorage::new();

        let path = storage.store(b"bytes", "art/xyz.jpg").await.unwrap();
        assert_eq!(path, "art/xyz.jpg");
        assert!(storage.exists(&path).await.unwrap());

        storage
            .relocate(&path, "ws/reviewer/approved/xyz.jpg")
            .await
            .unwrap();
        assert!(!storage.exists("art/xyz.jpg").await.unwrap());
        assert!(storage.exists("ws/reviewer/approved/xyz.jpg").await.unwrap());

        storage.delete("ws/reviewer/approved/xyz.jpg").await.unwrap();
        assert!(!storage.exists("ws/reviewer/approved/xyz.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn colliding_hints_get_unique_paths() {
        let storage = MemoryArtStorage::new();

        let first = storage.store(b"one", "art/xyz.jpg").await.unwrap();
        let second = storage.store(b"two", "art/xyz.jpg").await.unwrap();

        assert_ne!(first, second);
        assert!(second.starts_with("art/"));
        assert!(second.ends_with("_xyz.jpg"));
        assert_eq!(storage.object(&first).await.unwrap(), b"one");
        assert_eq!(storage.object(&second).await.unwrap(), b"two");
    }

    #[tokio::test]
    async fn relocating_a_missing_object_fails() {
        let storage = MemoryArtStorage::new();
        assert!(storage.relocate("nope", "elsewhere").await.is_err());
    }
}
