use anyhow::Result;
use async_trait::async_trait;

/// Storage abstraction for deliverable files. Backends decide where bytes
/// live; callers only hold opaque paths.
///
/// `relocate` backs the approval flow: an approved deliverable's file moves
/// into the reviewer's approved folder after the status write commits.
#[async_trait]
pub trait ArtStorage: Send + Sync {
    /// Persist the bytes and return the path they landed on. The hint names
    /// the desired destination; backends may adjust it to avoid collisions.
    async fn store(&self, content: &[u8], destination_hint: &str) -> Result<String>;

    /// Move a stored object to a new path. Errors if the source is missing.
    async fn relocate(&self, old_path: &str, new_path: &str) -> Result<()>;

    async fn delete(&self, path: &str) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Final component of a stored path, used when composing the approved
/// destination for a reviewed deliverable.
pub fn path_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_directories() {
        assert_eq!(path_basename("art/xyz.jpg"), "xyz.jpg");
        assert_eq!(path_basename("xyz.jpg"), "xyz.jpg");
        assert_eq!(path_basename("a/b/c.png"), "c.png");
    }
}
