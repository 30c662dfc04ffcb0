use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::cascade::EntityKind;

#[async_trait]
pub trait CascadeRepository: Send + Sync {
    /// Tombstone the row and, recursively, every row reachable through the
    /// kind's declared dependents. One transaction for the whole walk.
    async fn soft_delete_tree(&self, kind: EntityKind, id: &str, now: i64) -> Result<()>;

    /// Clear tombstones on the row and, recursively, on every currently
    /// tombstoned dependent. One transaction for the whole walk.
    async fn restore_tree(&self, kind: EntityKind, id: &str) -> Result<()>;

    /// Hard delete; dependent rows fall to the schema's foreign keys.
    async fn purge(&self, kind: EntityKind, id: &str) -> Result<bool>;
}

pub type CascadeRepositoryRef = Arc<dyn CascadeRepository>;
