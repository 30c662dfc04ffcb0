use anyhow::Result;
use chrono::Utc;

use crate::db::{Database, cascade_repo::CascadeRepositoryRef};

/// Tenant-owned entity kinds participating in cascading soft delete and
/// restore. Each kind declares its dependent relations in a static table;
/// the walk is driven entirely by those descriptors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Workspace,
    Invitation,
    Task,
    Art,
    ArtComment,
    ArtFeedback,
}

/// One dependent edge: rows of `child` whose `foreign_key` column points at
/// the parent row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Relation {
    pub child: EntityKind,
    pub foreign_key: &'static str,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Workspace => "workspaces",
            EntityKind::Invitation => "workspace_invitations",
            EntityKind::Task => "tasks",
            EntityKind::Art => "art",
            EntityKind::ArtComment => "art_comments",
            EntityKind::ArtFeedback => "art_feedback",
        }
    }

    /// Declared dependents, walked recursively on delete and restore.
    pub fn dependents(&self) -> &'static [Relation] {
        match self {
            EntityKind::Workspace => &[
                Relation {
                    child: EntityKind::Task,
                    foreign_key: "workspace_id",
                },
                Relation {
                    child: EntityKind::Invitation,
                    foreign_key: "workspace_id",
                },
            ],
            EntityKind::Task => &[Relation {
                child: EntityKind::Art,
                foreign_key: "task_id",
            }],
            EntityKind::Art => &[
                Relation {
                    child: EntityKind::ArtComment,
                    foreign_key: "art_id",
                },
                Relation {
                    child: EntityKind::ArtFeedback,
                    foreign_key: "art_id",
                },
            ],
            EntityKind::Invitation | EntityKind::ArtComment | EntityKind::ArtFeedback => &[],
        }
    }
}

/// Propagates tombstones across an entity's declared dependents. The engine
/// performs no authorization; callers gate every invocation through the
/// access layer first.
#[derive(Clone)]
pub struct CascadeEngine {
    repo: CascadeRepositoryRef,
}

impl CascadeEngine {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().cascade_repo(),
        }
    }

    /// Tombstone the row and every instance reachable through its declared
    /// relations, in one transaction. Re-tombstoning already-deleted
    /// dependents is harmless, which makes the walk idempotent.
    pub async fn soft_delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        self.repo
            .soft_delete_tree(kind, id, Utc::now().timestamp())
            .await
    }

    /// Clear the tombstone on the row and on every currently tombstoned
    /// dependent, in one transaction. The walk does not track why a
    /// dependent was tombstoned, so dependents deleted independently are
    /// resurrected too.
    pub async fn restore(&self, kind: EntityKind, id: &str) -> Result<()> {
        self.repo.restore_tree(kind, id).await
    }

    /// Permanent removal. No tombstone walk; the schema's foreign keys take
    /// the children down with the row.
    pub async fn purge(&self, kind: EntityKind, id: &str) -> Result<bool> {
        self.repo.purge(kind, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_tree_reaches_every_leaf() {
        let mut seen = vec![];
        let mut queue = vec![EntityKind::Workspace];
        while let Some(kind) = queue.pop() {
            seen.push(kind);
            queue.extend(kind.dependents().iter().map(|relation| relation.child));
        }

        for kind in [
            EntityKind::Task,
            EntityKind::Art,
            EntityKind::ArtComment,
            EntityKind::ArtFeedback,
            EntityKind::Invitation,
        ] {
            assert!(seen.contains(&kind), "{kind:?} unreachable from workspace");
        }
    }

    #[test]
    fn leaves_declare_no_dependents() {
        assert!(EntityKind::ArtComment.dependents().is_empty());
        assert!(EntityKind::ArtFeedback.dependents().is_empty());
        assert!(EntityKind::Invitation.dependents().is_empty());
    }
}
