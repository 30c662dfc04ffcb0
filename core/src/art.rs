use std::{fmt, str::FromStr};

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        Database,
        art_repo::{ArtRepositoryRef, CreateArtParams, UpdateArtParams},
    },
    ids::{ArtId, TaskId},
};

/// Review status of a visual deliverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArtStatus {
    Pending,
    Approved,
    Rejected,
    RevisionRequested,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseArtStatusError(pub String);

impl fmt::Display for ParseArtStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid art status: {}", self.0)
    }
}

impl std::error::Error for ParseArtStatusError {}

impl FromStr for ArtStatus {
    type Err = ParseArtStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ArtStatus::Pending),
            "approved" => Ok(ArtStatus::Approved),
            "rejected" => Ok(ArtStatus::Rejected),
            "revision_requested" => Ok(ArtStatus::RevisionRequested),
            "archived" => Ok(ArtStatus::Archived),
            _ => Err(ParseArtStatusError(s.to_string())),
        }
    }
}

impl ArtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtStatus::Pending => "pending",
            ArtStatus::Approved => "approved",
            ArtStatus::Rejected => "rejected",
            ArtStatus::RevisionRequested => "revision_requested",
            ArtStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtRecord {
    pub id: ArtId,
    pub task_id: TaskId,
    pub title: Option<String>,
    pub art_path: String,
    pub status: ArtStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Clone)]
pub struct ArtStore {
    repo: ArtRepositoryRef,
}

impl ArtStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().art_repo(),
        }
    }

    pub async fn create(
        &self,
        task_id: &str,
        title: Option<&str>,
        art_path: &str,
    ) -> Result<ArtRecord> {
        let now = Utc::now().timestamp();
        self.repo
            .insert_art(CreateArtParams {
                id: ArtId::from(Uuid::new_v4().to_string()),
                task_id: TaskId::from(task_id),
                title: title.map(ToOwned::to_owned),
                art_path: art_path.to_owned(),
                status: ArtStatus::Pending,
                created_at: now,
            })
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ArtRecord>> {
        self.repo.fetch_art(id).await
    }

    pub async fn find_by_id_with_deleted(&self, id: &str) -> Result<Option<ArtRecord>> {
        self.repo.fetch_art_with_deleted(id).await
    }

    pub async fn list_for_task(&self, task_id: &str) -> Result<Vec<ArtRecord>> {
        self.repo.list_arts(task_id).await
    }

    pub async fn update(
        &self,
        id: &str,
        title: Option<String>,
        art_path: Option<String>,
    ) -> Result<Option<ArtRecord>> {
        if title.is_none() && art_path.is_none() {
            return self.find_by_id(id).await;
        }

        let updated = self
            .repo
            .update_art(UpdateArtParams {
                id: id.to_owned(),
                title,
                art_path,
                updated_at: Utc::now().timestamp(),
            })
            .await?;

        if !updated {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn set_status(&self, id: &str, status: ArtStatus) -> Result<bool> {
        self.repo
            .set_art_status(id, status, Utc::now().timestamp())
            .await
    }

    pub async fn set_path(&self, id: &str, art_path: &str) -> Result<bool> {
        self.repo
            .set_art_path(id, art_path, Utc::now().timestamp())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            ArtStatus::Pending,
            ArtStatus::Approved,
            ArtStatus::Rejected,
            ArtStatus::RevisionRequested,
            ArtStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<ArtStatus>().unwrap(), status);
        }
    }
}
