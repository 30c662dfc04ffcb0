use std::{fmt, str::FromStr};

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        Database,
        task_repo::{CreateTaskParams, TaskRepositoryRef, UpdateTaskParams},
    },
    ids::{TaskId, UserId, WorkspaceId},
};

/// Work item status. The set is closed but deliberately unordered: any
/// authorized editor may move a task to any status at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    Pending,
    InProgress,
    UnderReview,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTaskStatusError(pub String);

impl fmt::Display for ParseTaskStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid task status: {}", self.0)
    }
}

impl std::error::Error for ParseTaskStatusError {}

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "under_review" => Ok(TaskStatus::UnderReview),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::UnderReview => "under_review",
            TaskStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: TaskId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<i64>,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<i64>,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<UserId>>,
}

#[derive(Clone)]
pub struct TaskStore {
    repo: TaskRepositoryRef,
}

impl TaskStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().task_repo(),
        }
    }

    pub async fn create(&self, workspace_id: &str, task: NewTask) -> Result<TaskRecord> {
        let now = Utc::now().timestamp();
        self.repo
            .insert_task(CreateTaskParams {
                id: TaskId::from(Uuid::new_v4().to_string()),
                workspace_id: WorkspaceId::from(workspace_id),
                title: task.title,
                description: task.description,
                deadline: task.deadline,
                status: task.status,
                assigned_to: task.assigned_to,
                created_at: now,
            })
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<TaskRecord>> {
        self.repo.fetch_task(id).await
    }

    pub async fn find_by_id_with_deleted(&self, id: &str) -> Result<Option<TaskRecord>> {
        self.repo.fetch_task_with_deleted(id).await
    }

    pub async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<TaskRecord>> {
        self.repo.list_tasks(workspace_id).await
    }

    pub async fn update(&self, id: &str, update: TaskUpdate) -> Result<Option<TaskRecord>> {
        let TaskUpdate {
            title,
            description,
            deadline,
            status,
            assigned_to,
        } = update;

        let has_updates = title.is_some()
            || description.is_some()
            || deadline.is_some()
            || status.is_some()
            || assigned_to.is_some();

        if !has_updates {
            return self.find_by_id(id).await;
        }

        let updated = self
            .repo
            .update_task(UpdateTaskParams {
                id: id.to_owned(),
                title,
                description,
                deadline,
                status,
                assigned_to,
                updated_at: Utc::now().timestamp(),
            })
            .await?;

        if !updated {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn set_status(&self, id: &str, status: TaskStatus) -> Result<bool> {
        self.repo
            .set_task_status(id, status, Utc::now().timestamp())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::UnderReview,
            TaskStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_parse_rejects_unknown_values() {
        assert!("done".parse::<TaskStatus>().is_err());
        assert!("IN_PROGRESS".parse::<TaskStatus>().is_err());
    }
}
