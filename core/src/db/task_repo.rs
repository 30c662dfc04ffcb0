use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    ids::{TaskId, UserId, WorkspaceId},
    task::{TaskRecord, TaskStatus},
};

#[derive(Debug, Clone)]
pub struct CreateTaskParams {
    pub id: TaskId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub description: Option<String>,
    pub deadline: Option<i64>,
    pub status: TaskStatus,
    pub assigned_to: Option<UserId>,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct UpdateTaskParams {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub deadline: Option<Option<i64>>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Option<UserId>>,
    pub updated_at: i64,
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_task(&self, params: CreateTaskParams) -> Result<TaskRecord>;

    async fn fetch_task(&self, id: &str) -> Result<Option<TaskRecord>>;

    async fn fetch_task_with_deleted(&self, id: &str) -> Result<Option<TaskRecord>>;

    async fn list_tasks(&self, workspace_id: &str) -> Result<Vec<TaskRecord>>;

    async fn update_task(&self, params: UpdateTaskParams) -> Result<bool>;

    async fn set_task_status(&self, id: &str, status: TaskStatus, now: i64) -> Result<bool>;
}

pub type TaskRepositoryRef = Arc<dyn TaskRepository>;
