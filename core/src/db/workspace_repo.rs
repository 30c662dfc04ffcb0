use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    ids::{UserId, WorkspaceId},
    membership::{MembershipRecord, Role},
    workspace::WorkspaceRecord,
};

#[derive(Debug, Clone)]
pub struct CreateWorkspaceParams {
    pub id: WorkspaceId,
    pub owner_id: UserId,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct UpdateWorkspaceParams {
    pub id: String,
    pub name: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
    pub updated_at: i64,
}

#[async_trait]
pub trait WorkspaceRepository: Send + Sync {
    /// Inserts the workspace and its owner membership atomically.
    async fn create_workspace(&self, params: CreateWorkspaceParams) -> Result<WorkspaceRecord>;

    async fn fetch_workspace(&self, id: &str) -> Result<Option<WorkspaceRecord>>;

    async fn fetch_workspace_with_deleted(&self, id: &str) -> Result<Option<WorkspaceRecord>>;

    async fn list_workspaces_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>>;

    async fn update_workspace(&self, params: UpdateWorkspaceParams) -> Result<bool>;

    async fn find_member_role(&self, workspace_id: &str, user_id: &str) -> Result<Option<Role>>;

    async fn get_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<MembershipRecord>>;

    async fn list_members(&self, workspace_id: &str) -> Result<Vec<MembershipRecord>>;

    async fn count_members(&self, workspace_id: &str) -> Result<i64>;

    async fn insert_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: Role,
        now: i64,
    ) -> Result<()>;

    async fn set_member_role(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: Role,
        now: i64,
    ) -> Result<bool>;

    async fn delete_member(&self, workspace_id: &str, user_id: &str) -> Result<bool>;
}

pub type WorkspaceRepositoryRef = Arc<dyn WorkspaceRepository>;
