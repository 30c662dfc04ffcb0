use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{
        Database,
        workspace_repo::{CreateWorkspaceParams, UpdateWorkspaceParams, WorkspaceRepositoryRef},
    },
    ids::{UserId, WorkspaceId},
    membership::{MembershipRecord, Role},
};

pub const DEFAULT_WORKSPACE_STATUS: &str = "active";

/// Tenancy root. Every task, art piece, review comment and invitation
/// resolves back to exactly one workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceRecord {
    pub id: WorkspaceId,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct WorkspaceProfile {
    pub name: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkspaceProfileUpdate {
    pub name: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub status: Option<String>,
}

#[derive(Clone)]
pub struct WorkspaceStore {
    repo: WorkspaceRepositoryRef,
}

impl WorkspaceStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().workspace_repo(),
        }
    }

    /// Create a workspace and attach the creator as its first owner. Both
    /// rows land in the same transaction.
    pub async fn create(&self, owner_id: &str, profile: WorkspaceProfile) -> Result<WorkspaceRecord> {
        let id = WorkspaceId::from(Uuid::new_v4().to_string());
        let now = Utc::now().timestamp();

        self.repo
            .create_workspace(CreateWorkspaceParams {
                id: id.clone(),
                owner_id: UserId::from(owner_id),
                name: profile.name,
                contact_name: profile.contact_name,
                email: profile.email,
                phone: profile.phone,
                notes: profile.notes,
                status: DEFAULT_WORKSPACE_STATUS.to_owned(),
                created_at: now,
            })
            .await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        self.repo.fetch_workspace(id).await
    }

    /// Tombstoned rows included; used by restore and by the ownership-chain
    /// walk for deleted entities.
    pub async fn find_by_id_with_deleted(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        self.repo.fetch_workspace_with_deleted(id).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>> {
        self.repo.list_workspaces_for_user(user_id).await
    }

    pub async fn update(
        &self,
        id: &str,
        update: WorkspaceProfileUpdate,
    ) -> Result<Option<WorkspaceRecord>> {
        let WorkspaceProfileUpdate {
            name,
            contact_name,
            email,
            phone,
            notes,
            status,
        } = update;

        let has_updates = name.is_some()
            || contact_name.is_some()
            || email.is_some()
            || phone.is_some()
            || notes.is_some()
            || status.is_some();

        if !has_updates {
            return self.find_by_id(id).await;
        }

        let updated = self
            .repo
            .update_workspace(UpdateWorkspaceParams {
                id: id.to_owned(),
                name,
                contact_name,
                email,
                phone,
                notes,
                status,
                updated_at: Utc::now().timestamp(),
            })
            .await?;

        if !updated {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn find_member_role(&self, workspace_id: &str, user_id: &str) -> Result<Option<Role>> {
        self.repo.find_member_role(workspace_id, user_id).await
    }

    pub async fn get_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<MembershipRecord>> {
        self.repo.get_member(workspace_id, user_id).await
    }

    pub async fn list_members(&self, workspace_id: &str) -> Result<Vec<MembershipRecord>> {
        self.repo.list_members(workspace_id).await
    }

    pub async fn count_members(&self, workspace_id: &str) -> Result<i64> {
        self.repo.count_members(workspace_id).await
    }

    /// Look up the owning member, used to size the collaborator cap from the
    /// owner's plan tier.
    pub async fn find_owner(&self, workspace_id: &str) -> Result<Option<MembershipRecord>> {
        let members = self.repo.list_members(workspace_id).await?;
        Ok(members.into_iter().find(|member| member.role == Role::Owner))
    }

    pub async fn attach_member(&self, workspace_id: &str, user_id: &str, role: Role) -> Result<()> {
        self.repo
            .insert_member(workspace_id, user_id, role, Utc::now().timestamp())
            .await
    }

    pub async fn set_member_role(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: Role,
    ) -> Result<bool> {
        self.repo
            .set_member_role(workspace_id, user_id, role, Utc::now().timestamp())
            .await
    }

    pub async fn remove_member(&self, workspace_id: &str, user_id: &str) -> Result<bool> {
        self.repo.delete_member(workspace_id, user_id).await
    }
}
