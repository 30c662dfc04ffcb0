use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    ids::{UserId, WorkspaceId},
    invitation::{InvitationRecord, InvitationStatus},
    membership::Role,
};

#[derive(Debug, Clone)]
pub struct CreateInvitationParams {
    pub id: String,
    pub workspace_id: WorkspaceId,
    pub invited_by: UserId,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub expires_at: i64,
    pub created_at: i64,
}

#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Retires prior pending rows for the (workspace, email) pair and
    /// inserts the new pending invitation in one transaction, keeping the
    /// at-most-one-pending invariant.
    async fn create_invitation(&self, params: CreateInvitationParams) -> Result<InvitationRecord>;

    async fn fetch_by_token(&self, token: &str) -> Result<Option<InvitationRecord>>;

    async fn fetch_by_id(&self, id: &str) -> Result<Option<InvitationRecord>>;

    async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<InvitationRecord>>;

    /// Membership insert plus status flip to `accepted`, atomically. The
    /// membership primary key decides concurrent accept races.
    async fn accept_invitation(
        &self,
        invitation_id: &str,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        role: Role,
        now: i64,
    ) -> Result<()>;

    async fn set_status(&self, id: &str, status: InvitationStatus, now: i64) -> Result<bool>;

    async fn set_expires_at(&self, id: &str, expires_at: i64, now: i64) -> Result<bool>;
}

pub type InvitationRepositoryRef = Arc<dyn InvitationRepository>;
