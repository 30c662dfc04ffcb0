use anyhow::Result;
use async_trait::async_trait;

use crate::{invitation::InvitationRecord, membership::Role, workspace::WorkspaceRecord};

/// Payload handed to the outbound mail collaborator when an invitation is
/// created or resent.
#[derive(Debug, Clone)]
pub struct InvitationNotification {
    pub to_email: String,
    pub workspace_id: String,
    pub workspace_name: String,
    pub inviter_id: String,
    pub role: Role,
    pub token: String,
    pub expires_at: i64,
}

impl InvitationNotification {
    pub fn new(workspace: &WorkspaceRecord, invitation: &InvitationRecord) -> Self {
        Self {
            to_email: invitation.email.clone(),
            workspace_id: workspace.id.to_string(),
            workspace_name: workspace.name.clone(),
            inviter_id: invitation.invited_by.to_string(),
            role: invitation.role,
            token: invitation.token.clone(),
            expires_at: invitation.expires_at,
        }
    }
}

/// Outbound invitation mail. Dispatch is not transactional with the
/// invitation row: a failed send leaves the row committed and resendable.
#[async_trait]
pub trait InvitationNotifier: Send + Sync {
    async fn send_invitation(&self, notification: &InvitationNotification) -> Result<()>;
}
