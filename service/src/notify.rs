use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use atelier_core::notification::{InvitationNotification, InvitationNotifier};

/// Notifier for deployments without an outbound mail provider: logs the
/// dispatch and succeeds.
#[derive(Default)]
pub struct LogInvitationNotifier;

#[async_trait]
impl InvitationNotifier for LogInvitationNotifier {
    async fn send_invitation(&self, notification: &InvitationNotification) -> Result<()> {
        info!(
            to = %notification.to_email,
            workspace = %notification.workspace_name,
            role = %notification.role,
            "dispatching workspace invitation"
        );
        Ok(())
    }
}

/// Captures dispatched notifications for inspection in tests.
#[derive(Default)]
pub struct RecordingInvitationNotifier {
    sent: Mutex<Vec<InvitationNotification>>,
}

impl RecordingInvitationNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<InvitationNotification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl InvitationNotifier for RecordingInvitationNotifier {
    async fn send_invitation(&self, notification: &InvitationNotification) -> Result<()> {
        self.sent.lock().await.push(notification.clone());
        Ok(())
    }
}

/// Always fails; exercises the rule that a failed dispatch leaves the
/// committed invitation intact and resendable.
#[derive(Default)]
pub struct FailingInvitationNotifier;

#[async_trait]
impl InvitationNotifier for FailingInvitationNotifier {
    async fn send_invitation(&self, _notification: &InvitationNotification) -> Result<()> {
        anyhow::bail!("mail provider unavailable")
    }
}
