use std::{fmt, str::FromStr};

use anyhow::Result;
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use uuid::Uuid;

use crate::{
    db::{
        Database,
        invitation_repo::{CreateInvitationParams, InvitationRepositoryRef},
    },
    ids::{UserId, WorkspaceId},
    membership::Role,
};

/// Invitations live for seven days from creation (and from each resend).
pub const INVITATION_TTL_SECS: i64 = 7 * 86_400;

/// Length of the unguessable invitation token. Collisions are left to the
/// unique index on the token column.
pub const INVITATION_TOKEN_LENGTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInvitationStatusError(pub String);

impl fmt::Display for ParseInvitationStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid invitation status: {}", self.0)
    }
}

impl std::error::Error for ParseInvitationStatusError {}

impl FromStr for InvitationStatus {
    type Err = ParseInvitationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            "expired" => Ok(InvitationStatus::Expired),
            _ => Err(ParseInvitationStatusError(s.to_string())),
        }
    }
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
            InvitationStatus::Expired => "expired",
        }
    }
}

/// Token-addressed, time-bounded offer to join a workspace. Never hard
/// deleted; terminal states are accepted, declined and expired.
#[derive(Debug, Clone)]
pub struct InvitationRecord {
    pub id: String,
    pub workspace_id: WorkspaceId,
    pub invited_by: UserId,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub status: InvitationStatus,
    pub expires_at: i64,
    pub accepted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl InvitationRecord {
    /// Expiry is checked lazily at read time; nothing sweeps pending rows to
    /// `expired` on a timer.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at || self.status == InvitationStatus::Expired
    }

    pub fn is_pending(&self, now: i64) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }
}

/// Fixed-length alphanumeric token from an injected randomness source.
pub fn generate_token<R: Rng>(length: usize, rng: &mut R) -> String {
    std::iter::repeat_with(|| rng.sample(Alphanumeric))
        .take(length)
        .map(char::from)
        .collect()
}

#[derive(Clone)]
pub struct InvitationStore {
    repo: InvitationRepositoryRef,
}

impl InvitationStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().invitation_repo(),
        }
    }

    /// Insert a fresh pending invitation, retiring any previous pending row
    /// for the same (workspace, email) pair in the same transaction.
    pub async fn create(
        &self,
        workspace_id: &str,
        invited_by: &str,
        email: &str,
        role: Role,
    ) -> Result<InvitationRecord> {
        let now = Utc::now().timestamp();
        let token = generate_token(INVITATION_TOKEN_LENGTH, &mut rand::rng());

        self.repo
            .create_invitation(CreateInvitationParams {
                id: Uuid::new_v4().to_string(),
                workspace_id: WorkspaceId::from(workspace_id),
                invited_by: UserId::from(invited_by),
                email: email.to_owned(),
                role,
                token,
                expires_at: now + INVITATION_TTL_SECS,
                created_at: now,
            })
            .await
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<InvitationRecord>> {
        self.repo.fetch_by_token(token).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<InvitationRecord>> {
        self.repo.fetch_by_id(id).await
    }

    pub async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<InvitationRecord>> {
        self.repo.list_for_workspace(workspace_id).await
    }

    /// Attach the accepting user and flip the invitation to `accepted`
    /// atomically. A membership uniqueness violation propagates so the
    /// caller can surface Conflict to the race loser.
    pub async fn accept(&self, invitation: &InvitationRecord, user_id: &str) -> Result<()> {
        self.repo
            .accept_invitation(
                &invitation.id,
                &invitation.workspace_id,
                &UserId::from(user_id),
                invitation.role,
                Utc::now().timestamp(),
            )
            .await
    }

    pub async fn mark_status(&self, id: &str, status: InvitationStatus) -> Result<bool> {
        self.repo
            .set_status(id, status, Utc::now().timestamp())
            .await
    }

    /// Resend support: push the expiry window out without rotating the token.
    pub async fn extend_expiry(&self, id: &str) -> Result<bool> {
        let now = Utc::now().timestamp();
        self.repo
            .set_expires_at(id, now + INVITATION_TTL_SECS, now)
            .await
    }
}
