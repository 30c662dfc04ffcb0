use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::invitation_repo::{CreateInvitationParams, InvitationRepository},
    ids::{UserId, WorkspaceId},
    invitation::{InvitationRecord, InvitationStatus},
    membership::Role,
};

pub struct SqliteInvitationRepository {
    pool: Pool<Sqlite>,
}

impl SqliteInvitationRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_invitation_row(row: SqliteRow) -> Result<InvitationRecord> {
        Ok(InvitationRecord {
            id: row.get("id"),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            invited_by: UserId::from(row.get::<String, _>("invited_by")),
            email: row.get("email"),
            role: row.get::<String, _>("role").parse::<Role>()?,
            token: row.get("token"),
            status: row.get::<String, _>("status").parse::<InvitationStatus>()?,
            expires_at: row.get("expires_at"),
            accepted_at: row.get("accepted_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }

    const INVITATION_COLUMNS: &'static str = "id,
                 workspace_id,
                 invited_by,
                 email,
                 role,
                 token,
                 status,
                 expires_at,
                 accepted_at,
                 created_at,
                 updated_at,
                 deleted_at";
}

#[async_trait]
impl InvitationRepository for SqliteInvitationRepository {
    async fn create_invitation(&self, params: CreateInvitationParams) -> Result<InvitationRecord> {
        let CreateInvitationParams {
            id,
            workspace_id,
            invited_by,
            email,
            role,
            token,
            expires_at,
            created_at,
        } = params;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE workspace_invitations SET status = ?, updated_at = ?
             WHERE workspace_id = ? AND email = ? AND status = ?",
        )
        .bind(InvitationStatus::Expired.as_str())
        .bind(created_at)
        .bind(&workspace_id)
        .bind(&email)
        .bind(InvitationStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO workspace_invitations (
                 id,
                 workspace_id,
                 invited_by,
                 email,
                 role,
                 token,
                 status,
                 expires_at,
                 accepted_at,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)",
        )
        .bind(&id)
        .bind(&workspace_id)
        .bind(&invited_by)
        .bind(&email)
        .bind(role.as_str())
        .bind(&token)
        .bind(InvitationStatus::Pending.as_str())
        .bind(expires_at)
        .bind(created_at)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(InvitationRecord {
            id,
            workspace_id,
            invited_by,
            email,
            role,
            token,
            status: InvitationStatus::Pending,
            expires_at,
            accepted_at: None,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn fetch_by_token(&self, token: &str) -> Result<Option<InvitationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM workspace_invitations WHERE token = ? AND deleted_at IS NULL",
            columns = Self::INVITATION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_invitation_row).transpose()
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<InvitationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM workspace_invitations WHERE id = ? AND deleted_at IS NULL",
            columns = Self::INVITATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_invitation_row).transpose()
    }

    async fn list_for_workspace(&self, workspace_id: &str) -> Result<Vec<InvitationRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {columns}
             FROM workspace_invitations
             WHERE workspace_id = ? AND deleted_at IS NULL
             ORDER BY created_at DESC, id ASC",
            columns = Self::INVITATION_COLUMNS
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::map_invitation_row).collect()
    }

    async fn accept_invitation(
        &self,
        invitation_id: &str,
        workspace_id: &WorkspaceId,
        user_id: &UserId,
        role: Role,
        now: i64,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO workspace_members (
                 workspace_id,
                 user_id,
                 role,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE workspace_invitations
             SET status = ?, accepted_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(InvitationStatus::Accepted.as_str())
        .bind(now)
        .bind(now)
        .bind(invitation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn set_status(&self, id: &str, status: InvitationStatus, now: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE workspace_invitations SET status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_expires_at(&self, id: &str, expires_at: i64, now: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE workspace_invitations SET expires_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(expires_at)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
