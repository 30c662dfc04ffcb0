use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::workspace_repo::{CreateWorkspaceParams, UpdateWorkspaceParams, WorkspaceRepository},
    ids::{UserId, WorkspaceId},
    membership::{MembershipRecord, Role},
    workspace::WorkspaceRecord,
};

pub struct SqliteWorkspaceRepository {
    pool: Pool<Sqlite>,
}

impl SqliteWorkspaceRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_workspace_row(row: SqliteRow) -> WorkspaceRecord {
        WorkspaceRecord {
            id: WorkspaceId::from(row.get::<String, _>("id")),
            name: row.get("name"),
            contact_name: row.get("contact_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            notes: row.get("notes"),
            status: row.get("status"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }

    fn map_member_row(row: SqliteRow) -> Result<MembershipRecord> {
        Ok(MembershipRecord {
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            role: row.get::<String, _>("role").parse::<Role>()?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    const WORKSPACE_COLUMNS: &'static str = "id,
                 name,
                 contact_name,
                 email,
                 phone,
                 notes,
                 status,
                 created_at,
                 updated_at,
                 deleted_at";
}

#[async_trait]
impl WorkspaceRepository for SqliteWorkspaceRepository {
    async fn create_workspace(&self, params: CreateWorkspaceParams) -> Result<WorkspaceRecord> {
        let CreateWorkspaceParams {
            id,
            owner_id,
            name,
            contact_name,
            email,
            phone,
            notes,
            status,
            created_at,
        } = params;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO workspaces (
                 id,
                 name,
                 contact_name,
                 email,
                 phone,
                 notes,
                 status,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id.as_str())
        .bind(&name)
        .bind(contact_name.as_ref())
        .bind(&email)
        .bind(phone.as_ref())
        .bind(notes.as_ref())
        .bind(&status)
        .bind(created_at)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO workspace_members (
                 workspace_id,
                 user_id,
                 role,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&owner_id)
        .bind(Role::Owner.as_str())
        .bind(created_at)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(WorkspaceRecord {
            id,
            name,
            contact_name,
            email,
            phone,
            notes,
            status,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn fetch_workspace(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM workspaces WHERE id = ? AND deleted_at IS NULL",
            columns = Self::WORKSPACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_workspace_row))
    }

    async fn fetch_workspace_with_deleted(&self, id: &str) -> Result<Option<WorkspaceRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM workspaces WHERE id = ?",
            columns = Self::WORKSPACE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_workspace_row))
    }

    async fn list_workspaces_for_user(&self, user_id: &str) -> Result<Vec<WorkspaceRecord>> {
        let rows = sqlx::query(
            "SELECT
                 w.id,
                 w.name,
                 w.contact_name,
                 w.email,
                 w.phone,
                 w.notes,
                 w.status,
                 w.created_at,
                 w.updated_at,
                 w.deleted_at
             FROM workspaces w
             JOIN workspace_members wm ON wm.workspace_id = w.id
             WHERE wm.user_id = ?
               AND w.deleted_at IS NULL
             ORDER BY w.created_at ASC, w.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::map_workspace_row).collect())
    }

    async fn update_workspace(&self, params: UpdateWorkspaceParams) -> Result<bool> {
        let UpdateWorkspaceParams {
            id,
            name,
            contact_name,
            email,
            phone,
            notes,
            status,
            updated_at,
        } = params;

        let mut builder = QueryBuilder::new("UPDATE workspaces SET ");
        let mut has_updates = false;

        if let Some(name) = name {
            builder.push("name = ");
            builder.push_bind(name);
            has_updates = true;
        }
        if let Some(contact_name) = contact_name {
            if has_updates {
                builder.push(", ");
            }
            builder.push("contact_name = ");
            builder.push_bind(contact_name);
            has_updates = true;
        }
        if let Some(email) = email {
            if has_updates {
                builder.push(", ");
            }
            builder.push("email = ");
            builder.push_bind(email);
            has_updates = true;
        }
        if let Some(phone) = phone {
            if has_updates {
                builder.push(", ");
            }
            builder.push("phone = ");
            builder.push_bind(phone);
            has_updates = true;
        }
        if let Some(notes) = notes {
            if has_updates {
                builder.push(", ");
            }
            builder.push("notes = ");
            builder.push_bind(notes);
            has_updates = true;
        }
        if let Some(status) = status {
            if has_updates {
                builder.push(", ");
            }
            builder.push("status = ");
            builder.push_bind(status);
            has_updates = true;
        }

        if !has_updates {
            return Ok(false);
        }

        builder.push(", updated_at = ");
        builder.push_bind(updated_at);
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND deleted_at IS NULL");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_member_role(&self, workspace_id: &str, user_id: &str) -> Result<Option<Role>> {
        let row = sqlx::query(
            "SELECT role
             FROM workspace_members
             WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.get::<String, _>("role").parse::<Role>()?)),
            None => Ok(None),
        }
    }

    async fn get_member(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<Option<MembershipRecord>> {
        let row = sqlx::query(
            "SELECT workspace_id, user_id, role, created_at, updated_at
             FROM workspace_members
             WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(workspace_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_member_row).transpose()
    }

    async fn list_members(&self, workspace_id: &str) -> Result<Vec<MembershipRecord>> {
        let rows = sqlx::query(
            "SELECT workspace_id, user_id, role, created_at, updated_at
             FROM workspace_members
             WHERE workspace_id = ?
             ORDER BY created_at ASC, user_id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::map_member_row).collect()
    }

    async fn count_members(&self, workspace_id: &str) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS member_count
             FROM workspace_members
             WHERE workspace_id = ?",
        )
        .bind(workspace_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("member_count"))
    }

    async fn insert_member(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: Role,
        now: i64,
    ) -> Result<()> {
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
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn set_member_role(
        &self,
        workspace_id: &str,
        user_id: &str,
        role: Role,
        now: i64,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE workspace_members SET role = ?, updated_at = ?
             WHERE workspace_id = ? AND user_id = ?",
        )
        .bind(role.as_str())
        .bind(now)
        .bind(workspace_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_member(&self, workspace_id: &str, user_id: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM workspace_members WHERE workspace_id = ? AND user_id = ?")
                .bind(workspace_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
