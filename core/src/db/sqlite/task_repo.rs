use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::task_repo::{CreateTaskParams, TaskRepository, UpdateTaskParams},
    ids::{TaskId, UserId, WorkspaceId},
    task::{TaskRecord, TaskStatus},
};

pub struct SqliteTaskRepository {
    pool: Pool<Sqlite>,
}

impl SqliteTaskRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_task_row(row: SqliteRow) -> Result<TaskRecord> {
        Ok(TaskRecord {
            id: TaskId::from(row.get::<String, _>("id")),
            workspace_id: WorkspaceId::from(row.get::<String, _>("workspace_id")),
            title: row.get("title"),
            description: row.get("description"),
            deadline: row.get("deadline"),
            status: row.get::<String, _>("status").parse::<TaskStatus>()?,
            assigned_to: row
                .get::<Option<String>, _>("assigned_to")
                .map(UserId::from),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }

    const TASK_COLUMNS: &'static str = "id,
                 workspace_id,
                 title,
                 description,
                 deadline,
                 status,
                 assigned_to,
                 created_at,
                 updated_at,
                 deleted_at";
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert_task(&self, params: CreateTaskParams) -> Result<TaskRecord> {
        let CreateTaskParams {
            id,
            workspace_id,
            title,
            description,
            deadline,
            status,
            assigned_to,
            created_at,
        } = params;

        sqlx::query(
            "INSERT INTO tasks (
                 id,
                 workspace_id,
                 title,
                 description,
                 deadline,
                 status,
                 assigned_to,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&workspace_id)
        .bind(&title)
        .bind(description.as_ref())
        .bind(deadline)
        .bind(status.as_str())
        .bind(assigned_to.as_ref())
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(TaskRecord {
            id,
            workspace_id,
            title,
            description,
            deadline,
            status,
            assigned_to,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn fetch_task(&self, id: &str) -> Result<Option<TaskRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM tasks WHERE id = ? AND deleted_at IS NULL",
            columns = Self::TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_task_row).transpose()
    }

    async fn fetch_task_with_deleted(&self, id: &str) -> Result<Option<TaskRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM tasks WHERE id = ?",
            columns = Self::TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_task_row).transpose()
    }

    async fn list_tasks(&self, workspace_id: &str) -> Result<Vec<TaskRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {columns}
             FROM tasks
             WHERE workspace_id = ? AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC",
            columns = Self::TASK_COLUMNS
        ))
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::map_task_row).collect()
    }

    async fn update_task(&self, params: UpdateTaskParams) -> Result<bool> {
        let UpdateTaskParams {
            id,
            title,
            description,
            deadline,
            status,
            assigned_to,
            updated_at,
        } = params;

        let mut builder = QueryBuilder::new("UPDATE tasks SET ");
        let mut has_updates = false;

        if let Some(title) = title {
            builder.push("title = ");
            builder.push_bind(title);
            has_updates = true;
        }
        if let Some(description) = description {
            if has_updates {
                builder.push(", ");
            }
            builder.push("description = ");
            builder.push_bind(description);
            has_updates = true;
        }
        if let Some(deadline) = deadline {
            if has_updates {
                builder.push(", ");
            }
            builder.push("deadline = ");
            builder.push_bind(deadline);
            has_updates = true;
        }
        if let Some(status) = status {
            if has_updates {
                builder.push(", ");
            }
            builder.push("status = ");
            builder.push_bind(status.as_str());
            has_updates = true;
        }
        if let Some(assigned_to) = assigned_to {
            if has_updates {
                builder.push(", ");
            }
            builder.push("assigned_to = ");
            builder.push_bind(assigned_to.map(String::from));
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

    async fn set_task_status(&self, id: &str, status: TaskStatus, now: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
