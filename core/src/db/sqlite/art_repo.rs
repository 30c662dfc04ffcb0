use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    art::{ArtRecord, ArtStatus},
    db::art_repo::{ArtRepository, CreateArtParams, UpdateArtParams},
    ids::{ArtId, TaskId},
};

pub struct SqliteArtRepository {
    pool: Pool<Sqlite>,
}

impl SqliteArtRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_art_row(row: SqliteRow) -> Result<ArtRecord> {
        Ok(ArtRecord {
            id: ArtId::from(row.get::<String, _>("id")),
            task_id: TaskId::from(row.get::<String, _>("task_id")),
            title: row.get("title"),
            art_path: row.get("art_path"),
            status: row.get::<String, _>("status").parse::<ArtStatus>()?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        })
    }

    const ART_COLUMNS: &'static str =
        "id, task_id, title, art_path, status, created_at, updated_at, deleted_at";
}

#[async_trait]
impl ArtRepository for SqliteArtRepository {
    async fn insert_art(&self, params: CreateArtParams) -> Result<ArtRecord> {
        let CreateArtParams {
            id,
            task_id,
            title,
            art_path,
            status,
            created_at,
        } = params;

        sqlx::query(
            "INSERT INTO art (
                 id,
                 task_id,
                 title,
                 art_path,
                 status,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&task_id)
        .bind(title.as_ref())
        .bind(&art_path)
        .bind(status.as_str())
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(ArtRecord {
            id,
            task_id,
            title,
            art_path,
            status,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn fetch_art(&self, id: &str) -> Result<Option<ArtRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM art WHERE id = ? AND deleted_at IS NULL",
            columns = Self::ART_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_art_row).transpose()
    }

    async fn fetch_art_with_deleted(&self, id: &str) -> Result<Option<ArtRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {columns} FROM art WHERE id = ?",
            columns = Self::ART_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_art_row).transpose()
    }

    async fn list_arts(&self, task_id: &str) -> Result<Vec<ArtRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {columns}
             FROM art
             WHERE task_id = ? AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC",
            columns = Self::ART_COLUMNS
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::map_art_row).collect()
    }

    async fn update_art(&self, params: UpdateArtParams) -> Result<bool> {
        let UpdateArtParams {
            id,
            title,
            art_path,
            updated_at,
        } = params;

        let mut builder = QueryBuilder::new("UPDATE art SET ");
        let mut has_updates = false;

        if let Some(title) = title {
            builder.push("title = ");
            builder.push_bind(title);
            has_updates = true;
        }
        if let Some(art_path) = art_path {
            if has_updates {
                builder.push(", ");
            }
            builder.push("art_path = ");
            builder.push_bind(art_path);
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

    async fn set_art_status(&self, id: &str, status: ArtStatus, now: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE art SET status = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_art_path(&self, id: &str, art_path: &str, now: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE art SET art_path = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(art_path)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
