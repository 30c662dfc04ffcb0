use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::review_repo::ReviewRepository,
    ids::{ArtId, UserId},
    review::{ArtCommentRecord, ArtFeedbackRecord},
};

pub struct SqliteReviewRepository {
    pool: Pool<Sqlite>,
}

impl SqliteReviewRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_comment_row(row: SqliteRow) -> ArtCommentRecord {
        ArtCommentRecord {
            id: row.get("id"),
            art_id: ArtId::from(row.get::<String, _>("art_id")),
            author_id: UserId::from(row.get::<String, _>("author_id")),
            x: row.get("x"),
            y: row.get("y"),
            body: row.get("body"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }

    fn map_feedback_row(row: SqliteRow) -> ArtFeedbackRecord {
        ArtFeedbackRecord {
            id: row.get("id"),
            art_id: ArtId::from(row.get::<String, _>("art_id")),
            author_id: UserId::from(row.get::<String, _>("author_id")),
            feedback: row.get("feedback"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepository {
    async fn insert_comment(&self, record: &ArtCommentRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO art_comments (
                 id,
                 art_id,
                 author_id,
                 x,
                 y,
                 body,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.art_id)
        .bind(&record.author_id)
        .bind(record.x)
        .bind(record.y)
        .bind(&record.body)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_comments(&self, art_id: &str) -> Result<Vec<ArtCommentRecord>> {
        let rows = sqlx::query(
            "SELECT id, art_id, author_id, x, y, body, created_at, updated_at, deleted_at
             FROM art_comments
             WHERE art_id = ? AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC",
        )
        .bind(art_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::map_comment_row).collect())
    }

    async fn insert_feedback(&self, record: &ArtFeedbackRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO art_feedback (
                 id,
                 art_id,
                 author_id,
                 feedback,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.art_id)
        .bind(&record.author_id)
        .bind(&record.feedback)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_feedback(&self, art_id: &str) -> Result<Vec<ArtFeedbackRecord>> {
        let rows = sqlx::query(
            "SELECT id, art_id, author_id, feedback, created_at, updated_at, deleted_at
             FROM art_feedback
             WHERE art_id = ? AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC",
        )
        .bind(art_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::map_feedback_row).collect())
    }
}
