use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};

use crate::{
    db::user_repo::UserRepository,
    ids::UserId,
    user::{SubscriptionRecord, SubscriptionStatus, UserRecord},
};

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn map_user_row(row: SqliteRow) -> UserRecord {
        UserRecord {
            id: UserId::from(row.get::<String, _>("id")),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            deleted_at: row.get("deleted_at"),
        }
    }

    fn map_subscription_row(row: SqliteRow) -> Result<SubscriptionRecord> {
        Ok(SubscriptionRecord {
            id: row.get("id"),
            user_id: UserId::from(row.get::<String, _>("user_id")),
            status: row
                .get::<String, _>("status")
                .parse::<SubscriptionStatus>()
                .map_err(anyhow::Error::msg)?,
            ends_at: row.get("ends_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert_user(&self, record: &UserRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (
                 id,
                 name,
                 email,
                 password_hash,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.name.as_ref())
        .bind(&record.email)
        .bind(&record.password_hash)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at, updated_at, deleted_at
             FROM users
             WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_user_row))
    }

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, created_at, updated_at, deleted_at
             FROM users
             WHERE email = ? AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::map_user_row))
    }

    async fn insert_subscription(&self, record: &SubscriptionRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO subscriptions (
                 id,
                 user_id,
                 status,
                 ends_at,
                 created_at,
                 updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.status.as_str())
        .bind(record.ends_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn latest_subscription(&self, user_id: &str) -> Result<Option<SubscriptionRecord>> {
        let row = sqlx::query(
            "SELECT id, user_id, status, ends_at, created_at, updated_at
             FROM subscriptions
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::map_subscription_row).transpose()
    }
}
