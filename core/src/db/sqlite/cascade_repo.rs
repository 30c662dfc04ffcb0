use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use crate::{
    cascade::EntityKind,
    db::cascade_repo::CascadeRepository,
};

pub struct SqliteCascadeRepository {
    pool: Pool<Sqlite>,
}

impl SqliteCascadeRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CascadeRepository for SqliteCascadeRepository {
    async fn soft_delete_tree(&self, kind: EntityKind, id: &str, now: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut queue = vec![(kind, id.to_owned())];

        while let Some((kind, id)) = queue.pop() {
            sqlx::query(&format!(
                "UPDATE {table} SET deleted_at = ?, updated_at = ? WHERE id = ?",
                table = kind.table()
            ))
            .bind(now)
            .bind(now)
            .bind(&id)
            .execute(&mut *tx)
            .await?;

            for relation in kind.dependents() {
                let rows = sqlx::query(&format!(
                    "SELECT id FROM {table} WHERE {foreign_key} = ?",
                    table = relation.child.table(),
                    foreign_key = relation.foreign_key
                ))
                .bind(&id)
                .fetch_all(&mut *tx)
                .await?;

                queue.extend(
                    rows.into_iter()
                        .map(|row| (relation.child, row.get::<String, _>("id"))),
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn restore_tree(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let mut queue = vec![(kind, id.to_owned())];

        while let Some((kind, id)) = queue.pop() {
            sqlx::query(&format!(
                "UPDATE {table} SET deleted_at = NULL WHERE id = ?",
                table = kind.table()
            ))
            .bind(&id)
            .execute(&mut *tx)
            .await?;

            // Only dependents that currently carry a tombstone are walked;
            // the walk does not ask why they were tombstoned.
            for relation in kind.dependents() {
                let rows = sqlx::query(&format!(
                    "SELECT id FROM {table} WHERE {foreign_key} = ? AND deleted_at IS NOT NULL",
                    table = relation.child.table(),
                    foreign_key = relation.foreign_key
                ))
                .bind(&id)
                .fetch_all(&mut *tx)
                .await?;

                queue.extend(
                    rows.into_iter()
                        .map(|row| (relation.child, row.get::<String, _>("id"))),
                );
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn purge(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {table} WHERE id = ?",
            table = kind.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
