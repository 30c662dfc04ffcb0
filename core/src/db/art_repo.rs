use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    art::{ArtRecord, ArtStatus},
    ids::{ArtId, TaskId},
};

#[derive(Debug, Clone)]
pub struct CreateArtParams {
    pub id: ArtId,
    pub task_id: TaskId,
    pub title: Option<String>,
    pub art_path: String,
    pub status: ArtStatus,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct UpdateArtParams {
    pub id: String,
    pub title: Option<String>,
    pub art_path: Option<String>,
    pub updated_at: i64,
}

#[async_trait]
pub trait ArtRepository: Send + Sync {
    async fn insert_art(&self, params: CreateArtParams) -> Result<ArtRecord>;

    async fn fetch_art(&self, id: &str) -> Result<Option<ArtRecord>>;

    async fn fetch_art_with_deleted(&self, id: &str) -> Result<Option<ArtRecord>>;

    async fn list_arts(&self, task_id: &str) -> Result<Vec<ArtRecord>>;

    async fn update_art(&self, params: UpdateArtParams) -> Result<bool>;

    async fn set_art_status(&self, id: &str, status: ArtStatus, now: i64) -> Result<bool>;

    async fn set_art_path(&self, id: &str, art_path: &str, now: i64) -> Result<bool>;
}

pub type ArtRepositoryRef = Arc<dyn ArtRepository>;
