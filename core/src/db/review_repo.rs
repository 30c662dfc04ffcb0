use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::review::{ArtCommentRecord, ArtFeedbackRecord};

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn insert_comment(&self, record: &ArtCommentRecord) -> Result<()>;

    async fn list_comments(&self, art_id: &str) -> Result<Vec<ArtCommentRecord>>;

    async fn insert_feedback(&self, record: &ArtFeedbackRecord) -> Result<()>;

    async fn list_feedback(&self, art_id: &str) -> Result<Vec<ArtFeedbackRecord>>;
}

pub type ReviewRepositoryRef = Arc<dyn ReviewRepository>;
