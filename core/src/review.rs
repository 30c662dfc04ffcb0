use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Database, review_repo::ReviewRepositoryRef},
    ids::{ArtId, UserId},
};

/// Positional annotation a reviewer pins onto a deliverable. Creating one
/// always pushes the deliverable back to `revision_requested`.
#[derive(Debug, Clone)]
pub struct ArtCommentRecord {
    pub id: String,
    pub art_id: ArtId,
    pub author_id: UserId,
    pub x: i64,
    pub y: i64,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Free-text note captured alongside a review verdict, independent of the
/// status change itself.
#[derive(Debug, Clone)]
pub struct ArtFeedbackRecord {
    pub id: String,
    pub art_id: ArtId,
    pub author_id: UserId,
    pub feedback: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Clone)]
pub struct ReviewStore {
    repo: ReviewRepositoryRef,
}

impl ReviewStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().review_repo(),
        }
    }

    pub async fn add_comment(
        &self,
        art_id: &str,
        author_id: &str,
        x: i64,
        y: i64,
        body: &str,
    ) -> Result<ArtCommentRecord> {
        let now = Utc::now().timestamp();
        let record = ArtCommentRecord {
            id: Uuid::new_v4().to_string(),
            art_id: ArtId::from(art_id),
            author_id: UserId::from(author_id),
            x,
            y,
            body: body.to_owned(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.repo.insert_comment(&record).await?;
        Ok(record)
    }

    pub async fn list_comments(&self, art_id: &str) -> Result<Vec<ArtCommentRecord>> {
        self.repo.list_comments(art_id).await
    }

    pub async fn add_feedback(
        &self,
        art_id: &str,
        author_id: &str,
        feedback: &str,
    ) -> Result<ArtFeedbackRecord> {
        let now = Utc::now().timestamp();
        let record = ArtFeedbackRecord {
            id: Uuid::new_v4().to_string(),
            art_id: ArtId::from(art_id),
            author_id: UserId::from(author_id),
            feedback: feedback.to_owned(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.repo.insert_feedback(&record).await?;
        Ok(record)
    }

    pub async fn list_feedback(&self, art_id: &str) -> Result<Vec<ArtFeedbackRecord>> {
        self.repo.list_feedback(art_id).await
    }
}
