use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::user::{SubscriptionRecord, UserRecord};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, record: &UserRecord) -> Result<()>;

    async fn fetch_user(&self, id: &str) -> Result<Option<UserRecord>>;

    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    async fn insert_subscription(&self, record: &SubscriptionRecord) -> Result<()>;

    /// Most recent subscription row for the user, if any.
    async fn latest_subscription(&self, user_id: &str) -> Result<Option<SubscriptionRecord>>;
}

pub type UserRepositoryRef = Arc<dyn UserRepository>;
