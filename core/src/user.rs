use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{Database, user_repo::UserRepositoryRef},
    ids::UserId,
};

/// Collaborator cap tier, derived from the user's subscription record rather
/// than stored on the user row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanTier {
    Free,
    Premium,
}

impl PlanTier {
    /// Maximum number of memberships a workspace owned by a user of this
    /// tier may hold.
    pub fn max_collaborators(&self) -> i64 {
        match self {
            PlanTier::Free => 3,
            PlanTier::Premium => 10,
        }
    }
}

/// Billing status mirrored from the external subscription processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            _ => Err(format!("invalid subscription status: {}", s)),
        }
    }
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    pub id: String,
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub ends_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SubscriptionRecord {
    /// A subscription grants premium while active or trialing and not past
    /// its end timestamp.
    pub fn is_active(&self, now: i64) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        ) && self.ends_at.is_none_or(|ends_at| ends_at > now)
    }
}

#[derive(Clone)]
pub struct UserStore {
    repo: UserRepositoryRef,
}

impl UserStore {
    pub fn new(database: &Database) -> Self {
        Self {
            repo: database.repositories().user_repo(),
        }
    }

    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<UserRecord> {
        let id = UserId::from(Uuid::new_v4().to_string());
        let now = Utc::now().timestamp();
        let record = UserRecord {
            id,
            name: name.map(ToOwned::to_owned),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        self.repo.insert_user(&record).await?;
        Ok(record)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        self.repo.fetch_user(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.repo.fetch_user_by_email(email).await
    }

    /// Derive the plan tier from the user's most recent subscription row.
    /// Users without a subscription (or with a lapsed one) are free tier.
    pub async fn plan_tier(&self, user_id: &str, now: i64) -> Result<PlanTier> {
        let subscription = self.repo.latest_subscription(user_id).await?;
        Ok(match subscription {
            Some(record) if record.is_active(now) => PlanTier::Premium,
            _ => PlanTier::Free,
        })
    }

    /// Record the external processor's view of a subscription. Billing
    /// webhooks are the only writer.
    pub async fn record_subscription(
        &self,
        user_id: &str,
        status: SubscriptionStatus,
        ends_at: Option<i64>,
    ) -> Result<SubscriptionRecord> {
        let now = Utc::now().timestamp();
        let record = SubscriptionRecord {
            id: Uuid::new_v4().to_string(),
            user_id: UserId::from(user_id),
            status,
            ends_at,
            created_at: now,
            updated_at: now,
        };

        self.repo.insert_subscription(&record).await?;
        Ok(record)
    }
}
