#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;
use uuid::Uuid;

use atelier_core::{
    art::ArtRecord,
    config::AppConfig,
    db::Database,
    membership::Role,
    notification::InvitationNotifier,
    task::{NewTask, TaskRecord, TaskStatus},
    user::{SubscriptionStatus, UserRecord},
    workspace::{WorkspaceProfile, WorkspaceRecord},
};

use crate::{
    AppState,
    auth::generate_password_hash,
    notify::RecordingInvitationNotifier,
    state::build_state,
    storage::MemoryArtStorage,
};

pub(crate) async fn setup_state() -> (TempDir, Database, AppState) {
    let (guard, database, state, _) = setup_state_recording().await;
    (guard, database, state)
}

pub(crate) async fn setup_state_recording()
-> (TempDir, Database, AppState, Arc<RecordingInvitationNotifier>) {
    let notifier = Arc::new(RecordingInvitationNotifier::new());
    let (guard, database, state) = setup_state_with(notifier.clone()).await;
    (guard, database, state, notifier)
}

pub(crate) async fn setup_state_with(
    notifier: Arc<dyn InvitationNotifier>,
) -> (TempDir, Database, AppState) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let mut config = AppConfig::default();
    let db_path = temp_dir.path().join("test.db");
    config.database_path = db_path.to_string_lossy().into_owned();

    let database = Database::connect(&config).await.expect("connect database");
    let state = build_state(&database, Arc::new(MemoryArtStorage::new()), notifier);

    (temp_dir, database, state)
}

pub(crate) async fn seed_user(state: &AppState, email: &str) -> UserRecord {
    let password_hash = generate_password_hash("password").expect("hash password");
    state
        .user_store
        .create(email, &password_hash, None)
        .await
        .expect("create user")
}

pub(crate) async fn seed_premium_user(state: &AppState, email: &str) -> UserRecord {
    let user = seed_user(state, email).await;
    state
        .user_store
        .record_subscription(user.id.as_str(), SubscriptionStatus::Active, None)
        .await
        .expect("record subscription");
    user
}

pub(crate) fn workspace_profile(name: &str) -> WorkspaceProfile {
    WorkspaceProfile {
        name: name.to_owned(),
        contact_name: None,
        email: format!("studio-{}@example.com", Uuid::new_v4().simple()),
        phone: None,
        notes: None,
    }
}

pub(crate) async fn seed_workspace(state: &AppState) -> (WorkspaceRecord, UserRecord) {
    let owner = seed_user(state, &format!("owner-{}@example.com", Uuid::new_v4().simple())).await;
    let workspace = state
        .workspace_store
        .create(owner.id.as_str(), workspace_profile("Test Studio"))
        .await
        .expect("create workspace");
    (workspace, owner)
}

pub(crate) async fn seed_premium_owner_workspace(
    state: &AppState,
) -> (WorkspaceRecord, UserRecord) {
    let owner = seed_premium_user(
        state,
        &format!("premium-{}@example.com", Uuid::new_v4().simple()),
    )
    .await;
    let workspace = state
        .workspace_store
        .create(owner.id.as_str(), workspace_profile("Premium Studio"))
        .await
        .expect("create workspace");
    (workspace, owner)
}

pub(crate) async fn seed_member(
    state: &AppState,
    workspace: &WorkspaceRecord,
    email: &str,
    role: Role,
) -> UserRecord {
    let user = seed_user(state, email).await;
    state
        .workspace_store
        .attach_member(workspace.id.as_str(), user.id.as_str(), role)
        .await
        .expect("attach member");
    user
}

pub(crate) fn new_task(title: &str) -> NewTask {
    NewTask {
        title: title.to_owned(),
        description: None,
        deadline: None,
        status: TaskStatus::Pending,
        assigned_to: None,
    }
}

pub(crate) async fn seed_task(
    state: &AppState,
    workspace: &WorkspaceRecord,
    editor: &UserRecord,
) -> TaskRecord {
    crate::task::service::create_task(
        state,
        workspace.id.as_str(),
        editor.id.as_str(),
        new_task("Design pass"),
    )
    .await
    .expect("create task")
}

pub(crate) async fn seed_art(
    state: &AppState,
    task: &TaskRecord,
    editor: &UserRecord,
    file_name: &str,
) -> ArtRecord {
    crate::art::service::create_art(
        state,
        task.id.as_str(),
        editor.id.as_str(),
        Some("Draft"),
        file_name,
        b"image-bytes",
    )
    .await
    .expect("create art")
}

/// Shift an invitation's expiry to `now + secs_from_now` (negative values
/// lapse it) so lazy-expiry paths can be exercised.
pub(crate) async fn backdate_invitation(database: &Database, invitation_id: &str, secs_from_now: i64) {
    sqlx::query("UPDATE workspace_invitations SET expires_at = ? WHERE id = ?")
        .bind(Utc::now().timestamp() + secs_from_now)
        .bind(invitation_id)
        .execute(database.pool())
        .await
        .expect("backdate invitation");
}
