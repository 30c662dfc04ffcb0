use std::sync::Arc;

use atelier_core::{
    art::ArtStore, cascade::CascadeEngine, db::Database, invitation::InvitationStore,
    notification::InvitationNotifier, review::ReviewStore, storage::ArtStorage, task::TaskStore,
    user::UserStore, workspace::WorkspaceStore,
};

#[derive(Clone)]
pub struct AppState {
    pub user_store: UserStore,
    pub workspace_store: WorkspaceStore,
    pub invitation_store: InvitationStore,
    pub task_store: TaskStore,
    pub art_store: ArtStore,
    pub review_store: ReviewStore,
    pub cascade: CascadeEngine,
    pub art_storage: Arc<dyn ArtStorage>,
    pub notifier: Arc<dyn InvitationNotifier>,
}

pub fn build_state(
    database: &Database,
    art_storage: Arc<dyn ArtStorage>,
    notifier: Arc<dyn InvitationNotifier>,
) -> AppState {
    AppState {
        user_store: UserStore::new(database),
        workspace_store: WorkspaceStore::new(database),
        invitation_store: InvitationStore::new(database),
        task_store: TaskStore::new(database),
        art_store: ArtStore::new(database),
        review_store: ReviewStore::new(database),
        cascade: CascadeEngine::new(database),
        art_storage,
        notifier,
    }
}
