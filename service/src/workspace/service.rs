use atelier_core::{
    cascade::EntityKind,
    db::errors::is_unique_violation,
    membership::MembershipRecord,
    workspace::{WorkspaceProfile, WorkspaceProfileUpdate, WorkspaceRecord},
};

use crate::{
    AppError, AppState,
    access::{self, WORK_EDITOR_ROLES, WORKSPACE_ADMIN_ROLES},
};

fn validate_profile(name: &str, email: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name must not be empty"));
    }
    if name.len() > 255 {
        return Err(AppError::validation("name must be at most 255 characters"));
    }
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::validation("email must be a valid address"));
    }
    Ok(())
}

/// Any authenticated user may create a workspace; the creator becomes its
/// first owner in the same transaction.
pub async fn create_workspace(
    state: &AppState,
    user_id: &str,
    profile: WorkspaceProfile,
) -> Result<WorkspaceRecord, AppError> {
    validate_profile(&profile.name, &profile.email)?;

    state
        .workspace_store
        .create(user_id, profile)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict("A workspace with this email already exists")
            } else {
                AppError::from_anyhow(err)
            }
        })
}

pub async fn get_workspace(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<WorkspaceRecord, AppError> {
    let workspace = access::ensure_workspace(state, workspace_id).await?;
    access::require_member(state, workspace_id, user_id).await?;
    Ok(workspace)
}

pub async fn list_workspaces(
    state: &AppState,
    user_id: &str,
) -> Result<Vec<WorkspaceRecord>, AppError> {
    state
        .workspace_store
        .list_for_user(user_id)
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn list_members(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<Vec<MembershipRecord>, AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_member(state, workspace_id, user_id).await?;

    state
        .workspace_store
        .list_members(workspace_id)
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn update_workspace(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
    update: WorkspaceProfileUpdate,
) -> Result<WorkspaceRecord, AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, user_id, WORK_EDITOR_ROLES).await?;

    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
    }
    if let Some(email) = &update.email {
        if email.trim().is_empty() || !email.contains('@') {
            return Err(AppError::validation("email must be a valid address"));
        }
    }

    state
        .workspace_store
        .update(workspace_id, update)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict("A workspace with this email already exists")
            } else {
                AppError::from_anyhow(err)
            }
        })?
        .ok_or_else(|| AppError::workspace_not_found(workspace_id))
}

/// Soft delete cascades to tasks, invitations, art and review records. A
/// permanent purge skips the cascade walk and removes the rows outright.
pub async fn delete_workspace(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
    permanently: bool,
) -> Result<(), AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, user_id, WORKSPACE_ADMIN_ROLES).await?;

    if permanently {
        state
            .cascade
            .purge(EntityKind::Workspace, workspace_id)
            .await
            .map_err(AppError::from_anyhow)?;
        return Ok(());
    }

    state
        .cascade
        .soft_delete(EntityKind::Workspace, workspace_id)
        .await
        .map_err(AppError::from_anyhow)
}

/// Restore resurrects every tombstoned dependent under the workspace,
/// including any that were deleted independently beforehand.
pub async fn restore_workspace(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<WorkspaceRecord, AppError> {
    let workspace = state
        .workspace_store
        .find_by_id_with_deleted(workspace_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::workspace_not_found(workspace_id))?;

    access::require_role(state, workspace_id, user_id, WORKSPACE_ADMIN_ROLES).await?;

    if workspace.deleted_at.is_some() {
        state
            .cascade
            .restore(EntityKind::Workspace, workspace_id)
            .await
            .map_err(AppError::from_anyhow)?;
    }

    access::ensure_workspace(state, workspace_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, seed_workspace, setup_state, workspace_profile};

    #[tokio::test]
    async fn creator_becomes_owner() {
        let (_guard, _db, state) = setup_state().await;
        let user = seed_user(&state, "owner@example.com").await;

        let workspace = create_workspace(&state, user.id.as_str(), workspace_profile("Acme"))
            .await
            .expect("create workspace");

        let role = state
            .workspace_store
            .find_member_role(workspace.id.as_str(), user.id.as_str())
            .await
            .unwrap();
        assert_eq!(role, Some(atelier_core::membership::Role::Owner));
    }

    #[tokio::test]
    async fn duplicate_workspace_email_conflicts() {
        let (_guard, _db, state) = setup_state().await;
        let user = seed_user(&state, "owner@example.com").await;
        let profile = workspace_profile("Acme");

        create_workspace(&state, user.id.as_str(), profile.clone())
            .await
            .expect("create workspace");
        let err = create_workspace(&state, user.id.as_str(), profile)
            .await
            .expect_err("duplicate email");
        assert_eq!(err.status(), 409);
    }

    #[tokio::test]
    async fn empty_profile_fields_are_rejected() {
        let (_guard, _db, state) = setup_state().await;
        let user = seed_user(&state, "owner@example.com").await;

        let mut profile = workspace_profile("Acme");
        profile.name = "  ".into();
        let err = create_workspace(&state, user.id.as_str(), profile)
            .await
            .expect_err("blank name");
        assert_eq!(err.status(), 422);

        let mut profile = workspace_profile("Acme");
        profile.email = "not-an-email".into();
        let err = create_workspace(&state, user.id.as_str(), profile)
            .await
            .expect_err("bad email");
        assert_eq!(err.status(), 422);
    }

    #[tokio::test]
    async fn non_members_cannot_read_a_workspace() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, _owner) = seed_workspace(&state).await;
        let outsider = seed_user(&state, "outsider@example.com").await;

        let err = get_workspace(&state, workspace.id.as_str(), outsider.id.as_str())
            .await
            .expect_err("outsider denied");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn soft_deleted_workspaces_disappear_from_reads_until_restored() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        delete_workspace(&state, workspace.id.as_str(), owner.id.as_str(), false)
            .await
            .expect("soft delete");

        let err = get_workspace(&state, workspace.id.as_str(), owner.id.as_str())
            .await
            .expect_err("tombstoned workspace hidden");
        assert_eq!(err.status(), 404);
        assert!(
            list_workspaces(&state, owner.id.as_str())
                .await
                .unwrap()
                .is_empty()
        );

        let restored = restore_workspace(&state, workspace.id.as_str(), owner.id.as_str())
            .await
            .expect("restore");
        assert_eq!(restored.id, workspace.id);
        assert!(restored.deleted_at.is_none());
    }

    #[tokio::test]
    async fn only_owners_delete_workspaces() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, _owner) = seed_workspace(&state).await;
        let participant = seed_user(&state, "participant@example.com").await;
        state
            .workspace_store
            .attach_member(
                workspace.id.as_str(),
                participant.id.as_str(),
                atelier_core::membership::Role::Participant,
            )
            .await
            .unwrap();

        let err = delete_workspace(
            &state,
            workspace.id.as_str(),
            participant.id.as_str(),
            false,
        )
        .await
        .expect_err("participant denied");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn purge_removes_the_row_for_good() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        delete_workspace(&state, workspace.id.as_str(), owner.id.as_str(), true)
            .await
            .expect("purge");

        let gone = state
            .workspace_store
            .find_by_id_with_deleted(workspace.id.as_str())
            .await
            .unwrap();
        assert!(gone.is_none());
    }
}
