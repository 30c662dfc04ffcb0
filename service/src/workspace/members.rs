use atelier_core::membership::Role;

use crate::{
    AppError, AppState,
    access::{self, MEMBERSHIP_MANAGER_ROLES},
};

fn ensure_not_self(acting_user: &str, target_user: &str) -> Result<(), AppError> {
    if acting_user == target_user {
        Err(AppError::unauthorized(
            "Owners cannot change their own membership",
        ))
    } else {
        Ok(())
    }
}

/// Owner-only role change. The acting owner may never target themself.
pub async fn update_member_role(
    state: &AppState,
    workspace_id: &str,
    acting_user: &str,
    target_user: &str,
    role: Role,
) -> Result<(), AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, acting_user, MEMBERSHIP_MANAGER_ROLES).await?;
    ensure_not_self(acting_user, target_user)?;

    let updated = state
        .workspace_store
        .set_member_role(workspace_id, target_user, role)
        .await
        .map_err(AppError::from_anyhow)?;

    if !updated {
        return Err(AppError::not_found("User is not a member of this workspace"));
    }

    Ok(())
}

/// Owner-only removal with the same self-targeting guard.
pub async fn remove_member(
    state: &AppState,
    workspace_id: &str,
    acting_user: &str,
    target_user: &str,
) -> Result<(), AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, acting_user, MEMBERSHIP_MANAGER_ROLES).await?;
    ensure_not_self(acting_user, target_user)?;

    let removed = state
        .workspace_store
        .remove_member(workspace_id, target_user)
        .await
        .map_err(AppError::from_anyhow)?;

    if !removed {
        return Err(AppError::not_found("User is not a member of this workspace"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_member, seed_user, seed_workspace, setup_state};

    #[tokio::test]
    async fn owners_manage_member_roles() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let member = seed_member(&state, &workspace, "member@example.com", Role::Viewer).await;

        update_member_role(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            member.id.as_str(),
            Role::Participant,
        )
        .await
        .expect("role update");

        let role = state
            .workspace_store
            .find_member_role(workspace.id.as_str(), member.id.as_str())
            .await
            .unwrap();
        assert_eq!(role, Some(Role::Participant));
    }

    #[tokio::test]
    async fn non_owners_cannot_manage_members() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, _owner) = seed_workspace(&state).await;
        let participant =
            seed_member(&state, &workspace, "participant@example.com", Role::Participant).await;
        let viewer = seed_member(&state, &workspace, "viewer@example.com", Role::Viewer).await;

        let err = update_member_role(
            &state,
            workspace.id.as_str(),
            participant.id.as_str(),
            viewer.id.as_str(),
            Role::Participant,
        )
        .await
        .expect_err("participant denied");
        assert_eq!(err.status(), 403);

        let err = remove_member(
            &state,
            workspace.id.as_str(),
            viewer.id.as_str(),
            participant.id.as_str(),
        )
        .await
        .expect_err("viewer denied");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn owners_cannot_target_themselves() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        let err = remove_member(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            owner.id.as_str(),
        )
        .await
        .expect_err("self removal denied");
        assert_eq!(err.status(), 403);

        let err = update_member_role(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            owner.id.as_str(),
            Role::Viewer,
        )
        .await
        .expect_err("self demotion denied");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn removing_an_unknown_member_is_not_found() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let stranger = seed_user(&state, "stranger@example.com").await;

        let err = remove_member(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            stranger.id.as_str(),
        )
        .await
        .expect_err("stranger not a member");
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn removed_members_lose_access() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let member = seed_member(&state, &workspace, "member@example.com", Role::Participant).await;

        remove_member(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            member.id.as_str(),
        )
        .await
        .expect("removal");

        let err = crate::workspace::service::get_workspace(
            &state,
            workspace.id.as_str(),
            member.id.as_str(),
        )
        .await
        .expect_err("access revoked");
        assert_eq!(err.status(), 403);
    }
}
