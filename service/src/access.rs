use atelier_core::{
    art::ArtRecord,
    membership::Role,
    task::TaskRecord,
    user::PlanTier,
    workspace::WorkspaceRecord,
};
use chrono::Utc;

use crate::{AppError, AppState};

/// Per-operation allow-lists. Services reference these constants instead of
/// scattering role literals through the call sites.
pub const WORK_EDITOR_ROLES: &[Role] = &[Role::Owner, Role::Participant];
pub const REVIEWER_ROLES: &[Role] = &[Role::ClientReviewer];
pub const MEMBERSHIP_MANAGER_ROLES: &[Role] = &[Role::Owner];
pub const WORKSPACE_ADMIN_ROLES: &[Role] = &[Role::Owner];

/// Membership lookup for the caller; absence is an authorization failure,
/// never a not-found.
pub async fn require_member(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<Role, AppError> {
    state
        .workspace_store
        .find_member_role(workspace_id, user_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::workspace_access_denied(workspace_id))
}

/// Generic role gate: caller must be a member whose role appears in the
/// operation's allow-list.
pub async fn require_role(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
    allowed: &[Role],
) -> Result<Role, AppError> {
    let role = require_member(state, workspace_id, user_id).await?;
    if allowed.contains(&role) {
        Ok(role)
    } else {
        Err(AppError::workspace_access_denied(workspace_id))
    }
}

/// Existence resolves before authorization: a missing workspace is a
/// distinct NotFound.
pub async fn ensure_workspace(
    state: &AppState,
    workspace_id: &str,
) -> Result<WorkspaceRecord, AppError> {
    state
        .workspace_store
        .find_by_id(workspace_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::workspace_not_found(workspace_id))
}

/// Ownership-chain walk: task to its workspace.
pub async fn task_with_workspace(
    state: &AppState,
    task_id: &str,
) -> Result<(TaskRecord, WorkspaceRecord), AppError> {
    let task = state
        .task_store
        .find_by_id(task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(task_id))?;

    let workspace = state
        .workspace_store
        .find_by_id_with_deleted(task.workspace_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::workspace_not_found(task.workspace_id.as_str()))?;

    Ok((task, workspace))
}

/// Ownership-chain walk: art through its task to the workspace.
pub async fn art_with_workspace(
    state: &AppState,
    art_id: &str,
) -> Result<(ArtRecord, TaskRecord, WorkspaceRecord), AppError> {
    let art = state
        .art_store
        .find_by_id(art_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::art_not_found(art_id))?;

    let task = state
        .task_store
        .find_by_id_with_deleted(art.task_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(art.task_id.as_str()))?;

    let workspace = state
        .workspace_store
        .find_by_id_with_deleted(task.workspace_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::workspace_not_found(task.workspace_id.as_str()))?;

    Ok((art, task, workspace))
}

/// Plan tier of the workspace's owning member. A workspace without an owner
/// cannot size its cap, which denies invitations outright.
pub async fn owner_plan_tier(
    state: &AppState,
    workspace_id: &str,
) -> Result<Option<PlanTier>, AppError> {
    let Some(owner) = state
        .workspace_store
        .find_owner(workspace_id)
        .await
        .map_err(AppError::from_anyhow)?
    else {
        return Ok(None);
    };

    let tier = state
        .user_store
        .plan_tier(owner.user_id.as_str(), Utc::now().timestamp())
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(Some(tier))
}

/// Collaborator-cap and premium gating, evaluated only on invitation
/// creation. The cap counts current memberships against the owner's tier;
/// reviewer seats require a premium owner.
pub async fn ensure_invite_allowed(
    state: &AppState,
    workspace_id: &str,
    invited_role: Role,
) -> Result<(), AppError> {
    let Some(tier) = owner_plan_tier(state, workspace_id).await? else {
        return Err(AppError::unauthorized(
            "Workspace has no owner to size its collaborator cap",
        ));
    };

    if invited_role == Role::ClientReviewer && tier != PlanTier::Premium {
        return Err(AppError::unauthorized(
            "Inviting a client reviewer requires a premium plan",
        ));
    }

    let member_count = state
        .workspace_store
        .count_members(workspace_id)
        .await
        .map_err(AppError::from_anyhow)?;

    if member_count >= tier.max_collaborators() {
        return Err(AppError::unauthorized(
            "Workspace collaborator limit reached",
        ));
    }

    Ok(())
}
