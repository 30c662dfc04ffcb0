use atelier_core::{
    db::errors::is_unique_violation,
    invitation::{InvitationRecord, InvitationStatus},
    membership::Role,
    notification::{InvitationNotification, InvitationNotifier},
    workspace::WorkspaceRecord,
};
use chrono::Utc;
use tracing::warn;

use crate::{
    AppError, AppState,
    access::{self, MEMBERSHIP_MANAGER_ROLES},
};

/// Listing row for the owner view; expiry is computed lazily at read time.
#[derive(Debug, Clone)]
pub struct InvitationListing {
    pub invitation: InvitationRecord,
    pub is_expired: bool,
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::validation("email must be a valid address"));
    }
    if email.len() > 255 {
        return Err(AppError::validation("email must be at most 255 characters"));
    }
    Ok(())
}

/// Gone-precondition shared by show, accept and decline: terminal or lapsed
/// invitations are no longer actionable.
fn ensure_actionable(invitation: &InvitationRecord, now: i64) -> Result<(), AppError> {
    if invitation.is_expired(now) {
        return Err(AppError::gone("Invitation has expired"));
    }
    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::gone("Invitation is no longer valid"));
    }
    Ok(())
}

/// Dispatch happens after the invitation row commits. A failed send is
/// logged and swallowed; the invitation stays valid and resendable.
async fn dispatch_notification(
    state: &AppState,
    workspace: &WorkspaceRecord,
    invitation: &InvitationRecord,
) {
    let notification = InvitationNotification::new(workspace, invitation);
    if let Err(err) = state.notifier.send_invitation(&notification).await {
        warn!(
            invitation_id = %invitation.id,
            to = %invitation.email,
            error = %err,
            "failed to dispatch invitation email"
        );
    }
}

/// Owner-only invitation. Any previous pending invitation for the same
/// (workspace, email) pair is retired to `expired` in the same transaction
/// that inserts the fresh row, so at most one pending invitation exists per
/// pair at any instant.
pub async fn create_invitation(
    state: &AppState,
    workspace_id: &str,
    inviter: &str,
    email: &str,
    role: Role,
) -> Result<InvitationRecord, AppError> {
    let workspace = access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, inviter, MEMBERSHIP_MANAGER_ROLES).await?;
    validate_email(email)?;

    let invited_user = state
        .user_store
        .find_by_email(email)
        .await
        .map_err(AppError::from_anyhow)?;

    if let Some(user) = invited_user {
        let existing = state
            .workspace_store
            .find_member_role(workspace_id, user.id.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
        if existing.is_some() {
            return Err(AppError::conflict(
                "User is already collaborating with this workspace",
            ));
        }
    }

    access::ensure_invite_allowed(state, workspace_id, role).await?;

    let invitation = state
        .invitation_store
        .create(workspace_id, inviter, email, role)
        .await
        .map_err(AppError::from_anyhow)?;

    dispatch_notification(state, &workspace, &invitation).await;

    Ok(invitation)
}

/// Public token lookup used by the join page; the token itself is the
/// credential.
pub async fn show_invitation(state: &AppState, token: &str) -> Result<InvitationRecord, AppError> {
    let invitation = state
        .invitation_store
        .find_by_token(token)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    ensure_actionable(&invitation, Utc::now().timestamp())?;
    Ok(invitation)
}

/// Accepting creates the membership and flips the invitation to `accepted`
/// in one transaction. The membership primary key settles concurrent
/// accepts; the loser surfaces Conflict.
pub async fn accept_invitation(
    state: &AppState,
    token: &str,
    user_id: &str,
) -> Result<InvitationRecord, AppError> {
    let invitation = state
        .invitation_store
        .find_by_token(token)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    ensure_actionable(&invitation, Utc::now().timestamp())?;

    let user = state
        .user_store
        .find_by_id(user_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.email != invitation.email {
        return Err(AppError::unauthorized(
            "This invitation was not sent to your email address",
        ));
    }

    let existing = state
        .workspace_store
        .find_member_role(invitation.workspace_id.as_str(), user_id)
        .await
        .map_err(AppError::from_anyhow)?;
    if existing.is_some() {
        return Err(AppError::conflict(
            "You are already collaborating with this workspace",
        ));
    }

    state
        .invitation_store
        .accept(&invitation, user_id)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::conflict("You are already collaborating with this workspace")
            } else {
                AppError::from_anyhow(err)
            }
        })?;

    state
        .invitation_store
        .find_by_id(&invitation.id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))
}

pub async fn decline_invitation(state: &AppState, token: &str) -> Result<(), AppError> {
    let invitation = state
        .invitation_store
        .find_by_token(token)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    ensure_actionable(&invitation, Utc::now().timestamp())?;

    state
        .invitation_store
        .mark_status(&invitation.id, InvitationStatus::Declined)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(())
}

/// Owner-side cancellation reuses the `declined` terminal state; there is
/// no separate cancelled state.
pub async fn cancel_invitation(
    state: &AppState,
    invitation_id: &str,
    acting_user: &str,
) -> Result<(), AppError> {
    let invitation = state
        .invitation_store
        .find_by_id(invitation_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    access::ensure_workspace(state, invitation.workspace_id.as_str()).await?;
    access::require_role(
        state,
        invitation.workspace_id.as_str(),
        acting_user,
        MEMBERSHIP_MANAGER_ROLES,
    )
    .await?;

    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::validation(
            "only pending invitations can be cancelled",
        ));
    }

    state
        .invitation_store
        .mark_status(&invitation.id, InvitationStatus::Declined)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(())
}

/// Extends the expiry window by another seven days and redispatches the
/// email. The token is deliberately not rotated.
pub async fn resend_invitation(
    state: &AppState,
    invitation_id: &str,
    acting_user: &str,
) -> Result<InvitationRecord, AppError> {
    let invitation = state
        .invitation_store
        .find_by_id(invitation_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    let workspace = access::ensure_workspace(state, invitation.workspace_id.as_str()).await?;
    access::require_role(
        state,
        invitation.workspace_id.as_str(),
        acting_user,
        MEMBERSHIP_MANAGER_ROLES,
    )
    .await?;

    if invitation.status != InvitationStatus::Pending {
        return Err(AppError::validation(
            "only pending invitations can be resent",
        ));
    }

    state
        .invitation_store
        .extend_expiry(&invitation.id)
        .await
        .map_err(AppError::from_anyhow)?;

    let refreshed = state
        .invitation_store
        .find_by_id(&invitation.id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::not_found("Invitation not found"))?;

    dispatch_notification(state, &workspace, &refreshed).await;

    Ok(refreshed)
}

/// Owner view of every invitation for the workspace, annotated with the
/// lazily computed expiry flag. No sweep flips lapsed rows; the flag is the
/// only place the clock is consulted.
pub async fn list_invitations(
    state: &AppState,
    workspace_id: &str,
    acting_user: &str,
) -> Result<Vec<InvitationListing>, AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, acting_user, MEMBERSHIP_MANAGER_ROLES).await?;

    let now = Utc::now().timestamp();
    let invitations = state
        .invitation_store
        .list_for_workspace(workspace_id)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(invitations
        .into_iter()
        .map(|invitation| {
            let is_expired = invitation.is_expired(now);
            InvitationListing {
                invitation,
                is_expired,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        backdate_invitation, seed_member, seed_premium_owner_workspace, seed_user, seed_workspace,
        setup_state, setup_state_recording, setup_state_with,
    };
    use atelier_core::invitation::INVITATION_TOKEN_LENGTH;
    use std::sync::Arc;

    #[tokio::test]
    async fn reinviting_retires_the_previous_pending_invitation() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        let first = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .expect("first invitation");

        let second = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .expect("second invitation");

        assert_ne!(first.token, second.token);
        assert_eq!(first.token.len(), INVITATION_TOKEN_LENGTH);

        let listings = list_invitations(&state, workspace.id.as_str(), owner.id.as_str())
            .await
            .unwrap();
        let pending: Vec<_> = listings
            .iter()
            .filter(|listing| listing.invitation.status == InvitationStatus::Pending)
            .collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].invitation.id, second.id);

        let retired = state
            .invitation_store
            .find_by_id(&first.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(retired.status, InvitationStatus::Expired);
    }

    #[tokio::test]
    async fn accepting_a_retired_token_is_gone_and_the_live_one_succeeds() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let invitee = seed_user(&state, "a@x.com").await;

        let retired = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();
        let live = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();

        let err = accept_invitation(&state, &retired.token, invitee.id.as_str())
            .await
            .expect_err("retired token");
        assert_eq!(err.status(), 410);

        let accepted = accept_invitation(&state, &live.token, invitee.id.as_str())
            .await
            .expect("accept");
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert!(accepted.accepted_at.is_some());

        let role = state
            .workspace_store
            .find_member_role(workspace.id.as_str(), invitee.id.as_str())
            .await
            .unwrap();
        assert_eq!(role, Some(Role::Participant));
    }

    #[tokio::test]
    async fn accepting_twice_is_gone_and_creates_no_second_membership() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let invitee = seed_user(&state, "a@x.com").await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Viewer,
        )
        .await
        .unwrap();

        accept_invitation(&state, &invitation.token, invitee.id.as_str())
            .await
            .expect("first accept");
        let err = accept_invitation(&state, &invitation.token, invitee.id.as_str())
            .await
            .expect_err("second accept");
        assert_eq!(err.status(), 410);

        assert_eq!(
            state
                .workspace_store
                .count_members(workspace.id.as_str())
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn accepting_while_already_a_member_conflicts() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let invitee = seed_user(&state, "a@x.com").await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();

        // The invitee is attached through another path before accepting.
        state
            .workspace_store
            .attach_member(workspace.id.as_str(), invitee.id.as_str(), Role::Viewer)
            .await
            .unwrap();

        let err = accept_invitation(&state, &invitation.token, invitee.id.as_str())
            .await
            .expect_err("duplicate membership");
        assert_eq!(err.status(), 409);

        let stored = state
            .invitation_store
            .find_by_id(&invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn acceptance_requires_the_invited_email() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let other = seed_user(&state, "someone-else@example.com").await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();

        let err = accept_invitation(&state, &invitation.token, other.id.as_str())
            .await
            .expect_err("email mismatch");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn lapsed_invitations_are_gone_without_any_sweep() {
        let (_guard, db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let invitee = seed_user(&state, "a@x.com").await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();
        backdate_invitation(&db, &invitation.id, -60).await;

        let err = accept_invitation(&state, &invitation.token, invitee.id.as_str())
            .await
            .expect_err("lapsed");
        assert_eq!(err.status(), 410);

        // The row itself still says pending; only reads see the lapse.
        let stored = state
            .invitation_store
            .find_by_id(&invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, InvitationStatus::Pending);

        let listings = list_invitations(&state, workspace.id.as_str(), owner.id.as_str())
            .await
            .unwrap();
        assert!(listings[0].is_expired);
    }

    #[tokio::test]
    async fn inviting_an_existing_collaborator_conflicts() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let member = seed_member(&state, &workspace, "member@example.com", Role::Viewer).await;

        let err = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            &member.email,
            Role::Participant,
        )
        .await
        .expect_err("already collaborating");
        assert_eq!(err.status(), 409);
    }

    #[tokio::test]
    async fn free_tier_caps_at_three_collaborators() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        seed_member(&state, &workspace, "second@example.com", Role::Participant).await;
        seed_member(&state, &workspace, "third@example.com", Role::Viewer).await;

        let err = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "fourth@example.com",
            Role::Participant,
        )
        .await
        .expect_err("cap reached");
        assert_eq!(err.status(), 403);

        assert!(
            state
                .invitation_store
                .list_for_workspace(workspace.id.as_str())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn premium_tier_caps_at_ten_collaborators() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_premium_owner_workspace(&state).await;

        for i in 1..10 {
            seed_member(
                &state,
                &workspace,
                &format!("member{i}@example.com"),
                Role::Participant,
            )
            .await;
        }

        let err = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "eleventh@example.com",
            Role::Participant,
        )
        .await
        .expect_err("premium cap reached");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn reviewer_invitations_require_a_premium_owner() {
        let (_guard, _db, state) = setup_state().await;
        let (free_workspace, free_owner) = seed_workspace(&state).await;

        let err = create_invitation(
            &state,
            free_workspace.id.as_str(),
            free_owner.id.as_str(),
            "reviewer@example.com",
            Role::ClientReviewer,
        )
        .await
        .expect_err("free owner cannot invite reviewers");
        assert_eq!(err.status(), 403);

        let (premium_workspace, premium_owner) = seed_premium_owner_workspace(&state).await;
        create_invitation(
            &state,
            premium_workspace.id.as_str(),
            premium_owner.id.as_str(),
            "reviewer@example.com",
            Role::ClientReviewer,
        )
        .await
        .expect("premium owner invites reviewer");
    }

    #[tokio::test]
    async fn only_owners_invite() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, _owner) = seed_workspace(&state).await;
        let participant =
            seed_member(&state, &workspace, "participant@example.com", Role::Participant).await;

        let err = create_invitation(
            &state,
            workspace.id.as_str(),
            participant.id.as_str(),
            "a@x.com",
            Role::Viewer,
        )
        .await
        .expect_err("participant cannot invite");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn cancel_is_owner_only_and_pending_only() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Viewer,
        )
        .await
        .unwrap();

        cancel_invitation(&state, &invitation.id, owner.id.as_str())
            .await
            .expect("cancel pending");

        let cancelled = state
            .invitation_store
            .find_by_id(&invitation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cancelled.status, InvitationStatus::Declined);

        let err = cancel_invitation(&state, &invitation.id, owner.id.as_str())
            .await
            .expect_err("already terminal");
        assert_eq!(err.status(), 422);
    }

    #[tokio::test]
    async fn resend_extends_expiry_without_rotating_the_token() {
        let (_guard, db, state, recorder) = setup_state_recording().await;
        let (workspace, owner) = seed_workspace(&state).await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();
        backdate_invitation(&db, &invitation.id, 60).await;

        let resent = resend_invitation(&state, &invitation.id, owner.id.as_str())
            .await
            .expect("resend");

        assert_eq!(resent.token, invitation.token);
        assert!(resent.expires_at > chrono::Utc::now().timestamp() + 6 * 86_400);

        let sent = recorder.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].token, invitation.token);
    }

    #[tokio::test]
    async fn declined_invitations_stay_declined() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let invitee = seed_user(&state, "a@x.com").await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .unwrap();

        decline_invitation(&state, &invitation.token)
            .await
            .expect("decline");

        let err = accept_invitation(&state, &invitation.token, invitee.id.as_str())
            .await
            .expect_err("declined is terminal");
        assert_eq!(err.status(), 410);

        assert_eq!(
            state
                .workspace_store
                .count_members(workspace.id.as_str())
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn failed_dispatch_leaves_the_invitation_committed_and_resendable() {
        let (_guard, _db, state) =
            setup_state_with(Arc::new(crate::notify::FailingInvitationNotifier)).await;
        let (workspace, owner) = seed_workspace(&state).await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Participant,
        )
        .await
        .expect("row commits despite dead mailer");

        let resent = resend_invitation(&state, &invitation.id, owner.id.as_str())
            .await
            .expect("resend also survives dispatch failure");
        assert_eq!(resent.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn show_returns_the_invitation_for_a_live_token() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;

        let invitation = create_invitation(
            &state,
            workspace.id.as_str(),
            owner.id.as_str(),
            "a@x.com",
            Role::Viewer,
        )
        .await
        .unwrap();

        let shown = show_invitation(&state, &invitation.token).await.unwrap();
        assert_eq!(shown.id, invitation.id);

        let err = show_invitation(&state, "unknown-token")
            .await
            .expect_err("unknown token");
        assert_eq!(err.status(), 404);
    }
}
