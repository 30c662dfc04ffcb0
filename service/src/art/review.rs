use atelier_core::{
    art::{ArtRecord, ArtStatus},
    review::ArtCommentRecord,
    storage::{ArtStorage, path_basename},
};

use crate::{
    AppError, AppState,
    access::{self, REVIEWER_ROLES},
};

const FEEDBACK_MAX_LENGTH: usize = 1000;

fn validate_feedback(feedback: &str) -> Result<(), AppError> {
    if feedback.len() > FEEDBACK_MAX_LENGTH {
        return Err(AppError::validation(
            "feedback must be at most 1000 characters",
        ));
    }
    Ok(())
}

/// Reviewer verdict on a deliverable. The status write commits first; when
/// the verdict is `approved`, the stored file then moves into the
/// reviewer's approved folder. The move is a second, non-transactional
/// effect: a storage failure leaves the status at approved with the path
/// still pointing at the working location, and surfaces as Internal.
pub async fn review_art(
    state: &AppState,
    art_id: &str,
    user_id: &str,
    new_status: ArtStatus,
    feedback: Option<&str>,
) -> Result<ArtRecord, AppError> {
    let (art, _task, workspace) = access::art_with_workspace(state, art_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, REVIEWER_ROLES).await?;

    if let Some(feedback) = feedback {
        validate_feedback(feedback)?;
    }

    state
        .art_store
        .set_status(art.id.as_str(), new_status)
        .await
        .map_err(AppError::from_anyhow)?;

    if let Some(feedback) = feedback.filter(|feedback| !feedback.trim().is_empty()) {
        state
            .review_store
            .add_feedback(art.id.as_str(), user_id, feedback)
            .await
            .map_err(AppError::from_anyhow)?;
    }

    if new_status == ArtStatus::Approved {
        let approved_path = format!(
            "{workspace_id}/{user_id}/approved/{basename}",
            workspace_id = workspace.id,
            basename = path_basename(&art.art_path)
        );

        state
            .art_storage
            .relocate(&art.art_path, &approved_path)
            .await
            .map_err(AppError::from_anyhow)?;

        state
            .art_store
            .set_path(art.id.as_str(), &approved_path)
            .await
            .map_err(AppError::from_anyhow)?;
    }

    state
        .art_store
        .find_by_id(art_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::art_not_found(art_id))
}

/// Pin a positional comment onto a deliverable. The comment always forces
/// the status back to `revision_requested`, no matter what it was before,
/// including approved and archived.
pub async fn add_comment(
    state: &AppState,
    art_id: &str,
    user_id: &str,
    x: i64,
    y: i64,
    body: &str,
) -> Result<ArtCommentRecord, AppError> {
    let (art, _task, workspace) = access::art_with_workspace(state, art_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, REVIEWER_ROLES).await?;

    if x < 0 || y < 0 {
        return Err(AppError::validation(
            "comment anchor must be a non-negative position",
        ));
    }
    if body.trim().is_empty() {
        return Err(AppError::validation("comment must not be empty"));
    }
    if body.len() > FEEDBACK_MAX_LENGTH {
        return Err(AppError::validation(
            "comment must be at most 1000 characters",
        ));
    }

    let comment = state
        .review_store
        .add_comment(art.id.as_str(), user_id, x, y, body)
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .art_store
        .set_status(art.id.as_str(), ArtStatus::RevisionRequested)
        .await
        .map_err(AppError::from_anyhow)?;

    Ok(comment)
}

/// Any workspace member may read the annotations on a deliverable.
pub async fn list_comments(
    state: &AppState,
    art_id: &str,
    user_id: &str,
) -> Result<Vec<ArtCommentRecord>, AppError> {
    let (art, _task, workspace) = access::art_with_workspace(state, art_id).await?;
    access::require_member(state, workspace.id.as_str(), user_id).await?;

    state
        .review_store
        .list_comments(art.id.as_str())
        .await
        .map_err(AppError::from_anyhow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_art, seed_member, seed_task, seed_workspace, setup_state};
    use atelier_core::membership::Role;

    #[tokio::test]
    async fn approval_relocates_the_stored_file() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;
        assert_eq!(art.art_path, "art/xyz.jpg");

        let approved = review_art(
            &state,
            art.id.as_str(),
            reviewer.id.as_str(),
            ArtStatus::Approved,
            Some("ship it"),
        )
        .await
        .expect("approve");

        let expected = format!("{}/{}/approved/xyz.jpg", workspace.id, reviewer.id);
        assert_eq!(approved.status, ArtStatus::Approved);
        assert_eq!(approved.art_path, expected);
        assert!(!state.art_storage.exists("art/xyz.jpg").await.unwrap());
        assert!(state.art_storage.exists(&expected).await.unwrap());

        let feedback = state
            .review_store
            .list_feedback(art.id.as_str())
            .await
            .unwrap();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].feedback, "ship it");
    }

    #[tokio::test]
    async fn rejection_records_feedback_without_moving_the_file() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;

        let rejected = review_art(
            &state,
            art.id.as_str(),
            reviewer.id.as_str(),
            ArtStatus::Rejected,
            Some("wrong palette"),
        )
        .await
        .expect("reject");

        assert_eq!(rejected.status, ArtStatus::Rejected);
        assert_eq!(rejected.art_path, "art/xyz.jpg");
        assert!(state.art_storage.exists("art/xyz.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn only_reviewers_review() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;

        let err = review_art(
            &state,
            art.id.as_str(),
            owner.id.as_str(),
            ArtStatus::Approved,
            None,
        )
        .await
        .expect_err("owner is not a reviewer");
        assert_eq!(err.status(), 403);
    }

    #[tokio::test]
    async fn comments_force_revision_requested_even_after_approval() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;

        review_art(
            &state,
            art.id.as_str(),
            reviewer.id.as_str(),
            ArtStatus::Approved,
            None,
        )
        .await
        .expect("approve");

        let comment = add_comment(
            &state,
            art.id.as_str(),
            reviewer.id.as_str(),
            120,
            48,
            "the logo is off-center",
        )
        .await
        .expect("comment");
        assert_eq!(comment.x, 120);
        assert_eq!(comment.y, 48);

        let current = state
            .art_store
            .find_by_id(art.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, ArtStatus::RevisionRequested);
    }

    #[tokio::test]
    async fn comments_override_archived_too() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;
        state
            .art_store
            .set_status(art.id.as_str(), ArtStatus::Archived)
            .await
            .unwrap();

        add_comment(&state, art.id.as_str(), reviewer.id.as_str(), 0, 0, "revive")
            .await
            .expect("comment");

        let current = state
            .art_store
            .find_by_id(art.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, ArtStatus::RevisionRequested);
    }

    #[tokio::test]
    async fn a_failed_relocation_leaves_the_status_approved_and_the_path_unchanged() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;

        // Drop the stored object so the post-status move cannot succeed.
        state.art_storage.delete(&art.art_path).await.unwrap();

        let err = review_art(
            &state,
            art.id.as_str(),
            reviewer.id.as_str(),
            ArtStatus::Approved,
            None,
        )
        .await
        .expect_err("move fails");
        assert_eq!(err.status(), 500);

        let current = state
            .art_store
            .find_by_id(art.id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, ArtStatus::Approved);
        assert_eq!(current.art_path, "art/xyz.jpg");
    }

    #[tokio::test]
    async fn comment_anchors_must_be_non_negative() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;

        let err = add_comment(&state, art.id.as_str(), reviewer.id.as_str(), -1, 0, "x")
            .await
            .expect_err("negative anchor");
        assert_eq!(err.status(), 422);
    }

    #[tokio::test]
    async fn members_read_comments_and_outsiders_do_not() {
        let (_guard, _db, state) = setup_state().await;
        let (workspace, owner) = seed_workspace(&state).await;
        let reviewer =
            seed_member(&state, &workspace, "reviewer@example.com", Role::ClientReviewer).await;
        let task = seed_task(&state, &workspace, &owner).await;
        let art = seed_art(&state, &task, &owner, "xyz.jpg").await;
        let outsider = crate::test_support::seed_user(&state, "outsider@example.com").await;

        add_comment(&state, art.id.as_str(), reviewer.id.as_str(), 1, 2, "note")
            .await
            .unwrap();

        let comments = list_comments(&state, art.id.as_str(), owner.id.as_str())
            .await
            .expect("member reads");
        assert_eq!(comments.len(), 1);

        let err = list_comments(&state, art.id.as_str(), outsider.id.as_str())
            .await
            .expect_err("outsider denied");
        assert_eq!(err.status(), 403);
    }
}
