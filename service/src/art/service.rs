use atelier_core::{
    art::{ArtRecord, ArtStatus},
    cascade::EntityKind,
    storage::ArtStorage,
};

use crate::{
    AppError, AppState,
    access::{self, WORK_EDITOR_ROLES},
};

fn validate_title(title: Option<&str>) -> Result<(), AppError> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err(AppError::validation("title must not be empty"));
        }
        if title.len() > 255 {
            return Err(AppError::validation("title must be at most 255 characters"));
        }
    }
    Ok(())
}

fn validate_file_name(file_name: &str) -> Result<(), AppError> {
    if file_name.trim().is_empty() || file_name.contains('/') {
        return Err(AppError::validation("file name must be a plain name"));
    }
    Ok(())
}

/// Upload a deliverable under a task. The storage collaborator decides the
/// final path; new art always starts in `pending`.
pub async fn create_art(
    state: &AppState,
    task_id: &str,
    user_id: &str,
    title: Option<&str>,
    file_name: &str,
    content: &[u8],
) -> Result<ArtRecord, AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;
    validate_title(title)?;
    validate_file_name(file_name)?;

    let art_path = state
        .art_storage
        .store(content, &format!("art/{file_name}"))
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .art_store
        .create(task.id.as_str(), title, &art_path)
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn list_arts(
    state: &AppState,
    task_id: &str,
    user_id: &str,
) -> Result<Vec<ArtRecord>, AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_member(state, workspace.id.as_str(), user_id).await?;

    state
        .art_store
        .list_for_task(task.id.as_str())
        .await
        .map_err(AppError::from_anyhow)
}

/// Replace the title or file of a deliverable. Approved art is locked: it
/// has left the review loop and can only move through `add_comment`.
pub async fn update_art(
    state: &AppState,
    art_id: &str,
    user_id: &str,
    title: Option<String>,
    replacement: Option<(&str, &[u8])>,
) -> Result<ArtRecord, AppError> {
    let (art, _task, workspace) = access::art_with_workspace(state, art_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if art.status == ArtStatus::Approved {
        return Err(AppError::unauthorized("Approved art cannot be updated"));
    }
    validate_title(title.as_deref())?;

    let mut new_path = None;
    if let Some((file_name, content)) = replacement {
        validate_file_name(file_name)?;

        if state
            .art_storage
            .exists(&art.art_path)
            .await
            .map_err(AppError::from_anyhow)?
        {
            state
                .art_storage
                .delete(&art.art_path)
                .await
                .map_err(AppError::from_anyhow)?;
        }

        let stored = state
            .art_storage
            .store(content, &format!("art/{file_name}"))
            .await
            .map_err(AppError::from_anyhow)?;
        new_path = Some(stored);
    }

    state
        .art_store
        .update(art.id.as_str(), title, new_path)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::art_not_found(art_id))
}

pub async fn delete_art(
    state: &AppState,
    art_id: &str,
    user_id: &str,
    permanently: bool,
) -> Result<(), AppError> {
    let (art, _task, workspace) = access::art_with_workspace(state, art_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if permanently {
        state
            .cascade
            .purge(EntityKind::Art, art.id.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
        state
            .art_storage
            .delete(&art.art_path)
            .await
            .map_err(AppError::from_anyhow)?;
        return Ok(());
    }

    state
        .cascade
        .soft_delete(EntityKind::Art, art.id.as_str())
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn restore_art(
    state: &AppState,
    art_id: &str,
    user_id: &str,
) -> Result<ArtRecord, AppError> {
    let art = state
        .art_store
        .find_by_id_with_deleted(art_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::art_not_found(art_id))?;

    let task = state
        .task_store
        .find_by_id_with_deleted(art.task_id.as_str())
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(art.task_id.as_str()))?;

    access::require_role(state, task.workspace_id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if art.deleted_at.is_some() {
        state
            .cascade
            .restore(EntityKind::Art, art.id.as_str())
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
