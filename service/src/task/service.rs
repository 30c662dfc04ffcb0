use atelier_core::{
    cascade::EntityKind,
    task::{NewTask, TaskRecord, TaskStatus, TaskUpdate},
};

use crate::{
    AppError, AppState,
    access::{self, WORK_EDITOR_ROLES},
};

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if title.len() > 255 {
        return Err(AppError::validation("title must be at most 255 characters"));
    }
    Ok(())
}

pub async fn create_task(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
    task: NewTask,
) -> Result<TaskRecord, AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_role(state, workspace_id, user_id, WORK_EDITOR_ROLES).await?;
    validate_title(&task.title)?;

    if let Some(assignee) = &task.assigned_to {
        let exists = state
            .user_store
            .find_by_id(assignee.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
        if exists.is_none() {
            return Err(AppError::validation("assigned user does not exist"));
        }
    }

    state
        .task_store
        .create(workspace_id, task)
        .await
        .map_err(AppError::from_anyhow)
}

/// Any workspace member may read a task.
pub async fn get_task(
    state: &AppState,
    task_id: &str,
    user_id: &str,
) -> Result<TaskRecord, AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_member(state, workspace.id.as_str(), user_id).await?;
    Ok(task)
}

pub async fn list_tasks(
    state: &AppState,
    workspace_id: &str,
    user_id: &str,
) -> Result<Vec<TaskRecord>, AppError> {
    access::ensure_workspace(state, workspace_id).await?;
    access::require_member(state, workspace_id, user_id).await?;

    state
        .task_store
        .list_for_workspace(workspace_id)
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn update_task(
    state: &AppState,
    task_id: &str,
    user_id: &str,
    update: TaskUpdate,
) -> Result<TaskRecord, AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(Some(assignee)) = &update.assigned_to {
        let exists = state
            .user_store
            .find_by_id(assignee.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
        if exists.is_none() {
            return Err(AppError::validation("assigned user does not exist"));
        }
    }

    state
        .task_store
        .update(task.id.as_str(), update)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(task_id))
}

/// The status field has no transition graph: any editor may set any member
/// of the closed set from any prior state.
pub async fn update_task_status(
    state: &AppState,
    task_id: &str,
    user_id: &str,
    status: TaskStatus,
) -> Result<TaskRecord, AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    state
        .task_store
        .set_status(task.id.as_str(), status)
        .await
        .map_err(AppError::from_anyhow)?;

    state
        .task_store
        .find_by_id(task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(task_id))
}

pub async fn delete_task(
    state: &AppState,
    task_id: &str,
    user_id: &str,
    permanently: bool,
) -> Result<(), AppError> {
    let (task, workspace) = access::task_with_workspace(state, task_id).await?;
    access::require_role(state, workspace.id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if permanently {
        state
            .cascade
            .purge(EntityKind::Task, task.id.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
        return Ok(());
    }

    state
        .cascade
        .soft_delete(EntityKind::Task, task.id.as_str())
        .await
        .map_err(AppError::from_anyhow)
}

pub async fn restore_task(
    state: &AppState,
    task_id: &str,
    user_id: &str,
) -> Result<TaskRecord, AppError> {
    let task = state
        .task_store
        .find_by_id_with_deleted(task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(task_id))?;

    access::require_role(state, task.workspace_id.as_str(), user_id, WORK_EDITOR_ROLES).await?;

    if task.deleted_at.is_some() {
        state
            .cascade
            .restore(EntityKind::Task, task.id.as_str())
            .await
            .map_err(AppError::from_anyhow)?;
    }

    state
        .task_store
        .find_by_id(task_id)
        .await
        .map_err(AppError::from_anyhow)?
        .ok_or_else(|| AppError::task_not_found(task_id))
}
