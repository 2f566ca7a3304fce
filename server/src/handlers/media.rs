// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Multipart, Path, State};
use axum::extract::multipart::MultipartError;
use hotel_common::{CleaningTask, Employee, Leave, MaintenanceTask};
use tracing::debug;

use super::leaves::visible_leave;
use super::AppError;
use crate::auth::CurrentUser;
use crate::database::{cleaning, employees, leaves, maintenance};
use crate::media::{self, MediaKind};
use crate::state::AppState;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::new(err.status(), &err.body_text())
    }
}

/// Reads the `file` field and stores it under the media root.
async fn store_file(state: &AppState, kind: MediaKind, mut multipart: Multipart) -> Result<String, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::bad_request("The file field has no file name."))?;
        let data = field.bytes().await?;
        debug!("Received {} ({} bytes) for {:?}", filename, data.len(), kind);
        let stored = media::store_upload(&state.config.media_root, kind, &filename, &data).await?;
        return Ok(stored);
    }
    Err(AppError::bad_request("Missing \"file\" field."))
}

pub async fn upload_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Json<Employee>, AppError> {
    let path = store_file(&state, MediaKind::Avatar, multipart).await?;
    employees::set_avatar_in_db(&state.pool, user.id(), &path).await?;
    employees::get_employee_from_db(&state.pool, user.id())
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Employee with ID {} not found.", user.id())))
}

/// Supporting document of a leave request, uploaded by its requester.
pub async fn upload_leave_attachment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<Leave>, AppError> {
    let leave = visible_leave(&state, &user, id).await?;
    if leave.employee_id != user.id() {
        return Err(AppError::forbidden("Only the requester can attach documents."));
    }
    let path = store_file(&state, MediaKind::LeaveAttachment, multipart).await?;
    leaves::set_leave_attachment_in_db(&state.pool, id, &path).await?;
    leaves::get_leave_from_db(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Leave with ID {} not found.", id)))
}

pub async fn upload_cleaning_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<CleaningTask>, AppError> {
    let task = cleaning::get_cleaning_task_from_db(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Cleaning task with ID {} not found.", id)))?;
    user.require(task.assigned_to == Some(user.id()) || user.role().manages_housekeeping())?;

    let path = store_file(&state, MediaKind::CleaningPhoto, multipart).await?;
    cleaning::set_cleaning_photo_in_db(&state.pool, id, &path).await?;
    Ok(Json(CleaningTask {
        photo_path: Some(path),
        ..task
    }))
}

pub async fn upload_maintenance_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<MaintenanceTask>, AppError> {
    let task = maintenance::get_maintenance_task_from_db(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Maintenance request with ID {} not found.", id)))?;
    user.require(
        task.reported_by == Some(user.id())
            || task.assigned_to == Some(user.id())
            || user.role().manages_maintenance(),
    )?;

    let path = store_file(&state, MediaKind::MaintenancePhoto, multipart).await?;
    maintenance::set_maintenance_photo_in_db(&state.pool, id, &path).await?;
    Ok(Json(MaintenanceTask {
        photo_path: Some(path),
        ..task
    }))
}
