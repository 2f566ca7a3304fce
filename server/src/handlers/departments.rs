// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use hotel_common::{CreateDepartmentPayload, Department, DepartmentQuery, UpdateDepartmentPayload};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use super::{message, AppError};
use crate::auth::CurrentUser;
use crate::database::departments;

pub async fn list_departments(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Query(query): Query<DepartmentQuery>,
) -> Result<Json<Vec<Department>>, AppError> {
    let list = departments::list_departments_from_db(&pool, query.include_inactive.unwrap_or(false)).await?;
    Ok(Json(list))
}

pub async fn get_department(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Department>, AppError> {
    departments::get_department_from_db(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Department with ID {} not found.", id)))
}

/// Handler for creating a department. The colour is picked from the palette when omitted.
pub async fn create_department(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<CreateDepartmentPayload>,
) -> Result<(StatusCode, Json<Department>), AppError> {
    user.require(user.role().manages_staff())?;
    payload.validate()?;
    debug!("Received request to create department {}", payload.code);
    let department = departments::create_department_in_db(&pool, payload).await?;
    info!("Department {} created by {}.", department.code, user.employee.username);
    Ok((StatusCode::CREATED, Json(department)))
}

pub async fn update_department(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateDepartmentPayload>,
) -> Result<Json<Department>, AppError> {
    user.require(user.role().manages_staff())?;
    payload.validate()?;
    departments::update_department_in_db(&pool, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Department with ID {} not found.", id)))
}

/// Soft delete; employees keep their department link.
pub async fn delete_department(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_staff())?;
    if departments::deactivate_department_in_db(&pool, id).await? {
        info!("Department {} deactivated.", id);
        Ok(message(format!("Department {} deactivated.", id)))
    } else {
        Err(AppError::not_found(&format!("Department with ID {} not found.", id)))
    }
}
