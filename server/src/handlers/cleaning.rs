// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use hotel_common::{
    AssignPayload, CleaningList, CleaningQuery, CleaningTask, CompleteCleaningPayload, CreateCleaningTaskPayload,
    Employee, EmployeeRole, Page, UpdateCleaningTaskPayload,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use super::{message, AppError};
use crate::auth::CurrentUser;
use crate::database::{cleaning, employees};

const CLEANING_STAFF: [EmployeeRole; 2] = [EmployeeRole::RoomAttendant, EmployeeRole::HousekeepingManager];

async fn load_task(pool: &SqlitePool, id: i64) -> Result<CleaningTask, AppError> {
    cleaning::get_cleaning_task_from_db(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Cleaning task with ID {} not found.", id)))
}

/// The assignee works the task; housekeeping managers may step in.
fn ensure_worker(user: &CurrentUser, task: &CleaningTask) -> Result<(), AppError> {
    user.require(task.assigned_to == Some(user.id()) || user.role().manages_housekeeping())
}

/// Handler for the housekeeping list with its counters.
pub async fn list_cleaning_tasks(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Query(query): Query<CleaningQuery>,
) -> Result<Json<CleaningList>, AppError> {
    user.require(user.role().is_housekeeping_staff() || user.role().manages_housekeeping())?;
    let (items, total) = cleaning::list_cleaning_tasks_from_db(&pool, &query).await?;
    let stats = cleaning::cleaning_stats_from_db(&pool, Utc::now().date_naive()).await?;
    Ok(Json(CleaningList {
        tasks: Page::new(items, &query.page_query(), total),
        stats,
    }))
}

pub async fn get_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CleaningTask>, AppError> {
    let task = load_task(&pool, id).await?;
    user.require(user.role().is_housekeeping_staff() || user.role().manages_housekeeping())?;
    Ok(Json(task))
}

pub async fn create_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<CreateCleaningTaskPayload>,
) -> Result<(StatusCode, Json<CleaningTask>), AppError> {
    user.require(user.role().manages_housekeeping())?;
    payload.validate()?;
    debug!("Cleaning task requested for room {}", payload.room_id);
    let task = cleaning::create_cleaning_task_in_db(&pool, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCleaningTaskPayload>,
) -> Result<Json<CleaningTask>, AppError> {
    user.require(user.role().manages_housekeeping())?;
    payload.validate()?;
    let task = cleaning::update_cleaning_task_in_db(&pool, id, payload, Utc::now()).await?;
    Ok(Json(task))
}

pub async fn assign_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<CleaningTask>, AppError> {
    user.require(user.role().manages_housekeeping())?;
    let task = cleaning::assign_cleaning_task_in_db(&pool, id, payload.employee_id, Utc::now()).await?;
    Ok(Json(task))
}

pub async fn start_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CleaningTask>, AppError> {
    let task = load_task(&pool, id).await?;
    ensure_worker(&user, &task)?;
    let task = cleaning::start_cleaning_task_in_db(&pool, id, Utc::now()).await?;
    info!("Cleaning task {} started by {}.", id, user.employee.username);
    Ok(Json(task))
}

/// Handler for finishing a clean. The room becomes clean.
pub async fn complete_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<CompleteCleaningPayload>>,
) -> Result<Json<CleaningTask>, AppError> {
    let task = load_task(&pool, id).await?;
    ensure_worker(&user, &task)?;
    let notes = payload.and_then(|Json(p)| p.notes);
    let task = cleaning::complete_cleaning_task_in_db(&pool, id, notes, Utc::now()).await?;
    Ok(Json(task))
}

pub async fn verify_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CleaningTask>, AppError> {
    user.require(user.role().manages_housekeeping())?;
    let task = cleaning::verify_cleaning_task_in_db(&pool, id, user.id(), Utc::now()).await?;
    info!("Cleaning task {} verified by {}.", id, user.employee.username);
    Ok(Json(task))
}

pub async fn delete_cleaning_task(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_housekeeping())?;
    if cleaning::delete_cleaning_task_in_db(&pool, id).await? {
        Ok(message(format!("Cleaning task {} deleted.", id)))
    } else {
        Err(AppError::not_found(&format!("Cleaning task with ID {} not found.", id)))
    }
}

/// Open tasks assigned to the caller, most urgent first.
pub async fn my_cleaning_tasks(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<Json<Vec<CleaningTask>>, AppError> {
    Ok(Json(cleaning::my_cleaning_tasks_from_db(&pool, user.id()).await?))
}

/// Active and available employees a cleaning task can go to.
pub async fn cleaning_staff(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<Json<Vec<Employee>>, AppError> {
    user.require(user.role().manages_housekeeping())?;
    Ok(Json(employees::list_available_staff_from_db(&pool, &CLEANING_STAFF).await?))
}
