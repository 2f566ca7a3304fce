// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use hotel_common::{
    AssignPayload, CreateMaintenancePayload, Employee, EmployeeRole, MaintenanceList, MaintenanceQuery,
    MaintenanceTask, Page, ResolvePayload, UpdateMaintenancePayload,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use super::{message, AppError};
use crate::auth::CurrentUser;
use crate::database::{employees, maintenance};

const MAINTENANCE_STAFF: [EmployeeRole; 2] = [EmployeeRole::MaintenanceTechnician, EmployeeRole::MaintenanceManager];

async fn load_request(pool: &SqlitePool, id: i64) -> Result<MaintenanceTask, AppError> {
    maintenance::get_maintenance_task_from_db(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Maintenance request with ID {} not found.", id)))
}

fn ensure_worker(user: &CurrentUser, task: &MaintenanceTask) -> Result<(), AppError> {
    user.require(task.assigned_to == Some(user.id()) || user.role().manages_maintenance())
}

/// Handler for reporting an issue. Open to every employee.
pub async fn report_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<CreateMaintenancePayload>,
) -> Result<(StatusCode, Json<MaintenanceTask>), AppError> {
    payload.validate()?;
    debug!("{} reports \"{}\" in room {}", user.employee.username, payload.title, payload.room_id);
    let task = maintenance::report_maintenance_in_db(&pool, payload, user.id(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Query(query): Query<MaintenanceQuery>,
) -> Result<Json<MaintenanceList>, AppError> {
    user.require(user.role().is_maintenance_staff() || user.role().manages_maintenance())?;
    let (items, total) = maintenance::list_maintenance_from_db(&pool, &query).await?;
    Ok(Json(MaintenanceList {
        requests: Page::new(items, &query.page_query(), total),
        stats: maintenance::maintenance_stats_from_db(&pool).await?,
    }))
}

/// Visible to maintenance staff and to whoever reported it.
pub async fn get_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceTask>, AppError> {
    let task = load_request(&pool, id).await?;
    user.require(
        task.reported_by == Some(user.id()) || user.role().is_maintenance_staff() || user.role().manages_maintenance(),
    )?;
    Ok(Json(task))
}

pub async fn update_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMaintenancePayload>,
) -> Result<Json<MaintenanceTask>, AppError> {
    user.require(user.role().manages_maintenance())?;
    payload.validate()?;
    Ok(Json(maintenance::update_maintenance_in_db(&pool, id, payload, Utc::now()).await?))
}

pub async fn assign_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AssignPayload>,
) -> Result<Json<MaintenanceTask>, AppError> {
    user.require(user.role().manages_maintenance())?;
    let task = maintenance::assign_maintenance_in_db(&pool, id, payload.employee_id, Utc::now()).await?;
    Ok(Json(task))
}

pub async fn start_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceTask>, AppError> {
    let task = load_request(&pool, id).await?;
    ensure_worker(&user, &task)?;
    Ok(Json(maintenance::start_maintenance_in_db(&pool, id, Utc::now()).await?))
}

/// Handler for closing a request with its resolution.
pub async fn complete_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ResolvePayload>,
) -> Result<Json<MaintenanceTask>, AppError> {
    let task = load_request(&pool, id).await?;
    ensure_worker(&user, &task)?;
    payload.validate()?;
    let task = maintenance::complete_maintenance_in_db(&pool, id, payload.resolution, Utc::now()).await?;
    info!("Maintenance request {} resolved by {}.", id, user.employee.username);
    Ok(Json(task))
}

pub async fn cancel_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MaintenanceTask>, AppError> {
    user.require(user.role().manages_maintenance())?;
    Ok(Json(maintenance::cancel_maintenance_in_db(&pool, id, Utc::now()).await?))
}

pub async fn delete_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_maintenance())?;
    if maintenance::delete_maintenance_in_db(&pool, id).await? {
        Ok(message(format!("Maintenance request {} deleted.", id)))
    } else {
        Err(AppError::not_found(&format!("Maintenance request with ID {} not found.", id)))
    }
}

pub async fn my_maintenance(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<Json<Vec<MaintenanceTask>>, AppError> {
    Ok(Json(maintenance::my_maintenance_from_db(&pool, user.id()).await?))
}

pub async fn maintenance_staff(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
) -> Result<Json<Vec<Employee>>, AppError> {
    user.require(user.role().manages_maintenance())?;
    Ok(Json(employees::list_available_staff_from_db(&pool, &MAINTENANCE_STAFF).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::rooms::{self, tests::{insert_room, insert_room_type}};
    use crate::handlers::test_support::{state, user};
    use hotel_common::{MaintenancePriority, MaintenanceStatus, RoomStatus};

    fn leak(room_id: i64) -> CreateMaintenancePayload {
        CreateMaintenancePayload {
            room_id,
            title: "Leaking tap".to_string(),
            description: "Bathroom tap drips all night.".to_string(),
            priority: Some(MaintenancePriority::High),
            take_room_out_of_service: true,
        }
    }

    #[tokio::test]
    async fn anyone_reports_technician_resolves() {
        let state = state().await;
        let pool = state.pool.clone();
        let clerk = user(&pool, "clerk", EmployeeRole::Receptionist).await;
        let boss = user(&pool, "mm", EmployeeRole::MaintenanceManager).await;
        let tech = user(&pool, "tech", EmployeeRole::MaintenanceTechnician).await;
        let kind = insert_room_type(&pool, "DBL", 2).await;
        let room = insert_room(&pool, "101", 1, kind.id).await;

        let (status, Json(task)) = report_maintenance(State(pool.clone()), clerk.clone(), Json(leak(room.id)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task.reported_by, Some(clerk.id()));
        assert!(get_maintenance(State(pool.clone()), clerk.clone(), Path(task.id)).await.is_ok());

        let err = list_maintenance(State(pool.clone()), clerk, Query(MaintenanceQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        assign_maintenance(
            State(pool.clone()),
            boss.clone(),
            Path(task.id),
            Json(AssignPayload { employee_id: tech.id() }),
        )
        .await
        .unwrap();
        start_maintenance(State(pool.clone()), tech.clone(), Path(task.id)).await.unwrap();

        let err = complete_maintenance(
            State(pool.clone()),
            tech.clone(),
            Path(task.id),
            Json(ResolvePayload { resolution: String::new() }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);

        let Json(done) = complete_maintenance(
            State(pool.clone()),
            tech,
            Path(task.id),
            Json(ResolvePayload {
                resolution: "Replaced the washer.".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(done.status, MaintenanceStatus::Completed);
        let room = rooms::get_room_from_db(&pool, room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Dirty);

        let Json(list) = list_maintenance(State(pool), boss, Query(MaintenanceQuery::default()))
            .await
            .unwrap();
        assert_eq!(list.requests.total, 1);
    }

    #[tokio::test]
    async fn only_maintenance_managers_assign() {
        let state = state().await;
        let pool = state.pool.clone();
        let hk = user(&pool, "hkm", EmployeeRole::HousekeepingManager).await;
        let tech = user(&pool, "tech", EmployeeRole::MaintenanceTechnician).await;
        let kind = insert_room_type(&pool, "DBL", 2).await;
        let room = insert_room(&pool, "101", 1, kind.id).await;
        let (_, Json(task)) = report_maintenance(State(pool.clone()), hk.clone(), Json(leak(room.id)))
            .await
            .unwrap();
        let err = assign_maintenance(State(pool), hk, Path(task.id), Json(AssignPayload { employee_id: tech.id() }))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);
    }
}
