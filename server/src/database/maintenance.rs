// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hotel_common::attendance::month_bounds;
use hotel_common::{
    AssignedWork, CreateMaintenancePayload, DomainError, MaintenancePriority, MaintenanceQuery,
    MaintenanceStats, MaintenanceStatus, MaintenanceTask, RoomStatus, UpdateMaintenancePayload,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use super::employees::get_employee_from_db;
use super::rooms::{require_room, set_room_state_in_db};

/// Urgent first.
const PRIORITY_ORDER: &str =
    "CASE priority WHEN 'urgent' THEN 4 WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END DESC";

pub async fn get_maintenance_task_from_db<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<MaintenanceTask>> {
    sqlx::query_as::<_, MaintenanceTask>("SELECT * FROM maintenance_tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve maintenance request with ID: {}", id))
}

async fn require_maintenance_task(conn: &mut SqliteConnection, id: i64) -> Result<MaintenanceTask> {
    get_maintenance_task_from_db(&mut *conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found("Maintenance request", id).into())
}

async fn save_maintenance_task(conn: &mut SqliteConnection, task: &MaintenanceTask) -> Result<()> {
    sqlx::query(
        "UPDATE maintenance_tasks SET assigned_to = ?, title = ?, description = ?, priority = ?, status = ?, resolution = ?, photo_path = ?, assigned_at = ?, resolved_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(task.assigned_to)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(&task.resolution)
    .bind(&task.photo_path)
    .bind(task.assigned_at)
    .bind(task.resolved_at)
    .bind(task.updated_at)
    .bind(task.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update maintenance request with ID: {}", task.id))?;
    Ok(())
}

/// Any employee may report an issue. The room can be taken out of service
/// until the request is completed.
pub async fn report_maintenance_in_db(
    pool: &SqlitePool,
    payload: CreateMaintenancePayload,
    reported_by: i64,
    now: DateTime<Utc>,
) -> Result<MaintenanceTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let room = require_room(&mut tx, payload.room_id).await?;
    let priority = payload.priority.unwrap_or(MaintenancePriority::Medium);
    debug!("Insert values: room={}, priority={:?}, title={}", room.number, priority, payload.title);

    let id = sqlx::query(
        "INSERT INTO maintenance_tasks (room_id, reported_by, title, description, priority, status, resolution, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'pending', '', ?, ?)",
    )
    .bind(room.id)
    .bind(reported_by)
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(priority)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert maintenance request into DB")?
    .last_insert_rowid();

    if payload.take_room_out_of_service && room.status != RoomStatus::OutOfOrder {
        set_room_state_in_db(&mut tx, room.id, Some(RoomStatus::Maintenance), None, now).await?;
    }

    let task = require_maintenance_task(&mut tx, id).await?;
    tx.commit().await.context("Failed to commit maintenance request")?;
    if priority == MaintenancePriority::Urgent {
        warn!("Urgent maintenance reported in room {}: {}", room.number, task.title);
    } else {
        info!("Maintenance request {} reported for room {}.", id, room.number);
    }
    Ok(task)
}

pub async fn update_maintenance_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateMaintenancePayload,
    now: DateTime<Utc>,
) -> Result<MaintenanceTask> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut task = require_maintenance_task(&mut conn, id).await?;
    if !task.status.is_open() {
        return Err(DomainError::transition("maintenance request", task.status, "edit").into());
    }
    if let Some(title) = payload.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(priority) = payload.priority {
        task.priority = priority;
    }
    task.updated_at = now;
    save_maintenance_task(&mut conn, &task).await?;
    Ok(task)
}

/// Only active, available maintenance staff can take requests.
pub async fn assign_maintenance_in_db(
    pool: &SqlitePool,
    id: i64,
    employee_id: i64,
    now: DateTime<Utc>,
) -> Result<MaintenanceTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_maintenance_task(&mut tx, id).await?;
    task.status = task.status.assign()?;

    let employee = get_employee_from_db(&mut *tx, employee_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Employee", employee_id))?;
    if !employee.is_active || !employee.is_available || !employee.role.is_maintenance_staff() {
        return Err(DomainError::validation(format!(
            "{} cannot be assigned maintenance requests.",
            employee.full_name()
        ))
        .into());
    }

    task.assigned_to = Some(employee_id);
    task.assigned_at = Some(now);
    task.updated_at = now;
    save_maintenance_task(&mut tx, &task).await?;
    tx.commit().await.context("Failed to commit assignment")?;
    info!("Maintenance request {} assigned to {}.", id, employee.full_name());
    Ok(task)
}

pub async fn start_maintenance_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<MaintenanceTask> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut task = require_maintenance_task(&mut conn, id).await?;
    task.status = task.status.start()?;
    task.updated_at = now;
    save_maintenance_task(&mut conn, &task).await?;
    Ok(task)
}

/// Records the resolution. A room held in maintenance goes back to dirty
/// so housekeeping prepares it before the next guest.
pub async fn complete_maintenance_in_db(
    pool: &SqlitePool,
    id: i64,
    resolution: String,
    now: DateTime<Utc>,
) -> Result<MaintenanceTask> {
    if resolution.trim().is_empty() {
        return Err(DomainError::validation("Describe how the issue was resolved.").into());
    }
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_maintenance_task(&mut tx, id).await?;
    task.status = task.status.complete()?;
    task.resolution = resolution.trim().to_string();
    task.resolved_at = Some(now);
    task.updated_at = now;
    save_maintenance_task(&mut tx, &task).await?;
    release_room_if_done(&mut tx, task.room_id, now).await?;
    tx.commit().await.context("Failed to commit maintenance completion")?;
    info!("Maintenance request {} completed.", id);
    Ok(task)
}

pub async fn cancel_maintenance_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<MaintenanceTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_maintenance_task(&mut tx, id).await?;
    task.status = task.status.cancel()?;
    task.updated_at = now;
    save_maintenance_task(&mut tx, &task).await?;
    release_room_if_done(&mut tx, task.room_id, now).await?;
    tx.commit().await.context("Failed to commit maintenance cancellation")?;
    Ok(task)
}

/// Puts a room held in maintenance back to dirty once no open request remains.
async fn release_room_if_done(conn: &mut SqliteConnection, room_id: i64, now: DateTime<Utc>) -> Result<()> {
    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM maintenance_tasks WHERE room_id = ? AND status IN ('pending', 'assigned', 'in_progress')",
    )
    .bind(room_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to count open maintenance requests")?;
    if open > 0 {
        return Ok(());
    }
    let room = require_room(conn, room_id).await?;
    if room.status == RoomStatus::Maintenance {
        set_room_state_in_db(conn, room_id, Some(RoomStatus::Dirty), None, now).await?;
    }
    Ok(())
}

pub async fn delete_maintenance_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let Some(task) = get_maintenance_task_from_db(&mut *tx, id).await? else {
        return Ok(false);
    };
    sqlx::query("DELETE FROM maintenance_tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to delete maintenance request with ID: {}", id))?;
    if task.status.is_open() {
        release_room_if_done(&mut tx, task.room_id, Utc::now()).await?;
    }
    tx.commit().await.context("Failed to commit maintenance deletion")?;
    Ok(true)
}

pub async fn set_maintenance_photo_in_db(pool: &SqlitePool, id: i64, path: &str) -> Result<()> {
    sqlx::query("UPDATE maintenance_tasks SET photo_path = ?, updated_at = ? WHERE id = ?")
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to attach photo to maintenance request {}", id))?;
    Ok(())
}

fn push_maintenance_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &MaintenanceQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = query.priority {
        builder.push(" AND priority = ").push_bind(priority);
    }
    if let Some(assigned_to) = query.assigned_to {
        builder.push(" AND assigned_to = ").push_bind(assigned_to);
    }
}

/// Most urgent first, then newest.
pub async fn list_maintenance_from_db(
    pool: &SqlitePool,
    query: &MaintenanceQuery,
) -> Result<(Vec<MaintenanceTask>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM maintenance_tasks");
    push_maintenance_filters(&mut count, query);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count maintenance requests")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM maintenance_tasks");
    push_maintenance_filters(&mut select, query);
    select
        .push(" ORDER BY ")
        .push(PRIORITY_ORDER)
        .push(", created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let tasks = select
        .build_query_as::<MaintenanceTask>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve maintenance requests")?;
    Ok((tasks, total))
}

/// Open requests assigned to the employee.
pub async fn my_maintenance_from_db(pool: &SqlitePool, employee_id: i64) -> Result<Vec<MaintenanceTask>> {
    sqlx::query_as::<_, MaintenanceTask>(&format!(
        "SELECT * FROM maintenance_tasks WHERE assigned_to = ? AND status IN ('assigned', 'in_progress') ORDER BY {}, created_at ASC",
        PRIORITY_ORDER
    ))
    .bind(employee_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve assigned maintenance requests")
}

pub async fn open_maintenance_for_room_from_db(pool: &SqlitePool, room_id: i64) -> Result<Vec<MaintenanceTask>> {
    sqlx::query_as::<_, MaintenanceTask>(&format!(
        "SELECT * FROM maintenance_tasks WHERE room_id = ? AND status IN ('pending', 'assigned', 'in_progress') ORDER BY {}, created_at DESC",
        PRIORITY_ORDER
    ))
    .bind(room_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve the room's maintenance requests")
}

pub async fn open_maintenance_from_db(pool: &SqlitePool, limit: i64) -> Result<Vec<MaintenanceTask>> {
    sqlx::query_as::<_, MaintenanceTask>(&format!(
        "SELECT * FROM maintenance_tasks WHERE status IN ('pending', 'assigned', 'in_progress') ORDER BY {}, created_at DESC LIMIT ?",
        PRIORITY_ORDER
    ))
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve open maintenance requests")
}

pub async fn urgent_open_maintenance_from_db(pool: &SqlitePool) -> Result<Vec<MaintenanceTask>> {
    sqlx::query_as::<_, MaintenanceTask>(
        "SELECT * FROM maintenance_tasks WHERE priority = 'urgent' AND status IN ('pending', 'assigned', 'in_progress') ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve urgent maintenance requests")
}

/// `urgent` counts open urgent requests.
pub async fn maintenance_stats_from_db(pool: &SqlitePool) -> Result<MaintenanceStats> {
    let (pending, in_progress, urgent): (i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN priority = 'urgent' AND status IN ('pending', 'assigned', 'in_progress') THEN 1 ELSE 0 END), 0) FROM maintenance_tasks",
    )
    .fetch_one(pool)
    .await
    .context("Failed to compute maintenance stats")?;
    Ok(MaintenanceStats {
        pending,
        in_progress,
        urgent,
    })
}

pub async fn unassigned_maintenance_count_in_db(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_tasks WHERE assigned_to IS NULL AND status = 'pending'")
        .fetch_one(pool)
        .await
        .context("Failed to count unassigned maintenance requests")
}

pub async fn open_maintenance_count_in_db(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM maintenance_tasks WHERE status IN ('pending', 'assigned', 'in_progress')",
    )
    .fetch_one(pool)
    .await
    .context("Failed to count open maintenance requests")
}

/// Maintenance work of one employee this month.
pub async fn maintenance_work_from_db(pool: &SqlitePool, employee_id: i64, today: NaiveDate) -> Result<AssignedWork> {
    let (first, next) = month_bounds(today.year(), today.month())?;
    let (total_month, completed_month, pending, in_progress): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(CASE WHEN date(created_at) >= ?1 AND date(created_at) < ?2 THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'completed' AND date(resolved_at) >= ?1 AND date(resolved_at) < ?2 THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'assigned' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) FROM maintenance_tasks WHERE assigned_to = ?3",
    )
    .bind(first)
    .bind(next)
    .bind(employee_id)
    .fetch_one(pool)
    .await
    .context("Failed to compute maintenance work")?;

    Ok(AssignedWork {
        total_month,
        completed_month,
        pending,
        in_progress,
    })
}
