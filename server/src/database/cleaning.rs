// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hotel_common::attendance::month_bounds;
use hotel_common::{
    AssignedWork, CleaningQuery, CleaningStats, CleaningStatus, CleaningTask, CleaningType,
    CreateCleaningTaskPayload, DomainError, RoomStatus, UpdateCleaningTaskPayload,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use super::employees::get_employee_from_db;
use super::rooms::{require_room, set_room_state_in_db};

/// Fields of a cleaning task about to be created.
#[derive(Debug, Clone)]
pub struct NewCleaningTask {
    pub room_id: i64,
    pub assigned_to: Option<i64>,
    pub cleaning_type: CleaningType,
    pub priority: i64,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: String,
}

pub async fn get_cleaning_task_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<CleaningTask>> {
    sqlx::query_as::<_, CleaningTask>("SELECT * FROM cleaning_tasks WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve cleaning task with ID: {}", id))
}

async fn require_cleaning_task(conn: &mut SqliteConnection, id: i64) -> Result<CleaningTask> {
    get_cleaning_task_from_db(&mut *conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found("Cleaning task", id).into())
}

/// Inserts a pending task. Used by the API, check-outs and the rollover.
pub async fn insert_cleaning_task(
    conn: &mut SqliteConnection,
    task: NewCleaningTask,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    debug!(
        "Insert values: room={}, type={:?}, priority={}",
        task.room_id, task.cleaning_type, task.priority
    );
    let id = sqlx::query(
        "INSERT INTO cleaning_tasks (room_id, assigned_to, cleaning_type, status, priority, scheduled_for, notes, created_at, updated_at) VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?)",
    )
    .bind(task.room_id)
    .bind(task.assigned_to)
    .bind(task.cleaning_type)
    .bind(task.priority)
    .bind(task.scheduled_for)
    .bind(&task.notes)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await
    .context("Failed to insert cleaning task into DB")?
    .last_insert_rowid();

    Ok(CleaningTask {
        id,
        room_id: task.room_id,
        assigned_to: task.assigned_to,
        cleaning_type: task.cleaning_type,
        status: CleaningStatus::Pending,
        priority: task.priority,
        scheduled_for: task.scheduled_for,
        notes: task.notes,
        photo_path: None,
        started_at: None,
        completed_at: None,
        verified_by: None,
        verified_at: None,
        created_at: now,
        updated_at: now,
    })
}

pub async fn has_open_cleaning_task(conn: &mut SqliteConnection, room_id: i64) -> Result<bool> {
    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cleaning_tasks WHERE room_id = ? AND status IN ('pending', 'in_progress')",
    )
    .bind(room_id)
    .fetch_one(&mut *conn)
    .await
    .context("Failed to look up open cleaning tasks")?;
    Ok(open > 0)
}

/// Only active, available housekeeping staff can receive cleaning tasks.
async fn ensure_cleaner(conn: &mut SqliteConnection, employee_id: i64) -> Result<()> {
    let employee = get_employee_from_db(&mut *conn, employee_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Employee", employee_id))?;
    if !employee.is_active || !employee.is_available || !employee.role.is_housekeeping_staff() {
        return Err(DomainError::validation(format!(
            "{} cannot be assigned cleaning tasks.",
            employee.full_name()
        ))
        .into());
    }
    Ok(())
}

async fn save_cleaning_task(conn: &mut SqliteConnection, task: &CleaningTask) -> Result<()> {
    sqlx::query(
        "UPDATE cleaning_tasks SET assigned_to = ?, cleaning_type = ?, status = ?, priority = ?, scheduled_for = ?, notes = ?, photo_path = ?, started_at = ?, completed_at = ?, verified_by = ?, verified_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(task.assigned_to)
    .bind(task.cleaning_type)
    .bind(task.status)
    .bind(task.priority)
    .bind(task.scheduled_for)
    .bind(&task.notes)
    .bind(&task.photo_path)
    .bind(task.started_at)
    .bind(task.completed_at)
    .bind(task.verified_by)
    .bind(task.verified_at)
    .bind(task.updated_at)
    .bind(task.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update cleaning task with ID: {}", task.id))?;
    Ok(())
}

/// Creates a task from the API. A clean or inspected room becomes dirty.
pub async fn create_cleaning_task_in_db(
    pool: &SqlitePool,
    payload: CreateCleaningTaskPayload,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let room = require_room(&mut tx, payload.room_id).await?;
    if let Some(employee_id) = payload.assigned_to {
        ensure_cleaner(&mut tx, employee_id).await?;
    }

    let task = insert_cleaning_task(
        &mut tx,
        NewCleaningTask {
            room_id: room.id,
            assigned_to: payload.assigned_to,
            cleaning_type: payload.cleaning_type.unwrap_or(CleaningType::Checkout),
            priority: payload.priority.unwrap_or(3),
            scheduled_for: payload.scheduled_for,
            notes: payload.notes.unwrap_or_default(),
        },
        now,
    )
    .await?;

    if matches!(room.status, RoomStatus::Clean | RoomStatus::Inspected) {
        set_room_state_in_db(&mut tx, room.id, Some(RoomStatus::Dirty), None, now).await?;
    }

    tx.commit().await.context("Failed to commit cleaning task")?;
    info!("Cleaning task {} created for room {}.", task.id, room.number);
    Ok(task)
}

pub async fn update_cleaning_task_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateCleaningTaskPayload,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut task = require_cleaning_task(&mut conn, id).await?;
    if task.status == CleaningStatus::Verified {
        return Err(DomainError::transition("cleaning task", task.status, "edit").into());
    }
    if let Some(cleaning_type) = payload.cleaning_type {
        task.cleaning_type = cleaning_type;
    }
    if let Some(priority) = payload.priority {
        task.priority = priority;
    }
    if payload.scheduled_for.is_some() {
        task.scheduled_for = payload.scheduled_for;
    }
    if let Some(notes) = payload.notes {
        task.notes = notes;
    }
    task.updated_at = now;
    save_cleaning_task(&mut conn, &task).await?;
    Ok(task)
}

pub async fn assign_cleaning_task_in_db(
    pool: &SqlitePool,
    id: i64,
    employee_id: i64,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_cleaning_task(&mut tx, id).await?;
    if !task.is_open() {
        return Err(DomainError::transition("cleaning task", task.status, "assign").into());
    }
    ensure_cleaner(&mut tx, employee_id).await?;

    task.assigned_to = Some(employee_id);
    task.updated_at = now;
    save_cleaning_task(&mut tx, &task).await?;
    tx.commit().await.context("Failed to commit assignment")?;
    info!("Cleaning task {} assigned to employee {}.", id, employee_id);
    Ok(task)
}

pub async fn start_cleaning_task_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<CleaningTask> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut task = require_cleaning_task(&mut conn, id).await?;
    task.status = task.status.start()?;
    task.started_at = Some(now);
    task.updated_at = now;
    save_cleaning_task(&mut conn, &task).await?;
    Ok(task)
}

/// Completes the task and marks its room clean.
pub async fn complete_cleaning_task_in_db(
    pool: &SqlitePool,
    id: i64,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_cleaning_task(&mut tx, id).await?;
    task.status = task.status.complete()?;
    task.completed_at = Some(now);
    if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
        task.notes = notes;
    }
    task.updated_at = now;
    save_cleaning_task(&mut tx, &task).await?;

    let room = require_room(&mut tx, task.room_id).await?;
    if !room.status.is_out_of_service() {
        set_room_state_in_db(&mut tx, task.room_id, Some(RoomStatus::Clean), None, now).await?;
    }

    tx.commit().await.context("Failed to commit cleaning completion")?;
    info!("Cleaning task {} completed, room {} is clean.", id, room.number);
    Ok(task)
}

/// Inspection by a manager. The room becomes inspected.
pub async fn verify_cleaning_task_in_db(
    pool: &SqlitePool,
    id: i64,
    verifier_id: i64,
    now: DateTime<Utc>,
) -> Result<CleaningTask> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut task = require_cleaning_task(&mut tx, id).await?;
    task.status = task.status.verify()?;
    task.verified_by = Some(verifier_id);
    task.verified_at = Some(now);
    task.updated_at = now;
    save_cleaning_task(&mut tx, &task).await?;

    let room = require_room(&mut tx, task.room_id).await?;
    if room.status == RoomStatus::Clean {
        set_room_state_in_db(&mut tx, task.room_id, Some(RoomStatus::Inspected), None, now).await?;
    }

    tx.commit().await.context("Failed to commit cleaning verification")?;
    Ok(task)
}

/// Verified tasks are kept as history.
pub async fn delete_cleaning_task_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let Some(task) = get_cleaning_task_from_db(&mut *conn, id).await? else {
        return Ok(false);
    };
    if task.status == CleaningStatus::Verified {
        return Err(DomainError::transition("cleaning task", task.status, "delete").into());
    }
    let result = sqlx::query("DELETE FROM cleaning_tasks WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to delete cleaning task with ID: {}", id))?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_cleaning_photo_in_db(pool: &SqlitePool, id: i64, path: &str) -> Result<()> {
    sqlx::query("UPDATE cleaning_tasks SET photo_path = ?, updated_at = ? WHERE id = ?")
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to attach photo to cleaning task {}", id))?;
    Ok(())
}

fn push_cleaning_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &CleaningQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(cleaning_type) = query.cleaning_type {
        builder.push(" AND cleaning_type = ").push_bind(cleaning_type);
    }
    if let Some(assigned_to) = query.assigned_to {
        builder.push(" AND assigned_to = ").push_bind(assigned_to);
    }
    if let Some(date) = query.date {
        builder.push(" AND date(created_at) = ").push_bind(date);
    }
}

/// Highest priority first, then oldest.
pub async fn list_cleaning_tasks_from_db(pool: &SqlitePool, query: &CleaningQuery) -> Result<(Vec<CleaningTask>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM cleaning_tasks");
    push_cleaning_filters(&mut count, query);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count cleaning tasks")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM cleaning_tasks");
    push_cleaning_filters(&mut select, query);
    select
        .push(" ORDER BY priority ASC, created_at ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let tasks = select
        .build_query_as::<CleaningTask>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve cleaning tasks")?;
    Ok((tasks, total))
}

pub async fn cleaning_stats_from_db(pool: &SqlitePool, today: NaiveDate) -> Result<CleaningStats> {
    let (pending, in_progress, completed_today): (i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status IN ('completed', 'verified') AND date(completed_at) = ? THEN 1 ELSE 0 END), 0) FROM cleaning_tasks",
    )
    .bind(today)
    .fetch_one(pool)
    .await
    .context("Failed to compute cleaning stats")?;

    Ok(CleaningStats {
        pending,
        in_progress,
        completed_today,
    })
}

/// Open tasks, most urgent first.
pub async fn open_cleaning_tasks_from_db(pool: &SqlitePool, limit: i64) -> Result<Vec<CleaningTask>> {
    sqlx::query_as::<_, CleaningTask>(
        "SELECT * FROM cleaning_tasks WHERE status IN ('pending', 'in_progress') ORDER BY priority ASC, created_at ASC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve open cleaning tasks")
}

pub async fn my_cleaning_tasks_from_db(pool: &SqlitePool, employee_id: i64) -> Result<Vec<CleaningTask>> {
    sqlx::query_as::<_, CleaningTask>(
        "SELECT * FROM cleaning_tasks WHERE assigned_to = ? AND status IN ('pending', 'in_progress') ORDER BY priority ASC, created_at ASC",
    )
    .bind(employee_id)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve assigned cleaning tasks")
}

pub async fn unassigned_cleaning_count_in_db(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM cleaning_tasks WHERE assigned_to IS NULL AND status IN ('pending', 'in_progress')",
    )
    .fetch_one(pool)
    .await
    .context("Failed to count unassigned cleaning tasks")
}

/// Cleaning work of one employee this month.
pub async fn cleaning_work_from_db(pool: &SqlitePool, employee_id: i64, today: NaiveDate) -> Result<AssignedWork> {
    let (first, next) = month_bounds(today.year(), today.month())?;
    let (total_month, completed_month, pending, in_progress): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COALESCE(SUM(CASE WHEN date(created_at) >= ?1 AND date(created_at) < ?2 THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status IN ('completed', 'verified') AND date(completed_at) >= ?1 AND date(completed_at) < ?2 THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) FROM cleaning_tasks WHERE assigned_to = ?3",
    )
    .bind(first)
    .bind(next)
    .bind(employee_id)
    .fetch_one(pool)
    .await
    .context("Failed to compute cleaning work")?;

    Ok(AssignedWork {
        total_month,
        completed_month,
        pending,
        in_progress,
    })
}
