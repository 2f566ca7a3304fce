// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use hotel_common::attendance::month_bounds;
use hotel_common::{
    DomainError, EmployeeRole, Leave, LeaveCounts, LeaveDecisionPayload, LeaveManagementQuery,
    LeaveRequestPayload, LeaveStatus, PageQuery,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use super::employees::push_role_scope;

pub async fn get_leave_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Leave>> {
    sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve leave with ID: {}", id))
}

async fn require_leave(conn: &mut SqliteConnection, id: i64) -> Result<Leave> {
    get_leave_from_db(&mut *conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found("Leave", id).into())
}

/// Refuses a period overlapping another pending or approved leave of the same employee.
async fn ensure_no_overlap(
    conn: &mut SqliteConnection,
    employee_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<()> {
    let clash: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM leaves WHERE employee_id = ? AND status IN ('pending', 'approved') AND start_date <= ? AND end_date >= ? AND id != ? LIMIT 1",
    )
    .bind(employee_id)
    .bind(end)
    .bind(start)
    .bind(exclude_id.unwrap_or(0))
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to check overlapping leaves")?;

    match clash {
        Some(other) => Err(DomainError::conflict(format!(
            "These dates overlap with your leave request #{}.",
            other
        ))
        .into()),
        None => Ok(()),
    }
}

pub async fn create_leave_in_db(
    pool: &SqlitePool,
    employee_id: i64,
    payload: LeaveRequestPayload,
    now: DateTime<Utc>,
) -> Result<Leave> {
    payload.check_dates(now.date_naive())?;

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    ensure_no_overlap(&mut tx, employee_id, payload.start_date, payload.end_date, None).await?;

    debug!(
        "Insert values: employee={}, type={:?}, {} -> {}",
        employee_id, payload.leave_type, payload.start_date, payload.end_date
    );
    let id = sqlx::query(
        "INSERT INTO leaves (employee_id, leave_type, start_date, end_date, reason, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)",
    )
    .bind(employee_id)
    .bind(payload.leave_type)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.trim())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert leave into DB")?
    .last_insert_rowid();

    let leave = require_leave(&mut tx, id).await?;
    tx.commit().await.context("Failed to commit leave request")?;
    info!("Leave {} requested by employee {}.", id, employee_id);
    Ok(leave)
}

async fn save_leave(conn: &mut SqliteConnection, leave: &Leave) -> Result<()> {
    sqlx::query(
        "UPDATE leaves SET leave_type = ?, start_date = ?, end_date = ?, reason = ?, status = ?, approved_by = ?, approved_at = ?, rejection_reason = ?, attachment_path = ?, updated_at = ? WHERE id = ?",
    )
    .bind(leave.leave_type)
    .bind(leave.start_date)
    .bind(leave.end_date)
    .bind(&leave.reason)
    .bind(leave.status)
    .bind(leave.approved_by)
    .bind(leave.approved_at)
    .bind(&leave.rejection_reason)
    .bind(&leave.attachment_path)
    .bind(leave.updated_at)
    .bind(leave.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update leave with ID: {}", leave.id))?;
    Ok(())
}

/// Replaces the period, type and reason of a pending leave.
pub async fn update_leave_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: LeaveRequestPayload,
    now: DateTime<Utc>,
) -> Result<Leave> {
    payload.check_dates(now.date_naive())?;

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut leave = require_leave(&mut tx, id).await?;
    leave.ensure_editable()?;
    ensure_no_overlap(&mut tx, leave.employee_id, payload.start_date, payload.end_date, Some(id)).await?;

    leave.leave_type = payload.leave_type;
    leave.start_date = payload.start_date;
    leave.end_date = payload.end_date;
    leave.reason = payload.reason.trim().to_string();
    leave.updated_at = now;
    save_leave(&mut tx, &leave).await?;

    tx.commit().await.context("Failed to commit leave update")?;
    Ok(leave)
}

pub async fn cancel_leave_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<Leave> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut leave = require_leave(&mut conn, id).await?;
    leave.status = leave.cancel()?;
    leave.updated_at = now;
    save_leave(&mut conn, &leave).await?;
    info!("Leave {} cancelled.", id);
    Ok(leave)
}

/// Records an approval or rejection by `approver_id`.
pub async fn decide_leave_in_db(
    pool: &SqlitePool,
    id: i64,
    decision: LeaveDecisionPayload,
    approver_id: i64,
    now: DateTime<Utc>,
) -> Result<Leave> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut leave = require_leave(&mut conn, id).await?;
    leave.status = leave.decide(decision.status)?;
    leave.approved_by = Some(approver_id);
    leave.approved_at = Some(now);
    if leave.status == LeaveStatus::Rejected {
        leave.rejection_reason = decision.rejection_reason.unwrap_or_default();
    }
    leave.updated_at = now;
    save_leave(&mut conn, &leave).await?;
    info!("Leave {} {} by employee {}.", id, leave.status, approver_id);
    Ok(leave)
}

pub async fn set_leave_attachment_in_db(pool: &SqlitePool, id: i64, path: &str) -> Result<()> {
    sqlx::query("UPDATE leaves SET attachment_path = ?, updated_at = ? WHERE id = ?")
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to attach file to leave {}", id))?;
    Ok(())
}

/// One page of the employee's own leaves, newest first.
pub async fn employee_leaves_from_db(
    pool: &SqlitePool,
    employee_id: i64,
    page: &PageQuery,
) -> Result<(Vec<Leave>, i64)> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leaves WHERE employee_id = ?")
        .bind(employee_id)
        .fetch_one(pool)
        .await
        .context("Failed to count leaves")?;
    let leaves = sqlx::query_as::<_, Leave>(
        "SELECT * FROM leaves WHERE employee_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(employee_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await
    .context("Failed to retrieve leaves")?;
    Ok((leaves, total))
}

/// The employee's leaves touching `year`, for allowance computations.
pub async fn employee_leaves_in_year_from_db(pool: &SqlitePool, employee_id: i64, year: i32) -> Result<Vec<Leave>> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1).context("Invalid year")?;
    let last = NaiveDate::from_ymd_opt(year, 12, 31).context("Invalid year")?;
    sqlx::query_as::<_, Leave>(
        "SELECT * FROM leaves WHERE employee_id = ? AND start_date <= ? AND end_date >= ?",
    )
    .bind(employee_id)
    .bind(last)
    .bind(first)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve the year's leaves")
}

fn push_management_filters(builder: &mut QueryBuilder<'_, Sqlite>, roles: &[EmployeeRole], query: &LeaveManagementQuery) {
    builder.push(" WHERE 1 = 1");
    push_role_scope(builder, "e.role", roles);
    if let Some(status) = query.status {
        builder.push(" AND l.status = ").push_bind(status);
    }
    if let Some(leave_type) = query.leave_type {
        builder.push(" AND l.leave_type = ").push_bind(leave_type);
    }
    if let Some(name) = query.employee.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", name);
        builder
            .push(" AND (e.first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR e.last_name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Leaves of employees whose role is in `roles`, pending first then newest.
pub async fn management_leaves_from_db(
    pool: &SqlitePool,
    roles: &[EmployeeRole],
    query: &LeaveManagementQuery,
) -> Result<(Vec<Leave>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM leaves l JOIN employees e ON e.id = l.employee_id");
    push_management_filters(&mut count, roles, query);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count leaves")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT l.* FROM leaves l JOIN employees e ON e.id = l.employee_id");
    push_management_filters(&mut select, roles, query);
    select
        .push(" ORDER BY CASE l.status WHEN 'pending' THEN 0 ELSE 1 END, l.created_at DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let leaves = select
        .build_query_as::<Leave>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve leaves for management")?;

    Ok((leaves, total))
}

/// Status counts in scope, plus the number of leaves starting this month.
pub async fn leave_counts_from_db(pool: &SqlitePool, roles: &[EmployeeRole], today: NaiveDate) -> Result<LeaveCounts> {
    let (first, next) = month_bounds(today.year(), today.month())?;
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COALESCE(SUM(CASE WHEN l.status = 'pending' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN l.status = 'approved' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN l.status = 'rejected' THEN 1 ELSE 0 END), 0), COALESCE(SUM(CASE WHEN l.start_date >= ",
    );
    builder
        .push_bind(first)
        .push(" AND l.start_date < ")
        .push_bind(next)
        .push(" THEN 1 ELSE 0 END), 0) FROM leaves l JOIN employees e ON e.id = l.employee_id WHERE 1 = 1");
    push_role_scope(&mut builder, "e.role", roles);

    let (pending, approved, rejected, month_total) = builder
        .build_query_as::<(i64, i64, i64, i64)>()
        .fetch_one(pool)
        .await
        .context("Failed to count leaves by status")?;

    Ok(LeaveCounts {
        pending,
        approved,
        rejected,
        month_total,
    })
}

pub async fn pending_leaves_of_employee_in_db(pool: &SqlitePool, employee_id: i64) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM leaves WHERE employee_id = ? AND status = 'pending'")
        .bind(employee_id)
        .fetch_one(pool)
        .await
        .context("Failed to count pending leaves")
}
