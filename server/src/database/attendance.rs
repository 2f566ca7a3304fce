// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use hotel_common::attendance::{month_bounds, status_for_check_in};
use hotel_common::{
    percentage, Attendance, AttendanceCorrectionPayload, AttendanceHistoryQuery, AttendanceStatus,
    CheckInPayload, CheckOutPayload, DailyCount, DayAttendanceStats, DomainError, EmployeeRole,
};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use super::employees::{count_active_employees_in_db, push_role_scope};

pub async fn get_attendance_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Attendance>> {
    sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve attendance with ID: {}", id))
}

/// The employee's attendance that started on `date`, if any.
pub async fn attendance_on_day_from_db<'e, E: SqliteExecutor<'e>>(
    executor: E,
    employee_id: i64,
    date: NaiveDate,
) -> Result<Option<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date(check_in) = ? ORDER BY check_in DESC LIMIT 1",
    )
    .bind(employee_id)
    .bind(date)
    .fetch_optional(executor)
    .await
    .context("Failed to retrieve today's attendance")
}

/// The employee's shift that has not been closed yet, whatever day it started.
pub async fn open_attendance_from_db(pool: &SqlitePool, employee_id: i64) -> Result<Option<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND check_out IS NULL ORDER BY check_in DESC LIMIT 1",
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve open attendance")
}

/// Opens today's attendance. One attendance per employee per day.
pub async fn check_in_in_db(
    pool: &SqlitePool,
    employee_id: i64,
    payload: CheckInPayload,
    now: DateTime<Utc>,
    late_after_hour: u32,
) -> Result<Attendance> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    if attendance_on_day_from_db(&mut *tx, employee_id, now.date_naive())
        .await?
        .is_some()
    {
        return Err(DomainError::conflict("You have already checked in today.").into());
    }

    let status = status_for_check_in(now, late_after_hour);
    let notes = payload.notes.unwrap_or_default();
    let location = payload.location.unwrap_or_default();
    debug!("Check-in: employee={}, status={:?}", employee_id, status);

    let id = sqlx::query(
        "INSERT INTO attendance (employee_id, check_in, check_out, status, notes, check_in_location, check_out_location, created_at) VALUES (?, ?, NULL, ?, ?, ?, '', ?)",
    )
    .bind(employee_id)
    .bind(now)
    .bind(status)
    .bind(&notes)
    .bind(&location)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert attendance into DB")?
    .last_insert_rowid();

    tx.commit().await.context("Failed to commit check-in")?;
    info!("Employee {} checked in (attendance {}).", employee_id, id);

    Ok(Attendance {
        id,
        employee_id,
        check_in: now,
        check_out: None,
        status,
        notes,
        check_in_location: location,
        check_out_location: String::new(),
        created_at: now,
    })
}

/// Closes today's open attendance.
pub async fn check_out_in_db(
    pool: &SqlitePool,
    employee_id: i64,
    payload: CheckOutPayload,
    now: DateTime<Utc>,
) -> Result<Attendance> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let mut attendance = match attendance_on_day_from_db(&mut *tx, employee_id, now.date_naive()).await? {
        None => return Err(DomainError::conflict("You have not checked in today.").into()),
        Some(a) if !a.is_open() => {
            return Err(DomainError::conflict("You have already checked out today.").into())
        }
        Some(a) => a,
    };

    attendance.check_out = Some(now);
    attendance.check_out_location = payload.location.unwrap_or_default();

    sqlx::query("UPDATE attendance SET check_out = ?, check_out_location = ? WHERE id = ?")
        .bind(now)
        .bind(&attendance.check_out_location)
        .bind(attendance.id)
        .execute(&mut *tx)
        .await
        .context("Failed to close attendance")?;

    tx.commit().await.context("Failed to commit check-out")?;
    info!("Employee {} checked out (attendance {}).", employee_id, attendance.id);
    Ok(attendance)
}

pub async fn recent_attendance_from_db(pool: &SqlitePool, employee_id: i64, limit: i64) -> Result<Vec<Attendance>> {
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? ORDER BY check_in DESC LIMIT ?",
    )
    .bind(employee_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve recent attendance")
}

fn push_history_filters(builder: &mut QueryBuilder<'_, Sqlite>, employee_id: i64, query: &AttendanceHistoryQuery) {
    builder.push(" WHERE employee_id = ").push_bind(employee_id);
    if let Some(start) = query.start_date {
        builder.push(" AND date(check_in) >= ").push_bind(start);
    }
    if let Some(end) = query.end_date {
        builder.push(" AND date(check_in) <= ").push_bind(end);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
}

/// Own attendance, newest first, filtered and paginated.
pub async fn attendance_history_from_db(
    pool: &SqlitePool,
    employee_id: i64,
    query: &AttendanceHistoryQuery,
) -> Result<(Vec<Attendance>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM attendance");
    push_history_filters(&mut count, employee_id, query);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count attendance history")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM attendance");
    push_history_filters(&mut select, employee_id, query);
    select
        .push(" ORDER BY check_in DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let records = select
        .build_query_as::<Attendance>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve attendance history")?;

    Ok((records, total))
}

/// Every attendance of the employee that started in the given month.
pub async fn month_attendance_from_db(pool: &SqlitePool, employee_id: i64, year: i32, month: u32) -> Result<Vec<Attendance>> {
    let (first, next) = month_bounds(year, month)?;
    sqlx::query_as::<_, Attendance>(
        "SELECT * FROM attendance WHERE employee_id = ? AND date(check_in) >= ? AND date(check_in) < ? ORDER BY check_in ASC",
    )
    .bind(employee_id)
    .bind(first)
    .bind(next)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve monthly attendance")
}

/// Attendance of active employees with one of `roles` on `date`.
pub async fn day_attendance_from_db(pool: &SqlitePool, date: NaiveDate, roles: &[EmployeeRole]) -> Result<Vec<Attendance>> {
    let mut select = QueryBuilder::<Sqlite>::new(
        "SELECT a.* FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE e.is_active = 1 AND date(a.check_in) = ",
    );
    select.push_bind(date);
    push_role_scope(&mut select, "e.role", roles);
    select.push(" ORDER BY a.check_in ASC");
    select
        .build_query_as::<Attendance>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve the day's attendance")
}

async fn count_scoped(pool: &SqlitePool, sql: &str, date: NaiveDate, roles: &[EmployeeRole]) -> Result<i64> {
    let mut count = QueryBuilder::<Sqlite>::new(sql);
    count.push_bind(date);
    push_role_scope(&mut count, "e.role", roles);
    count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count attendance")
}

/// Employees (within `roles`) who clocked in on `date`.
pub async fn present_count_in_db(pool: &SqlitePool, date: NaiveDate, roles: &[EmployeeRole]) -> Result<i64> {
    count_scoped(
        pool,
        "SELECT COUNT(DISTINCT a.employee_id) FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE e.is_active = 1 AND date(a.check_in) = ",
        date,
        roles,
    )
    .await
}

pub async fn day_stats_from_db(pool: &SqlitePool, date: NaiveDate, roles: &[EmployeeRole]) -> Result<DayAttendanceStats> {
    let active_employees = count_active_employees_in_db(pool, roles).await?;
    let present = present_count_in_db(pool, date, roles).await?;
    let late = count_scoped(
        pool,
        "SELECT COUNT(DISTINCT a.employee_id) FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE e.is_active = 1 AND a.status = 'late' AND date(a.check_in) = ",
        date,
        roles,
    )
    .await?;
    let on_leave = {
        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(DISTINCT l.employee_id) FROM leaves l JOIN employees e ON e.id = l.employee_id WHERE e.is_active = 1 AND l.status = 'approved' AND l.start_date <= ",
        );
        count.push_bind(date).push(" AND l.end_date >= ").push_bind(date);
        push_role_scope(&mut count, "e.role", roles);
        count
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .context("Failed to count employees on leave")?
    };

    Ok(DayAttendanceStats {
        date,
        active_employees,
        present,
        late,
        absent: (active_employees - present).max(0),
        on_leave,
        present_percentage: percentage(present, active_employees),
    })
}

/// Present counts for the seven days ending on `today`, oldest first.
pub async fn last_seven_days_from_db(pool: &SqlitePool, today: NaiveDate, roles: &[EmployeeRole]) -> Result<Vec<DailyCount>> {
    let mut series = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset);
        series.push(DailyCount {
            date,
            present: present_count_in_db(pool, date, roles).await?,
        });
    }
    Ok(series)
}

/// (worked days, late arrivals) from the first of the month to `today`, within `roles`.
pub async fn month_to_date_from_db(pool: &SqlitePool, today: NaiveDate, roles: &[EmployeeRole]) -> Result<(i64, i64)> {
    let first = today
        .with_day0(0)
        .context("Failed to compute the first day of the month")?;

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT COUNT(DISTINCT a.employee_id || '-' || date(a.check_in)), COALESCE(SUM(CASE WHEN a.status = 'late' THEN 1 ELSE 0 END), 0) FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE e.is_active = 1 AND date(a.check_in) >= ",
    );
    builder.push_bind(first).push(" AND date(a.check_in) <= ").push_bind(today);
    push_role_scope(&mut builder, "e.role", roles);
    builder
        .build_query_as::<(i64, i64)>()
        .fetch_one(pool)
        .await
        .context("Failed to compute month-to-date attendance")
}

/// Applies a supervisor correction. Returns None when the record does not exist.
pub async fn correct_attendance_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: AttendanceCorrectionPayload,
) -> Result<Option<Attendance>> {
    let Some(mut attendance) = get_attendance_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(status) = payload.status {
        attendance.status = status;
    }
    if let Some(notes) = payload.notes {
        attendance.notes = notes;
    }
    if let Some(check_out) = payload.check_out {
        if check_out <= attendance.check_in {
            return Err(DomainError::validation("Check-out must be after check-in.").into());
        }
        attendance.check_out = Some(check_out);
    }

    sqlx::query("UPDATE attendance SET status = ?, notes = ?, check_out = ? WHERE id = ?")
        .bind(attendance.status)
        .bind(&attendance.notes)
        .bind(attendance.check_out)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to correct attendance with ID: {}", id))?;

    info!("Attendance {} corrected.", id);
    Ok(Some(attendance))
}
