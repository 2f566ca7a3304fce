// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use hotel_common::attendance::{month_bounds, summarize_month};
use hotel_common::{
    AttendanceCorrectionPayload, AttendanceHistory, AttendanceHistoryQuery, AttendanceOverview,
    AttendanceView, CheckInPayload, CheckOutPayload, MonthQuery, MonthlySummary, MyAttendance, Page,
};
use tracing::{debug, info};

use super::employees::visible_employee;
use super::AppError;
use crate::auth::CurrentUser;
use crate::database::{attendance, employees};
use crate::state::AppState;

const RECENT_RECORDS: i64 = 10;

/// Handler for clocking in. One attendance per employee per day.
pub async fn check_in(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Option<Json<CheckInPayload>>,
) -> Result<(StatusCode, Json<AttendanceView>), AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let now = Utc::now();
    let record = attendance::check_in_in_db(&state.pool, user.id(), payload, now, state.config.late_after_hour).await?;
    Ok((
        StatusCode::CREATED,
        Json(record.view(now, state.config.standard_shift_hours)),
    ))
}

/// Handler for clocking out of today's shift.
pub async fn check_out(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Option<Json<CheckOutPayload>>,
) -> Result<Json<AttendanceView>, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let now = Utc::now();
    let record = attendance::check_out_in_db(&state.pool, user.id(), payload, now).await?;
    Ok(Json(record.view(now, state.config.standard_shift_hours)))
}

pub async fn my_attendance(State(state): State<AppState>, user: CurrentUser) -> Result<Json<MyAttendance>, AppError> {
    let now = Utc::now();
    let hours = state.config.standard_shift_hours;
    let today = attendance::attendance_on_day_from_db(&state.pool, user.id(), now.date_naive())
        .await?
        .map(|a| a.view(now, hours));
    let is_checked_in = today.as_ref().is_some_and(|v| v.attendance.is_open());
    let worked_minutes_today = today.as_ref().map(|v| v.duration_minutes).unwrap_or(0);
    let recent = attendance::recent_attendance_from_db(&state.pool, user.id(), RECENT_RECORDS)
        .await?
        .into_iter()
        .map(|a| a.view(now, hours))
        .collect();

    Ok(Json(MyAttendance {
        today,
        is_checked_in,
        worked_minutes_today,
        recent,
    }))
}

/// Own history, newest first, with the summary of the month the filter starts in.
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<AttendanceHistoryQuery>,
) -> Result<Json<AttendanceHistory>, AppError> {
    let now = Utc::now();
    let hours = state.config.standard_shift_hours;
    let (records, total) = attendance::attendance_history_from_db(&state.pool, user.id(), &query).await?;
    let records: Vec<AttendanceView> = records.into_iter().map(|a| a.view(now, hours)).collect();

    let month_of = query.start_date.unwrap_or(now.date_naive());
    let summary = monthly_summary(&state, user.id(), month_of.year(), month_of.month()).await?;
    Ok(Json(AttendanceHistory {
        records: Page::new(records, &query.page_query(), total),
        summary,
    }))
}

/// Handler for the supervisors' attendance board.
pub async fn overview(State(state): State<AppState>, user: CurrentUser) -> Result<Json<AttendanceOverview>, AppError> {
    user.require(user.role().is_supervisor())?;
    let now = Utc::now();
    let today = now.date_naive();
    let roles = user.role().supervised_roles();
    let hours = state.config.standard_shift_hours;

    let stats = attendance::day_stats_from_db(&state.pool, today, roles).await?;
    let records = attendance::day_attendance_from_db(&state.pool, today, roles)
        .await?
        .into_iter()
        .map(|a| a.view(now, hours))
        .collect();
    let last_seven_days = attendance::last_seven_days_from_db(&state.pool, today, roles).await?;
    let (month_worked_days, month_late_arrivals) = attendance::month_to_date_from_db(&state.pool, today, roles).await?;
    debug!("Attendance overview for {}: {} present", user.employee.username, stats.present);

    Ok(Json(AttendanceOverview {
        today: stats,
        records,
        last_seven_days,
        month_worked_days,
        month_late_arrivals,
    }))
}

pub(crate) async fn monthly_summary(state: &AppState, employee_id: i64, year: i32, month: u32) -> Result<MonthlySummary, AppError> {
    month_bounds(year, month)?;
    let records = attendance::month_attendance_from_db(&state.pool, employee_id, year, month).await?;
    Ok(summarize_month(&records, year, month, state.config.standard_shift_hours))
}

/// Monthly report of one employee; defaults to self and the current month.
pub async fn report(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let employee_id = query.employee_id.unwrap_or(user.id());
    if employee_id != user.id() {
        user.require(user.role().is_supervisor())?;
        visible_employee(&state, &user, employee_id).await?;
    }
    let today = Utc::now().date_naive();
    let summary = monthly_summary(
        &state,
        employee_id,
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )
    .await?;
    Ok(Json(summary))
}

/// Handler for a supervisor correcting an attendance record.
pub async fn correct(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AttendanceCorrectionPayload>,
) -> Result<Json<AttendanceView>, AppError> {
    let record = attendance::get_attendance_from_db(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Attendance with ID {} not found.", id)))?;
    let owner = employees::get_employee_from_db(&state.pool, record.employee_id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Employee with ID {} not found.", record.employee_id)))?;
    user.require(user.employee.can_supervise(&owner))?;

    let updated = attendance::correct_attendance_in_db(&state.pool, id, payload)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Attendance with ID {} not found.", id)))?;
    info!("Attendance {} corrected by {}.", id, user.employee.username);
    Ok(Json(updated.view(Utc::now(), state.config.standard_shift_hours)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{state, user};
    use hotel_common::EmployeeRole;

    #[tokio::test]
    async fn second_check_in_is_a_conflict() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;

        let (code, _) = check_in(State(state.clone()), clerk.clone(), None).await.unwrap();
        assert_eq!(code, StatusCode::CREATED);
        let err = check_in(State(state.clone()), clerk.clone(), None).await.unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);

        let Json(mine) = my_attendance(State(state.clone()), clerk.clone()).await.unwrap();
        assert!(mine.is_checked_in);
        assert_eq!(mine.recent.len(), 1);

        check_out(State(state.clone()), clerk.clone(), None).await.unwrap();
        let err = check_out(State(state), clerk, None).await.unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn corrections_need_a_supervisor_of_the_owner() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let reception = user(&state.pool, "recm", EmployeeRole::ReceptionManager).await;
        let hk = user(&state.pool, "hkm", EmployeeRole::HousekeepingManager).await;
        let (_, Json(view)) = check_in(State(state.clone()), clerk.clone(), None).await.unwrap();

        let fix = || AttendanceCorrectionPayload {
            status: Some(hotel_common::AttendanceStatus::Present),
            notes: Some("Badge reader down".to_string()),
            check_out: None,
        };
        let err = correct(State(state.clone()), hk, Path(view.attendance.id), Json(fix()))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        let Json(fixed) = correct(State(state), reception, Path(view.attendance.id), Json(fix()))
            .await
            .unwrap();
        assert_eq!(fixed.attendance.notes, "Badge reader down");
    }

    #[tokio::test]
    async fn overview_is_for_supervisors() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let err = overview(State(state.clone()), clerk).await.unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        let hr = user(&state.pool, "hr", EmployeeRole::HumanResources).await;
        let Json(board) = overview(State(state), hr).await.unwrap();
        assert_eq!(board.last_seven_days.len(), 7);
        assert_eq!(board.today.present, 0);
    }
}
