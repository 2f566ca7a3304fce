// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use hotel_common::leave::leave_summary;
use hotel_common::{
    Leave, LeaveDecisionPayload, LeaveManagement, LeaveManagementQuery, LeaveRequestPayload,
    MyLeaves, Page, PageQuery,
};
use tracing::{debug, info};
use validator::Validate;

use super::AppError;
use crate::auth::CurrentUser;
use crate::database::{employees, leaves};
use crate::state::AppState;

/// Loads a leave its owner, or a supervisor of its owner, may see.
pub(crate) async fn visible_leave(state: &AppState, user: &CurrentUser, id: i64) -> Result<Leave, AppError> {
    let leave = leaves::get_leave_from_db(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Leave with ID {} not found.", id)))?;
    if leave.employee_id != user.id() {
        let owner = employees::get_employee_from_db(&state.pool, leave.employee_id)
            .await?
            .ok_or_else(|| AppError::not_found(&format!("Employee with ID {} not found.", leave.employee_id)))?;
        user.require(user.employee.can_supervise(&owner))?;
    }
    Ok(leave)
}

async fn own_leave(state: &AppState, user: &CurrentUser, id: i64) -> Result<Leave, AppError> {
    let leave = visible_leave(state, user, id).await?;
    if leave.employee_id != user.id() {
        return Err(AppError::forbidden("Only the requester can change this leave."));
    }
    Ok(leave)
}

/// Handler for requesting a leave.
pub async fn request_leave(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<LeaveRequestPayload>,
) -> Result<(StatusCode, Json<Leave>), AppError> {
    payload.validate()?;
    debug!(
        "Leave request from {}: {} to {}",
        user.employee.username, payload.start_date, payload.end_date
    );
    let leave = leaves::create_leave_in_db(&state.pool, user.id(), payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(leave)))
}

/// Own requests, newest first, with this year's allowance usage.
pub async fn my_leaves(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<MyLeaves>, AppError> {
    let year = Utc::now().year();
    let (items, total) = leaves::employee_leaves_from_db(&state.pool, user.id(), &page).await?;
    let this_year = leaves::employee_leaves_in_year_from_db(&state.pool, user.id(), year).await?;
    Ok(Json(MyLeaves {
        leaves: Page::new(items, &page, total),
        summary: leave_summary(&this_year, year, state.config.annual_leave_days),
    }))
}

pub async fn get_leave(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Leave>, AppError> {
    Ok(Json(visible_leave(&state, &user, id).await?))
}

pub async fn update_leave(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<LeaveRequestPayload>,
) -> Result<Json<Leave>, AppError> {
    payload.validate()?;
    own_leave(&state, &user, id).await?;
    let updated = leaves::update_leave_in_db(&state.pool, id, payload, Utc::now()).await?;
    Ok(Json(updated))
}

pub async fn cancel_leave(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Leave>, AppError> {
    own_leave(&state, &user, id).await?;
    let cancelled = leaves::cancel_leave_in_db(&state.pool, id, Utc::now()).await?;
    Ok(Json(cancelled))
}

/// Handler for the supervisors' leave list: pending first, with counts.
pub async fn manage_leaves(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<LeaveManagementQuery>,
) -> Result<Json<LeaveManagement>, AppError> {
    user.require(user.role().is_supervisor())?;
    let roles = user.role().supervised_roles();
    let (items, total) = leaves::management_leaves_from_db(&state.pool, roles, &query).await?;
    let counts = leaves::leave_counts_from_db(&state.pool, roles, Utc::now().date_naive()).await?;
    Ok(Json(LeaveManagement {
        leaves: Page::new(items, &query.page_query(), total),
        counts,
    }))
}

/// Handler for approving or rejecting a pending leave.
pub async fn decide_leave(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<LeaveDecisionPayload>,
) -> Result<Json<Leave>, AppError> {
    user.require(user.role().is_supervisor())?;
    let leave = visible_leave(&state, &user, id).await?;
    if leave.employee_id == user.id() {
        return Err(AppError::forbidden("You cannot decide on your own leave."));
    }
    let decided = leaves::decide_leave_in_db(&state.pool, id, payload, user.id(), Utc::now()).await?;
    info!("Leave {} {} by {}.", id, decided.status, user.employee.username);
    Ok(Json(decided))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{state, user};
    use chrono::Duration;
    use hotel_common::{EmployeeRole, LeaveStatus, LeaveType};

    fn next_week() -> LeaveRequestPayload {
        let start = Utc::now().date_naive() + Duration::days(7);
        LeaveRequestPayload {
            leave_type: LeaveType::Vacation,
            start_date: start,
            end_date: start + Duration::days(2),
            reason: "Family trip".to_string(),
        }
    }

    fn approve() -> LeaveDecisionPayload {
        LeaveDecisionPayload {
            status: LeaveStatus::Approved,
            rejection_reason: None,
        }
    }

    #[tokio::test]
    async fn only_the_requesters_supervisor_decides() {
        let state = state().await;
        let maid = user(&state.pool, "maid", EmployeeRole::RoomAttendant).await;
        let reception = user(&state.pool, "recm", EmployeeRole::ReceptionManager).await;
        let hk = user(&state.pool, "hkm", EmployeeRole::HousekeepingManager).await;

        let (_, Json(leave)) = request_leave(State(state.clone()), maid.clone(), Json(next_week()))
            .await
            .unwrap();

        let err = decide_leave(State(state.clone()), reception, Path(leave.id), Json(approve()))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        let Json(approved) = decide_leave(State(state.clone()), hk.clone(), Path(leave.id), Json(approve()))
            .await
            .unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.approved_by, Some(hk.id()));

        let err = decide_leave(State(state.clone()), hk, Path(leave.id), Json(approve()))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);

        let Json(mine) = my_leaves(State(state), maid, Query(PageQuery::default())).await.unwrap();
        assert_eq!(mine.leaves.total, 1);
        assert_eq!(mine.summary.approved_count, 1);
    }

    #[tokio::test]
    async fn supervisors_cannot_approve_themselves() {
        let state = state().await;
        let boss = user(&state.pool, "boss", EmployeeRole::Director).await;
        let (_, Json(leave)) = request_leave(State(state.clone()), boss.clone(), Json(next_week()))
            .await
            .unwrap();
        let err = decide_leave(State(state), boss, Path(leave.id), Json(approve()))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn supervisors_see_but_cannot_cancel() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let reception = user(&state.pool, "recm", EmployeeRole::ReceptionManager).await;
        let (_, Json(leave)) = request_leave(State(state.clone()), clerk.clone(), Json(next_week()))
            .await
            .unwrap();

        assert!(get_leave(State(state.clone()), reception.clone(), Path(leave.id)).await.is_ok());
        let err = cancel_leave(State(state.clone()), reception, Path(leave.id)).await.unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        let Json(cancelled) = cancel_leave(State(state), clerk, Path(leave.id)).await.unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
    }
}
