// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::{Datelike, Utc};
use hotel_common::{
    CreateEmployeePayload, Employee, EmployeeQuery, MonthQuery, MonthlySummary, Page,
    ProfileUpdatePayload, ProfileView, UpdateEmployeePayload,
};
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

use super::attendance::monthly_summary;
use super::{message, AppError};
use crate::auth::password::hash_password;
use crate::auth::CurrentUser;
use crate::database::{dashboard, employees};
use crate::state::AppState;

/// Loads an employee the current user is allowed to see.
pub(crate) async fn visible_employee(state: &AppState, user: &CurrentUser, id: i64) -> Result<Employee, AppError> {
    let employee = employees::get_employee_from_db(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Employee with ID {} not found.", id)))?;
    user.require(user.can_view(&employee))?;
    Ok(employee)
}

/// Handler for listing the employees the current user supervises.
pub async fn list_employees(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<EmployeeQuery>,
) -> Result<Json<Page<Employee>>, AppError> {
    user.require(user.role().is_supervisor())?;
    let (items, total) = employees::list_employees_from_db(&state.pool, user.role().supervised_roles(), &query).await?;
    debug!("Listed {} of {} employees for {}", items.len(), total, user.employee.username);
    Ok(Json(Page::new(items, &query.page_query(), total)))
}

pub async fn get_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Employee>, AppError> {
    Ok(Json(visible_employee(&state, &user, id).await?))
}

/// Handler for creating an employee account.
pub async fn create_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<(StatusCode, Json<Employee>), AppError> {
    user.require(user.role().manages_staff())?;
    payload.validate()?;
    debug!("Received request to create employee {}", payload.username);
    let password_hash = hash_password(&payload.password)?;
    let employee = employees::create_employee_in_db(&state.pool, payload, password_hash, Utc::now()).await?;
    info!("Employee {} created by {}.", employee.username, user.employee.username);
    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn update_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<Json<Employee>, AppError> {
    user.require(user.role().manages_staff())?;
    payload.validate()?;
    employees::update_employee_in_db(&state.pool, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Employee with ID {} not found.", id)))
}

/// Soft delete. Nobody can deactivate their own account.
pub async fn delete_employee(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_staff())?;
    if id == user.id() {
        return Err(AppError::bad_request("You cannot deactivate your own account."));
    }
    if employees::deactivate_employee_in_db(&state.pool, id).await? {
        info!("Employee {} deactivated by {}.", id, user.employee.username);
        Ok(message(format!("Employee {} deactivated.", id)))
    } else {
        Err(AppError::not_found(&format!("Employee with ID {} not found.", id)))
    }
}

/// Monthly attendance aggregation of one employee (defaults to the current month).
pub async fn employee_stats(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    let employee = visible_employee(&state, &user, id).await?;
    let today = Utc::now().date_naive();
    let summary = monthly_summary(
        &state,
        employee.id,
        query.year.unwrap_or(today.year()),
        query.month.unwrap_or(today.month()),
    )
    .await?;
    Ok(Json(summary))
}

pub async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> Result<Json<ProfileView>, AppError> {
    let profile = dashboard::profile_from_db(
        &state.pool,
        user.employee,
        Utc::now(),
        state.config.standard_shift_hours,
    )
    .await?;
    Ok(Json(profile))
}

/// Handler for editing one's own phone, bio and availability.
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ProfileUpdatePayload>,
) -> Result<Json<Employee>, AppError> {
    payload.validate()?;
    let employee = employees::update_profile_in_db(&state.pool, user.id(), payload)
        .await?
        .ok_or_else(|| AppError::not_found("Your account no longer exists."))?;
    info!("Employee {} updated their profile.", employee.username);
    Ok(Json(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{state, user};
    use hotel_common::EmployeeRole;

    #[tokio::test]
    async fn managers_only_see_their_team() {
        let state = state().await;
        let manager = user(&state.pool, "hkm", EmployeeRole::HousekeepingManager).await;
        let maid = user(&state.pool, "maid", EmployeeRole::RoomAttendant).await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;

        let Json(page) = list_employees(State(state.clone()), manager.clone(), Query(EmployeeQuery::default()))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id, maid.id());

        assert!(get_employee(State(state.clone()), manager.clone(), Path(maid.id())).await.is_ok());
        let err = get_employee(State(state.clone()), manager, Path(clerk.id())).await.unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);

        let err = list_employees(State(state), maid, Query(EmployeeQuery::default())).await.unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn directors_cannot_deactivate_themselves() {
        let state = state().await;
        let boss = user(&state.pool, "boss", EmployeeRole::Director).await;
        let err = delete_employee(State(state), boss.clone(), Path(boss.id())).await.unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_month_is_rejected() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let query = MonthQuery {
            employee_id: None,
            year: Some(2025),
            month: Some(13),
        };
        let err = employee_stats(State(state), clerk.clone(), Path(clerk.id()), Query(query))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
    }
}
