// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, State};
use hotel_common::{ChangePasswordPayload, Employee, LoginPayload, LoginResponse};
use serde_json::Value;
use tracing::{debug, info, warn};
use validator::Validate;

use super::{message, AppError};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::CurrentUser;
use crate::database::employees::{get_employee_by_username_from_db, set_password_in_db};
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid username or password.";

/// Handler for logging in. Unknown users and wrong passwords get the same answer.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    debug!("Received login request for {}", payload.username);
    let employee = get_employee_by_username_from_db(&state.pool, payload.username.trim())
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(&payload.password, &employee.password_hash) {
        warn!("Failed login for {}", employee.username);
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }
    if !employee.is_active {
        return Err(AppError::forbidden("This account has been deactivated."));
    }

    let token = state.tokens.issue(&employee).map_err(anyhow::Error::from)?;
    info!("Employee {} logged in.", employee.username);
    Ok(Json(LoginResponse { token, employee }))
}

/// Handler for logging out. The presented token stops working immediately.
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Json<Value> {
    state.tokens.revoke(&user.claims);
    info!("Employee {} logged out.", user.employee.username);
    message("Logged out.")
}

pub async fn me(user: CurrentUser) -> Json<Employee> {
    Json(user.employee)
}

/// Handler for changing one's own password.
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ChangePasswordPayload>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;
    if !verify_password(&payload.current_password, &user.employee.password_hash) {
        return Err(AppError::bad_request("The current password is incorrect."));
    }
    let hash = hash_password(&payload.new_password)?;
    set_password_in_db(&state.pool, user.id(), &hash).await?;
    info!("Employee {} changed their password.", user.employee.username);
    Ok(message("Password updated."))
}
