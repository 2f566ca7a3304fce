// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod jwt;
pub mod password;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use hotel_common::{Employee, EmployeeRole};
use tracing::warn;

use crate::database::employees::get_employee_from_db;
use crate::handlers::AppError;
use crate::state::AppState;

pub use jwt::{Claims, TokenError, TokenService};

/// The authenticated employee behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub employee: Employee,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.employee.id
    }

    pub fn role(&self) -> EmployeeRole {
        self.employee.role
    }

    /// 403 unless `allowed`.
    pub fn require(&self, allowed: bool) -> Result<(), AppError> {
        if allowed {
            Ok(())
        } else {
            warn!(
                "Employee {} ({}) was refused an action.",
                self.employee.username,
                self.role()
            );
            Err(AppError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }

    /// Self, or someone this user supervises.
    pub fn can_view(&self, other: &Employee) -> bool {
        self.id() == other.id || self.employee.can_supervise(other)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Authentication required."))?;
        let token = TokenService::extract_from_header(header)
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header."))?;

        let claims = state.tokens.validate(token).map_err(|e| {
            warn!("Rejected token for {}: {}", parts.uri, e);
            match e {
                TokenError::Expired => AppError::unauthorized("Session expired, please log in again."),
                _ => AppError::unauthorized("Invalid token."),
            }
        })?;
        let employee_id = claims
            .employee_id()
            .map_err(|_| AppError::unauthorized("Invalid token."))?;

        let employee = get_employee_from_db(&state.pool, employee_id)
            .await?
            .filter(|e| e.is_active)
            .ok_or_else(|| AppError::unauthorized("Account is no longer active."))?;

        let user = CurrentUser { employee, claims };
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
