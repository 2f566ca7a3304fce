// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, State};
use chrono::Utc;
use hotel_common::Dashboard;
use sqlx::SqlitePool;
use tracing::debug;

use super::AppError;
use crate::auth::CurrentUser;
use crate::database::dashboard;

/// Handler for the landing page data. The payload depends on the caller's role.
pub async fn get_dashboard(State(pool): State<SqlitePool>, user: CurrentUser) -> Result<Json<Dashboard>, AppError> {
    debug!("Building {:?} dashboard for {}", user.role().dashboard(), user.employee.username);
    let dashboard = dashboard::dashboard_from_db(&pool, &user.employee, Utc::now()).await?;
    Ok(Json(dashboard))
}
