// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, State};
use chrono::Utc;
use hotel_common::RolloverReport;
use sqlx::SqlitePool;
use tracing::info;

use super::AppError;
use crate::auth::CurrentUser;
use crate::database::rollover;

/// Handler for running the daily rollover on demand.
pub async fn run_rollover(State(pool): State<SqlitePool>, user: CurrentUser) -> Result<Json<RolloverReport>, AppError> {
    user.require(user.role().manages_housekeeping() || user.role().manages_front_desk())?;
    info!("Manual rollover requested by {}.", user.employee.username);
    let now = Utc::now();
    let report = rollover::rollover_in_db(&pool, now.date_naive(), now).await?;
    Ok(Json(report))
}
