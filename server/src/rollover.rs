// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::database::rollover::rollover_in_db;

/// Runs the rollover once for `today` unless `last_date` already covers it.
/// Returns true when a rollover ran.
pub async fn roll_over_if_new_day(pool: &SqlitePool, last_date: &Mutex<NaiveDate>, today: NaiveDate) -> bool {
    let mut last_date_guard = last_date.lock().await;
    if *last_date_guard >= today {
        tracing::debug!(
            "No new day yet. Current date: {}. Last rollover date: {}.",
            today,
            *last_date_guard
        );
        return false;
    }

    tracing::info!("New day detected: {}, performing the daily rollover.", today);
    match rollover_in_db(pool, today, Utc::now()).await {
        Ok(_) => {
            *last_date_guard = today;
            true
        }
        Err(e) => {
            tracing::error!("Error during automatic rollover: {:?}", e);
            false
        }
    }
}

/// Checks every `interval_secs` whether the calendar day changed.
pub fn spawn_rollover_loop(pool: SqlitePool, interval_secs: u64) -> JoinHandle<()> {
    let last_rollover_date = Arc::new(Mutex::new(Utc::now().date_naive()));

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;
            roll_over_if_new_day(&pool, &last_rollover_date, Utc::now().date_naive()).await;
        }
    })
}
