// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use hotel_common::cleaning::STAY_OVER_PRIORITY;
use hotel_common::{CleaningType, RolloverReport};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::cleaning::{has_open_cleaning_task, insert_cleaning_task, NewCleaningTask};
use super::reservations::in_house_reservations_from_db;

/// Start-of-day housekeeping for `today`, in one transaction:
/// confirmed guests who never arrived become no-shows, vacant rooms with an
/// arrival today are reserved, and in-house rooms without an open cleaning
/// task get a stay-over (or deep) clean.
pub async fn rollover_in_db(pool: &SqlitePool, today: NaiveDate, now: DateTime<Utc>) -> Result<RolloverReport> {
    debug!("Attempting the daily rollover for {}", today);
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let no_shows = sqlx::query(
        "UPDATE reservations SET status = 'no_show', updated_at = ? WHERE status = 'confirmed' AND check_in_date < ?",
    )
    .bind(now)
    .bind(today)
    .execute(&mut *tx)
    .await
    .context("Failed to mark no-shows")?
    .rows_affected();

    // Rooms still held for guests who turned into no-shows.
    sqlx::query(
        r#"UPDATE rooms SET occupancy = 'vacant', updated_at = ?1
           WHERE occupancy = 'reserved'
             AND NOT EXISTS (
                 SELECT 1 FROM reservations x
                 WHERE x.room_id = rooms.id AND x.status = 'confirmed' AND x.check_in_date = ?2
             )"#,
    )
    .bind(now)
    .bind(today)
    .execute(&mut *tx)
    .await
    .context("Failed to release reserved rooms")?;

    let rooms_reserved = sqlx::query(
        r#"UPDATE rooms SET occupancy = 'reserved', updated_at = ?1
           WHERE occupancy = 'vacant' AND is_active = 1
             AND EXISTS (
                 SELECT 1 FROM reservations x
                 WHERE x.room_id = rooms.id AND x.status = 'confirmed' AND x.check_in_date = ?2
             )"#,
    )
    .bind(now)
    .bind(today)
    .execute(&mut *tx)
    .await
    .context("Failed to reserve rooms for today's arrivals")?
    .rows_affected();

    let mut stay_over_tasks = 0;
    for reservation in in_house_reservations_from_db(&mut *tx).await? {
        let Some(cleaning_type) = reservation.cleaning_needed(today, now) else {
            continue;
        };
        // Departing rooms are cleaned at check-out.
        if cleaning_type == CleaningType::Checkout {
            continue;
        }
        if has_open_cleaning_task(&mut tx, reservation.room_id).await? {
            continue;
        }
        insert_cleaning_task(
            &mut tx,
            NewCleaningTask {
                room_id: reservation.room_id,
                assigned_to: None,
                cleaning_type,
                priority: STAY_OVER_PRIORITY,
                scheduled_for: Some(now),
                notes: format!("Stay-over of {}", reservation.guest_full_name()),
            },
            now,
        )
        .await?;
        stay_over_tasks += 1;
    }

    tx.commit().await.context("Failed to commit the daily rollover")?;

    let report = RolloverReport {
        no_shows,
        rooms_reserved,
        stay_over_tasks,
    };
    info!(
        "Rollover for {} done: {} no-shows, {} rooms reserved, {} stay-over tasks.",
        today, report.no_shows, report.rooms_reserved, report.stay_over_tasks
    );
    Ok(report)
}
