// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use hotel_common::cleaning::TOP_CLEANING_PRIORITY;
use hotel_common::reservation::{format_reservation_number, nights, validate_stay};
use hotel_common::{
    CleaningTask, CleaningType, CreateReservationPayload, DomainError, Occupancy, PaymentStatus,
    Reservation, ReservationAction, ReservationQuery, ReservationStatus, Room, RoomStatus,
    UpdateReservationPayload,
};
use rand::Rng;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info, warn};

use super::cleaning::{insert_cleaning_task, NewCleaningTask};
use super::rooms::{get_room_type_from_db, require_room, set_room_state_in_db};

const NUMBER_ATTEMPTS: usize = 20;

pub async fn get_reservation_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Reservation>> {
    sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve reservation with ID: {}", id))
}

async fn require_reservation(conn: &mut SqliteConnection, id: i64) -> Result<Reservation> {
    get_reservation_from_db(&mut *conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found("Reservation", id).into())
}

/// Refuses `[check_in, check_out)` on `room_id` if a confirmed or checked-in
/// stay (other than `exclude_id`) overlaps it.
async fn ensure_room_free(
    conn: &mut SqliteConnection,
    room_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    exclude_id: Option<i64>,
) -> Result<()> {
    let clash: Option<String> = sqlx::query_scalar(
        "SELECT reservation_number FROM reservations WHERE room_id = ? AND status IN ('confirmed', 'checked_in') AND check_in_date < ? AND check_out_date > ? AND id != ? LIMIT 1",
    )
    .bind(room_id)
    .bind(check_out)
    .bind(check_in)
    .bind(exclude_id.unwrap_or(0))
    .fetch_optional(&mut *conn)
    .await
    .context("Failed to check overlapping reservations")?;

    match clash {
        Some(number) => Err(DomainError::conflict(format!(
            "The room is already booked for these dates ({}).",
            number
        ))
        .into()),
        None => Ok(()),
    }
}

/// Room capacity for the room's type.
async fn room_capacity_and_rate(conn: &mut SqliteConnection, room: &Room) -> Result<(i64, i64)> {
    let room_type = get_room_type_from_db(&mut *conn, room.room_type_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Room type", room.room_type_id))?;
    Ok((room_type.capacity, room_type.base_rate_cents))
}

fn random_suffix() -> u16 {
    rand::thread_rng().gen_range(0..10_000)
}

async fn generate_reservation_number(conn: &mut SqliteConnection, date: NaiveDate) -> Result<String> {
    for _ in 0..NUMBER_ATTEMPTS {
        let candidate = format_reservation_number(date, random_suffix());
        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE reservation_number = ?")
            .bind(&candidate)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check reservation number")?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    anyhow::bail!("Could not generate a free reservation number for {}", date)
}

async fn save_reservation(conn: &mut SqliteConnection, r: &Reservation) -> Result<()> {
    sqlx::query(
        r#"UPDATE reservations SET room_id = ?, check_in_date = ?, check_out_date = ?, actual_check_in = ?, actual_check_out = ?,
           guest_first_name = ?, guest_last_name = ?, guest_email = ?, guest_phone = ?, guest_document = ?, guest_nationality = ?,
           adults = ?, children = ?, special_requests = ?, status = ?, payment_status = ?, room_rate_cents = ?, total_cents = ?,
           paid_cents = ?, internal_notes = ?, cancellation_reason = ?, checked_in_by = ?, checked_out_by = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(r.room_id)
    .bind(r.check_in_date)
    .bind(r.check_out_date)
    .bind(r.actual_check_in)
    .bind(r.actual_check_out)
    .bind(&r.guest_first_name)
    .bind(&r.guest_last_name)
    .bind(&r.guest_email)
    .bind(&r.guest_phone)
    .bind(&r.guest_document)
    .bind(&r.guest_nationality)
    .bind(r.adults)
    .bind(r.children)
    .bind(&r.special_requests)
    .bind(r.status)
    .bind(r.payment_status)
    .bind(r.room_rate_cents)
    .bind(r.total_cents)
    .bind(r.paid_cents)
    .bind(&r.internal_notes)
    .bind(&r.cancellation_reason)
    .bind(r.checked_in_by)
    .bind(r.checked_out_by)
    .bind(r.updated_at)
    .bind(r.id)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update reservation with ID: {}", r.id))?;
    Ok(())
}

pub async fn create_reservation_in_db(
    pool: &SqlitePool,
    payload: CreateReservationPayload,
    created_by: i64,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let room = require_room(&mut tx, payload.room_id).await?;
    if !room.is_active {
        return Err(DomainError::validation(format!("Room {} is not in service.", room.number)).into());
    }
    let (capacity, base_rate) = room_capacity_and_rate(&mut tx, &room).await?;
    let adults = payload.adults.unwrap_or(1);
    let children = payload.children.unwrap_or(0);
    validate_stay(payload.check_in_date, payload.check_out_date, adults, children, capacity)?;
    ensure_room_free(&mut tx, room.id, payload.check_in_date, payload.check_out_date, None).await?;

    let rate = payload.room_rate_cents.unwrap_or(base_rate);
    let total = rate * nights(payload.check_in_date, payload.check_out_date);
    let number = generate_reservation_number(&mut tx, now.date_naive()).await?;
    debug!("Insert values: number={}, room={}, total={}", number, room.number, total);

    let id = sqlx::query(
        r#"INSERT INTO reservations (reservation_number, room_id, check_in_date, check_out_date, guest_first_name, guest_last_name,
           guest_email, guest_phone, guest_document, guest_nationality, adults, children, special_requests, status, payment_status,
           room_rate_cents, total_cents, paid_cents, internal_notes, cancellation_reason, created_by, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, 0, ?, '', ?, ?, ?)"#,
    )
    .bind(&number)
    .bind(room.id)
    .bind(payload.check_in_date)
    .bind(payload.check_out_date)
    .bind(payload.guest_first_name.trim())
    .bind(payload.guest_last_name.trim())
    .bind(payload.guest_email.trim())
    .bind(payload.guest_phone.trim())
    .bind(payload.guest_document.as_deref().unwrap_or_default())
    .bind(payload.guest_nationality.as_deref().unwrap_or_default())
    .bind(adults)
    .bind(children)
    .bind(payload.special_requests.as_deref().unwrap_or_default())
    .bind(PaymentStatus::from_amounts(0, total))
    .bind(rate)
    .bind(total)
    .bind(payload.internal_notes.as_deref().unwrap_or_default())
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to insert reservation into DB")?
    .last_insert_rowid();

    let reservation = require_reservation(&mut tx, id).await?;
    tx.commit().await.context("Failed to commit reservation")?;
    info!("Reservation {} created for room {}.", number, room.number);
    Ok(reservation)
}

/// Edits a pending or confirmed reservation and recomputes its total.
pub async fn update_reservation_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateReservationPayload,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    if !matches!(r.status, ReservationStatus::Pending | ReservationStatus::Confirmed) {
        return Err(DomainError::transition("reservation", r.status, "edit").into());
    }

    let (old_room_id, old_check_in) = (r.room_id, r.check_in_date);
    let moves = payload.room_id.is_some_and(|room| room != r.room_id)
        || payload.check_in_date.is_some_and(|d| d != r.check_in_date)
        || payload.check_out_date.is_some_and(|d| d != r.check_out_date);

    if let Some(room_id) = payload.room_id {
        r.room_id = room_id;
    }
    if let Some(date) = payload.check_in_date {
        r.check_in_date = date;
    }
    if let Some(date) = payload.check_out_date {
        r.check_out_date = date;
    }
    if let Some(v) = payload.guest_first_name {
        r.guest_first_name = v.trim().to_string();
    }
    if let Some(v) = payload.guest_last_name {
        r.guest_last_name = v.trim().to_string();
    }
    if let Some(v) = payload.guest_email {
        r.guest_email = v.trim().to_string();
    }
    if let Some(v) = payload.guest_phone {
        r.guest_phone = v.trim().to_string();
    }
    if let Some(v) = payload.guest_document {
        r.guest_document = v;
    }
    if let Some(v) = payload.guest_nationality {
        r.guest_nationality = v;
    }
    if let Some(v) = payload.adults {
        r.adults = v;
    }
    if let Some(v) = payload.children {
        r.children = v;
    }
    if let Some(v) = payload.special_requests {
        r.special_requests = v;
    }
    if let Some(v) = payload.room_rate_cents {
        r.room_rate_cents = v;
    }
    if let Some(v) = payload.internal_notes {
        r.internal_notes = v;
    }

    let room = require_room(&mut tx, r.room_id).await?;
    if room.id != old_room_id && !room.is_active {
        return Err(DomainError::validation(format!("Room {} is not in service.", room.number)).into());
    }
    let (capacity, _) = room_capacity_and_rate(&mut tx, &room).await?;
    validate_stay(r.check_in_date, r.check_out_date, r.adults, r.children, capacity)?;
    if moves {
        ensure_room_free(&mut tx, r.room_id, r.check_in_date, r.check_out_date, Some(r.id)).await?;
    }

    r.total_cents = r.room_rate_cents * r.nights();
    r.payment_status = PaymentStatus::from_amounts(r.paid_cents, r.total_cents);
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;

    // A confirmed arrival due today carries its room hold along.
    if r.status == ReservationStatus::Confirmed {
        let today = now.date_naive();
        let held_before = old_check_in == today;
        let held_now = r.check_in_date == today;
        let same_room = old_room_id == r.room_id;
        if held_before && !(held_now && same_room) {
            release_room(&mut tx, old_room_id, now).await?;
        }
        if held_now && !(held_before && same_room) {
            hold_room(&mut tx, r.room_id, now).await?;
        }
    }
    tx.commit().await.context("Failed to commit reservation update")?;
    Ok(r)
}

/// Confirms a pending reservation. An arrival due today reserves its vacant room.
pub async fn confirm_reservation_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    r.status = r.status.apply(ReservationAction::Confirm)?;
    ensure_room_free(&mut tx, r.room_id, r.check_in_date, r.check_out_date, Some(r.id)).await?;
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;

    if r.check_in_date == now.date_naive() {
        hold_room(&mut tx, r.room_id, now).await?;
    }

    tx.commit().await.context("Failed to commit confirmation")?;
    info!("Reservation {} confirmed.", r.reservation_number);
    Ok(r)
}

/// Guest arrival: the room becomes occupied.
pub async fn check_in_reservation_in_db(
    pool: &SqlitePool,
    id: i64,
    employee_id: i64,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    r.status = r.status.apply(ReservationAction::CheckIn)?;

    let room = require_room(&mut tx, r.room_id).await?;
    if room.status.is_out_of_service() {
        return Err(DomainError::conflict(format!(
            "Room {} is {} and cannot receive guests.",
            room.number, room.status
        ))
        .into());
    }
    if room.occupancy == Occupancy::Occupied {
        return Err(DomainError::conflict(format!("Room {} is already occupied.", room.number)).into());
    }

    r.actual_check_in = Some(now);
    r.checked_in_by = Some(employee_id);
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;
    set_room_state_in_db(&mut tx, room.id, None, Some(Occupancy::Occupied), now).await?;

    tx.commit().await.context("Failed to commit check-in")?;
    info!("Reservation {} checked in to room {}.", r.reservation_number, room.number);
    Ok(r)
}

/// Guest departure: the room becomes dirty and vacant, and exactly one
/// top-priority checkout cleaning task is created, all in one transaction.
pub async fn check_out_reservation_in_db(
    pool: &SqlitePool,
    id: i64,
    employee_id: i64,
    now: DateTime<Utc>,
) -> Result<(Reservation, CleaningTask)> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    r.status = r.status.apply(ReservationAction::CheckOut)?;
    r.actual_check_out = Some(now);
    r.checked_out_by = Some(employee_id);
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;

    let room = set_room_state_in_db(
        &mut tx,
        r.room_id,
        Some(RoomStatus::Dirty),
        Some(Occupancy::Vacant),
        now,
    )
    .await?;

    let task = insert_cleaning_task(
        &mut tx,
        NewCleaningTask {
            room_id: room.id,
            assigned_to: None,
            cleaning_type: CleaningType::Checkout,
            priority: TOP_CLEANING_PRIORITY,
            scheduled_for: Some(now),
            notes: format!("Departure of {} ({})", r.guest_full_name(), r.reservation_number),
        },
        now,
    )
    .await?;

    tx.commit().await.context("Failed to commit check-out")?;
    if !r.is_paid() {
        warn!(
            "Reservation {} checked out with {} cents outstanding.",
            r.reservation_number,
            r.pending_cents()
        );
    }
    info!(
        "Reservation {} checked out, cleaning task {} created for room {}.",
        r.reservation_number, task.id, room.number
    );
    Ok((r, task))
}

/// Frees a reserved room unless another confirmed guest arrives in it today.
async fn release_room(conn: &mut SqliteConnection, room_id: i64, now: DateTime<Utc>) -> Result<()> {
    let room = require_room(conn, room_id).await?;
    if room.occupancy != Occupancy::Reserved {
        return Ok(());
    }
    let expected: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reservations WHERE room_id = ? AND status = 'confirmed' AND check_in_date = ?",
    )
    .bind(room_id)
    .bind(now.date_naive())
    .fetch_one(&mut *conn)
    .await
    .context("Failed to look up today's arrivals for the room")?;
    if expected == 0 {
        set_room_state_in_db(conn, room_id, None, Some(Occupancy::Vacant), now).await?;
    } else {
        debug!("Room {} stays reserved for another arrival today.", room.number);
    }
    Ok(())
}

/// Holds a vacant room for a confirmed guest arriving today.
async fn hold_room(conn: &mut SqliteConnection, room_id: i64, now: DateTime<Utc>) -> Result<()> {
    let room = require_room(conn, room_id).await?;
    if room.occupancy == Occupancy::Vacant {
        set_room_state_in_db(conn, room_id, None, Some(Occupancy::Reserved), now).await?;
    }
    Ok(())
}

pub async fn cancel_reservation_in_db(
    pool: &SqlitePool,
    id: i64,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    let was_blocking = r.status.blocks_room();
    r.status = r.status.apply(ReservationAction::Cancel)?;
    r.cancellation_reason = reason.unwrap_or_default();
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;
    if was_blocking && r.check_in_date <= now.date_naive() {
        release_room(&mut tx, r.room_id, now).await?;
    }
    tx.commit().await.context("Failed to commit cancellation")?;
    info!("Reservation {} cancelled.", r.reservation_number);
    Ok(r)
}

pub async fn mark_no_show_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<Reservation> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut r = require_reservation(&mut tx, id).await?;
    r.status = r.status.apply(ReservationAction::MarkNoShow)?;
    if r.check_in_date > now.date_naive() {
        return Err(DomainError::conflict(format!(
            "Reservation {} is not due before {}.",
            r.reservation_number, r.check_in_date
        ))
        .into());
    }
    r.updated_at = now;
    save_reservation(&mut tx, &r).await?;
    release_room(&mut tx, r.room_id, now).await?;
    tx.commit().await.context("Failed to commit no-show")?;
    Ok(r)
}

/// Adds a payment. Refused on cancelled or no-show reservations and beyond the amount due.
pub async fn record_payment_in_db(pool: &SqlitePool, id: i64, amount_cents: i64, now: DateTime<Utc>) -> Result<Reservation> {
    if amount_cents <= 0 {
        return Err(DomainError::validation("The amount must be positive.").into());
    }
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut r = require_reservation(&mut conn, id).await?;
    if matches!(r.status, ReservationStatus::Cancelled | ReservationStatus::NoShow) {
        return Err(DomainError::transition("reservation", r.status, "take a payment for").into());
    }
    if amount_cents > r.pending_cents() {
        return Err(DomainError::validation(format!(
            "The amount exceeds the {} cents still due.",
            r.pending_cents()
        ))
        .into());
    }
    r.paid_cents += amount_cents;
    r.payment_status = PaymentStatus::from_amounts(r.paid_cents, r.total_cents);
    r.updated_at = now;
    save_reservation(&mut conn, &r).await?;
    info!("Payment of {} cents recorded on {}.", amount_cents, r.reservation_number);
    Ok(r)
}

/// Marks the payments of a cancelled or no-show reservation as refunded.
pub async fn refund_reservation_in_db(pool: &SqlitePool, id: i64, now: DateTime<Utc>) -> Result<Reservation> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    let mut r = require_reservation(&mut conn, id).await?;
    if !matches!(r.status, ReservationStatus::Cancelled | ReservationStatus::NoShow) {
        return Err(DomainError::transition("reservation", r.status, "refund").into());
    }
    if r.paid_cents == 0 || r.payment_status == PaymentStatus::Refunded {
        return Err(DomainError::conflict("Nothing to refund on this reservation.").into());
    }
    r.payment_status = PaymentStatus::Refunded;
    r.updated_at = now;
    save_reservation(&mut conn, &r).await?;
    Ok(r)
}

fn push_reservation_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ReservationQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(room_id) = query.room_id {
        builder.push(" AND room_id = ").push_bind(room_id);
    }
    if let Some(from) = query.from {
        builder.push(" AND check_out_date >= ").push_bind(from);
    }
    if let Some(to) = query.to {
        builder.push(" AND check_in_date <= ").push_bind(to);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (guest_first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR guest_last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR guest_email LIKE ")
            .push_bind(pattern.clone())
            .push(" OR reservation_number LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Newest arrivals first.
pub async fn list_reservations_from_db(pool: &SqlitePool, query: &ReservationQuery) -> Result<(Vec<Reservation>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM reservations");
    push_reservation_filters(&mut count, query);
    let total = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count reservations")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM reservations");
    push_reservation_filters(&mut select, query);
    select
        .push(" ORDER BY check_in_date DESC, id DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let reservations = select
        .build_query_as::<Reservation>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve reservations")?;
    Ok((reservations, total))
}

/// Pending or confirmed stays starting on `date`.
pub async fn arrivals_from_db(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Reservation>> {
    sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE check_in_date = ? AND status IN ('pending', 'confirmed') ORDER BY guest_last_name ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve arrivals")
}

/// In-house stays ending on `date`.
pub async fn departures_from_db(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<Reservation>> {
    sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE check_out_date = ? AND status = 'checked_in' ORDER BY guest_last_name ASC",
    )
    .bind(date)
    .fetch_all(pool)
    .await
    .context("Failed to retrieve departures")
}

pub async fn in_house_reservations_from_db<'e, E: SqliteExecutor<'e>>(executor: E) -> Result<Vec<Reservation>> {
    sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE status = 'checked_in' ORDER BY room_id ASC")
        .fetch_all(executor)
        .await
        .context("Failed to retrieve in-house reservations")
}

/// The guest currently in the room.
pub async fn current_reservation_for_room(pool: &SqlitePool, room_id: i64) -> Result<Option<Reservation>> {
    sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE room_id = ? AND status = 'checked_in' ORDER BY check_in_date DESC LIMIT 1",
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve the room's current reservation")
}

/// The next confirmed arrival in the room from `today` on.
pub async fn next_reservation_for_room(pool: &SqlitePool, room_id: i64, today: NaiveDate) -> Result<Option<Reservation>> {
    sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE room_id = ? AND status = 'confirmed' AND check_in_date >= ? ORDER BY check_in_date ASC LIMIT 1",
    )
    .bind(room_id)
    .bind(today)
    .fetch_optional(pool)
    .await
    .context("Failed to retrieve the room's next reservation")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::cleaning::list_cleaning_tasks_from_db;
    use crate::database::employees::tests::insert_employee;
    use crate::database::memory_pool;
    use crate::database::rooms::tests::{insert_room, insert_room_type};
    use crate::database::rooms::{get_room_from_db, update_room_status_in_db};
    use chrono::{Duration, TimeZone};
    use hotel_common::{CleaningQuery, EmployeeRole};

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 10, 14, 0, 0).unwrap()
    }

    pub(crate) fn booking(room_id: i64, from_today: i64, nights: i64) -> CreateReservationPayload {
        let check_in = now().date_naive() + Duration::days(from_today);
        CreateReservationPayload {
            room_id,
            check_in_date: check_in,
            check_out_date: check_in + Duration::days(nights),
            guest_first_name: "Ada".to_string(),
            guest_last_name: "Lovelace".to_string(),
            guest_email: "ada@example.com".to_string(),
            guest_phone: "0102030405".to_string(),
            guest_document: None,
            guest_nationality: None,
            adults: Some(2),
            children: None,
            special_requests: None,
            room_rate_cents: None,
            internal_notes: None,
        }
    }

    struct Fixture {
        pool: SqlitePool,
        room: Room,
        clerk: i64,
    }

    async fn fixture() -> Fixture {
        let pool = memory_pool().await.unwrap();
        let kind = insert_room_type(&pool, "DBL", 2).await;
        let room = insert_room(&pool, "101", 1, kind.id).await;
        let clerk = insert_employee(&pool, "clerk", "Clara", EmployeeRole::Receptionist).await;
        Fixture { pool, room, clerk: clerk.id }
    }

    #[tokio::test]
    async fn create_prices_stay_from_room_type() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 3), f.clerk, now())
            .await
            .unwrap();
        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.room_rate_cents, 10_000);
        assert_eq!(r.total_cents, 30_000);
        assert_eq!(r.payment_status, PaymentStatus::Unpaid);
        assert!(r.reservation_number.starts_with("RES-20250710-"));
        assert_eq!(r.created_by, Some(f.clerk));
    }

    #[tokio::test]
    async fn party_larger_than_capacity_is_refused() {
        let f = fixture().await;
        let mut too_many = booking(f.room.id, 0, 1);
        too_many.children = Some(1);
        let err = create_reservation_in_db(&f.pool, too_many, f.clerk, now()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn confirmed_stays_block_overlaps_only() {
        let f = fixture().await;
        let first = create_reservation_in_db(&f.pool, booking(f.room.id, 1, 3), f.clerk, now())
            .await
            .unwrap();
        // Pending reservations do not hold the room.
        let second = create_reservation_in_db(&f.pool, booking(f.room.id, 2, 1), f.clerk, now())
            .await
            .unwrap();

        confirm_reservation_in_db(&f.pool, first.id, now()).await.unwrap();
        let err = confirm_reservation_in_db(&f.pool, second.id, now()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));

        let overlapping = create_reservation_in_db(&f.pool, booking(f.room.id, 3, 2), f.clerk, now()).await;
        assert!(overlapping.is_err());

        // Back-to-back stays share the turnover day.
        create_reservation_in_db(&f.pool, booking(f.room.id, 4, 2), f.clerk, now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn check_out_creates_exactly_one_cleaning_task() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 2), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, r.id, now()).await.unwrap();
        let reserved = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(reserved.occupancy, Occupancy::Reserved);

        check_in_reservation_in_db(&f.pool, r.id, f.clerk, now()).await.unwrap();
        let occupied = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(occupied.occupancy, Occupancy::Occupied);

        let later = now() + Duration::days(2);
        let (done, task) = check_out_reservation_in_db(&f.pool, r.id, f.clerk, later).await.unwrap();
        assert_eq!(done.status, ReservationStatus::CheckedOut);
        assert_eq!(done.checked_out_by, Some(f.clerk));
        assert_eq!(task.cleaning_type, CleaningType::Checkout);
        assert_eq!(task.priority, TOP_CLEANING_PRIORITY);

        let room = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Dirty);
        assert_eq!(room.occupancy, Occupancy::Vacant);

        let (tasks, total) = list_cleaning_tasks_from_db(&f.pool, &CleaningQuery::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(tasks[0].room_id, f.room.id);

        // A second check-out is an invalid transition and creates nothing.
        assert!(check_out_reservation_in_db(&f.pool, r.id, f.clerk, later).await.is_err());
        let (_, total) = list_cleaning_tasks_from_db(&f.pool, &CleaningQuery::default()).await.unwrap();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn rooms_under_maintenance_refuse_check_in() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 1), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, r.id, now()).await.unwrap();
        update_room_status_in_db(&f.pool, f.room.id, Some(RoomStatus::Maintenance), None)
            .await
            .unwrap();
        let err = check_in_reservation_in_db(&f.pool, r.id, f.clerk, now()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn payments_and_refunds() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 1, 2), f.clerk, now())
            .await
            .unwrap();
        let partial = record_payment_in_db(&f.pool, r.id, 5_000, now()).await.unwrap();
        assert_eq!(partial.payment_status, PaymentStatus::Partial);
        assert!(record_payment_in_db(&f.pool, r.id, 50_000, now()).await.is_err());
        let paid = record_payment_in_db(&f.pool, r.id, 15_000, now()).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);

        assert!(refund_reservation_in_db(&f.pool, r.id, now()).await.is_err());
        let cancelled = cancel_reservation_in_db(&f.pool, r.id, Some("Flight cancelled".to_string()), now())
            .await
            .unwrap();
        assert_eq!(cancelled.cancellation_reason, "Flight cancelled");
        let refunded = refund_reservation_in_db(&f.pool, r.id, now()).await.unwrap();
        assert_eq!(refunded.payment_status, PaymentStatus::Refunded);
    }

    #[tokio::test]
    async fn update_recomputes_total_and_rechecks_room() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 1, 2), f.clerk, now())
            .await
            .unwrap();
        let longer = update_reservation_in_db(
            &f.pool,
            r.id,
            UpdateReservationPayload {
                check_out_date: Some(r.check_out_date + Duration::days(2)),
                room_rate_cents: Some(8_000),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap();
        assert_eq!(longer.nights(), 4);
        assert_eq!(longer.total_cents, 32_000);

        cancel_reservation_in_db(&f.pool, r.id, None, now()).await.unwrap();
        let err = update_reservation_in_db(&f.pool, r.id, UpdateReservationPayload::default(), now())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn later_bookings_leave_todays_hold_alone() {
        let f = fixture().await;
        let today = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 2), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, today.id, now()).await.unwrap();
        let later = create_reservation_in_db(&f.pool, booking(f.room.id, 5, 1), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, later.id, now()).await.unwrap();

        let err = mark_no_show_in_db(&f.pool, later.id, now()).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));
        let unchanged = get_reservation_from_db(&f.pool, later.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ReservationStatus::Confirmed);

        cancel_reservation_in_db(&f.pool, later.id, None, now()).await.unwrap();
        let room = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(room.occupancy, Occupancy::Reserved);

        // Yesterday's guest never came; today's arrival keeps the room.
        let stale = create_reservation_in_db(&f.pool, booking(f.room.id, -1, 1), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, stale.id, now()).await.unwrap();
        mark_no_show_in_db(&f.pool, stale.id, now()).await.unwrap();
        let room = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(room.occupancy, Occupancy::Reserved);

        // The guest due today did not show up.
        let no_show = mark_no_show_in_db(&f.pool, today.id, now()).await.unwrap();
        assert_eq!(no_show.status, ReservationStatus::NoShow);
        let room = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(room.occupancy, Occupancy::Vacant);
    }

    #[tokio::test]
    async fn moving_a_todays_arrival_carries_the_hold() {
        let f = fixture().await;
        let other = insert_room(&f.pool, "102", 1, f.room.room_type_id).await;
        let closed = insert_room(&f.pool, "103", 1, f.room.room_type_id).await;
        crate::database::rooms::deactivate_room_in_db(&f.pool, closed.id).await.unwrap();

        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 2), f.clerk, now())
            .await
            .unwrap();
        confirm_reservation_in_db(&f.pool, r.id, now()).await.unwrap();

        let err = update_reservation_in_db(
            &f.pool,
            r.id,
            UpdateReservationPayload {
                room_id: Some(closed.id),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
        let stayed = get_reservation_from_db(&f.pool, r.id).await.unwrap().unwrap();
        assert_eq!(stayed.room_id, f.room.id);

        let moved = update_reservation_in_db(
            &f.pool,
            r.id,
            UpdateReservationPayload {
                room_id: Some(other.id),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap();
        assert_eq!(moved.room_id, other.id);
        let old_room = get_room_from_db(&f.pool, f.room.id).await.unwrap().unwrap();
        assert_eq!(old_room.occupancy, Occupancy::Vacant);
        let new_room = get_room_from_db(&f.pool, other.id).await.unwrap().unwrap();
        assert_eq!(new_room.occupancy, Occupancy::Reserved);

        // Pushed back to tomorrow, nothing is held today.
        update_reservation_in_db(
            &f.pool,
            r.id,
            UpdateReservationPayload {
                check_in_date: Some(r.check_in_date + Duration::days(1)),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap();
        let new_room = get_room_from_db(&f.pool, other.id).await.unwrap().unwrap();
        assert_eq!(new_room.occupancy, Occupancy::Vacant);
    }

    #[tokio::test]
    async fn front_desk_day_lists() {
        let f = fixture().await;
        let r = create_reservation_in_db(&f.pool, booking(f.room.id, 0, 1), f.clerk, now())
            .await
            .unwrap();
        let today = now().date_naive();
        assert_eq!(arrivals_from_db(&f.pool, today).await.unwrap().len(), 1);
        confirm_reservation_in_db(&f.pool, r.id, now()).await.unwrap();
        check_in_reservation_in_db(&f.pool, r.id, f.clerk, now()).await.unwrap();
        assert!(arrivals_from_db(&f.pool, today).await.unwrap().is_empty());
        let tomorrow = today + Duration::days(1);
        assert_eq!(departures_from_db(&f.pool, tomorrow).await.unwrap().len(), 1);
        assert!(current_reservation_for_room(&f.pool, f.room.id).await.unwrap().is_some());
    }
}
