// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use hotel_common::{
    CreateRoomPayload, DomainError, Occupancy, Room, RoomQuery, RoomStatus, RoomType, RoomTypePayload,
    RoomTypeWithCount, UpdateRoomPayload,
};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

// --- Room types ---

/// Room types with the number of active rooms using each.
pub async fn list_room_types_from_db(pool: &SqlitePool) -> Result<Vec<RoomTypeWithCount>> {
    sqlx::query_as::<_, RoomTypeWithCount>(
        "SELECT t.*, (SELECT COUNT(*) FROM rooms r WHERE r.room_type_id = t.id AND r.is_active = 1) AS room_count FROM room_types t ORDER BY t.name ASC",
    )
    .fetch_all(pool)
    .await
    .context("Failed to retrieve room types from DB")
}

pub async fn get_room_type_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<RoomType>> {
    sqlx::query_as::<_, RoomType>("SELECT * FROM room_types WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve room type with ID: {}", id))
}

pub async fn create_room_type_in_db(pool: &SqlitePool, payload: RoomTypePayload) -> Result<RoomType> {
    let code = payload.code.trim().to_uppercase();
    let id = sqlx::query(
        "INSERT INTO room_types (code, name, capacity, base_rate_cents, description, amenities, is_active) VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&code)
    .bind(payload.name.trim())
    .bind(payload.capacity)
    .bind(payload.base_rate_cents)
    .bind(payload.description.as_deref().unwrap_or_default())
    .bind(payload.amenities.as_deref().unwrap_or_default())
    .bind(payload.is_active.unwrap_or(true))
    .execute(pool)
    .await
    .context("Failed to insert room type into DB")?
    .last_insert_rowid();

    info!("Room type {} created with ID: {}", code, id);
    get_room_type_from_db(pool, id)
        .await?
        .context("Inserted room type disappeared")
}

pub async fn update_room_type_in_db(pool: &SqlitePool, id: i64, payload: RoomTypePayload) -> Result<Option<RoomType>> {
    let result = sqlx::query(
        "UPDATE room_types SET code = ?, name = ?, capacity = ?, base_rate_cents = ?, description = ?, amenities = ?, is_active = ? WHERE id = ?",
    )
    .bind(payload.code.trim().to_uppercase())
    .bind(payload.name.trim())
    .bind(payload.capacity)
    .bind(payload.base_rate_cents)
    .bind(payload.description.as_deref().unwrap_or_default())
    .bind(payload.amenities.as_deref().unwrap_or_default())
    .bind(payload.is_active.unwrap_or(true))
    .bind(id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update room type with ID: {}", id))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_room_type_from_db(pool, id).await
}

/// Refused while any room, active or not, still uses the type.
pub async fn delete_room_type_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms WHERE room_type_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .context("Failed to count rooms of type")?;
    if in_use > 0 {
        return Err(DomainError::conflict(format!(
            "This room type is used by {} room(s) and cannot be deleted.",
            in_use
        ))
        .into());
    }

    let result = sqlx::query("DELETE FROM room_types WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete room type with ID: {}", id))?;
    Ok(result.rows_affected() > 0)
}

// --- Rooms ---

pub async fn get_room_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Room>> {
    sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve room with ID: {}", id))
}

pub(crate) async fn require_room(conn: &mut SqliteConnection, id: i64) -> Result<Room> {
    get_room_from_db(&mut *conn, id)
        .await?
        .ok_or_else(|| DomainError::not_found("Room", id).into())
}

/// Active rooms matching the filters, by floor then number.
pub async fn list_rooms_from_db(pool: &SqlitePool, query: &RoomQuery) -> Result<Vec<Room>> {
    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM rooms WHERE is_active = 1");
    if let Some(floor) = query.floor {
        select.push(" AND floor = ").push_bind(floor);
    }
    if let Some(status) = query.status {
        select.push(" AND status = ").push_bind(status);
    }
    if let Some(occupancy) = query.occupancy {
        select.push(" AND occupancy = ").push_bind(occupancy);
    }
    if let Some(room_type_id) = query.room_type_id {
        select.push(" AND room_type_id = ").push_bind(room_type_id);
    }
    select.push(" ORDER BY floor ASC, number ASC");
    select
        .build_query_as::<Room>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve rooms from DB")
}

async fn ensure_room_type_exists(pool: &SqlitePool, room_type_id: i64) -> Result<()> {
    match get_room_type_from_db(pool, room_type_id).await? {
        Some(_) => Ok(()),
        None => Err(DomainError::validation(format!("Room type {} does not exist.", room_type_id)).into()),
    }
}

/// New rooms start dirty and vacant unless told otherwise.
pub async fn create_room_in_db(pool: &SqlitePool, payload: CreateRoomPayload) -> Result<Room> {
    ensure_room_type_exists(pool, payload.room_type_id).await?;
    let now = Utc::now();
    let number = payload.number.trim().to_string();
    debug!("Insert values: number={}, floor={}", number, payload.floor);

    let id = sqlx::query(
        "INSERT INTO rooms (number, floor, room_type_id, status, occupancy, notes, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&number)
    .bind(payload.floor)
    .bind(payload.room_type_id)
    .bind(payload.status.unwrap_or(RoomStatus::Dirty))
    .bind(payload.occupancy.unwrap_or(Occupancy::Vacant))
    .bind(payload.notes.as_deref().unwrap_or_default())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert room into DB")?
    .last_insert_rowid();

    info!("Room {} created with ID: {}", number, id);
    get_room_from_db(pool, id).await?.context("Inserted room disappeared")
}

pub async fn update_room_in_db(pool: &SqlitePool, id: i64, payload: UpdateRoomPayload) -> Result<Option<Room>> {
    let Some(mut room) = get_room_from_db(pool, id).await? else {
        return Ok(None);
    };
    if let Some(room_type_id) = payload.room_type_id {
        ensure_room_type_exists(pool, room_type_id).await?;
        room.room_type_id = room_type_id;
    }
    if let Some(number) = payload.number {
        room.number = number.trim().to_string();
    }
    if let Some(floor) = payload.floor {
        room.floor = floor;
    }
    if let Some(notes) = payload.notes {
        room.notes = notes;
    }
    if let Some(is_active) = payload.is_active {
        room.is_active = is_active;
    }
    room.updated_at = Utc::now();

    sqlx::query("UPDATE rooms SET number = ?, floor = ?, room_type_id = ?, notes = ?, is_active = ?, updated_at = ? WHERE id = ?")
        .bind(&room.number)
        .bind(room.floor)
        .bind(room.room_type_id)
        .bind(&room.notes)
        .bind(room.is_active)
        .bind(room.updated_at)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update room with ID: {}", id))?;
    Ok(Some(room))
}

/// Soft delete. Returns false if no active room has this ID.
pub async fn deactivate_room_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE rooms SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to deactivate room with ID: {}", id))?;
    Ok(result.rows_affected() > 0)
}

/// Sets status and/or occupancy. A room becoming clean or inspected gets
/// the matching timestamp.
pub async fn set_room_state_in_db(
    conn: &mut SqliteConnection,
    id: i64,
    status: Option<RoomStatus>,
    occupancy: Option<Occupancy>,
    now: DateTime<Utc>,
) -> Result<Room> {
    let mut room = require_room(conn, id).await?;
    if let Some(status) = status {
        room.status = status;
        match status {
            RoomStatus::Clean => room.last_cleaned = Some(now),
            RoomStatus::Inspected => room.last_inspected = Some(now),
            _ => {}
        }
    }
    if let Some(occupancy) = occupancy {
        room.occupancy = occupancy;
    }
    room.updated_at = now;

    sqlx::query("UPDATE rooms SET status = ?, occupancy = ?, last_cleaned = ?, last_inspected = ?, updated_at = ? WHERE id = ?")
        .bind(room.status)
        .bind(room.occupancy)
        .bind(room.last_cleaned)
        .bind(room.last_inspected)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update state of room {}", id))?;

    debug!("Room {} is now {} / {:?}", room.number, room.status, room.occupancy);
    Ok(room)
}

pub async fn update_room_status_in_db(
    pool: &SqlitePool,
    id: i64,
    status: Option<RoomStatus>,
    occupancy: Option<Occupancy>,
) -> Result<Room> {
    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;
    set_room_state_in_db(&mut conn, id, status, occupancy, Utc::now()).await
}

/// Active rooms of a type fitting `guests`, not out of order, and free of
/// confirmed or checked-in stays overlapping `[check_in, check_out)`.
pub async fn available_rooms_from_db(
    pool: &SqlitePool,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i64,
) -> Result<Vec<Room>> {
    if check_out <= check_in {
        return Err(DomainError::validation("The check-out date must be after the check-in date.").into());
    }
    sqlx::query_as::<_, Room>(
        r#"
        SELECT r.* FROM rooms r
        JOIN room_types t ON t.id = r.room_type_id
        WHERE r.is_active = 1
          AND t.is_active = 1
          AND t.capacity >= ?
          AND r.status != 'out_of_order'
          AND NOT EXISTS (
              SELECT 1 FROM reservations x
              WHERE x.room_id = r.id
                AND x.status IN ('confirmed', 'checked_in')
                AND x.check_in_date < ?
                AND x.check_out_date > ?
          )
        ORDER BY r.floor ASC, r.number ASC
        "#,
    )
    .bind(guests.max(1))
    .bind(check_out)
    .bind(check_in)
    .fetch_all(pool)
    .await
    .context("Failed to search available rooms")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::database::memory_pool;

    pub(crate) async fn insert_room_type(pool: &SqlitePool, code: &str, capacity: i64) -> RoomType {
        create_room_type_in_db(
            pool,
            RoomTypePayload {
                code: code.to_string(),
                name: format!("{} room", code),
                capacity,
                base_rate_cents: 10_000,
                description: None,
                amenities: Some("wifi".to_string()),
                is_active: None,
            },
        )
        .await
        .unwrap()
    }

    pub(crate) async fn insert_room(pool: &SqlitePool, number: &str, floor: i64, room_type_id: i64) -> Room {
        create_room_in_db(
            pool,
            CreateRoomPayload {
                number: number.to_string(),
                floor,
                room_type_id,
                status: None,
                occupancy: None,
                notes: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn new_rooms_start_dirty_and_vacant() {
        let pool = memory_pool().await.unwrap();
        let double = insert_room_type(&pool, "dbl", 2).await;
        assert_eq!(double.code, "DBL");
        let room = insert_room(&pool, "101", 1, double.id).await;
        assert_eq!(room.status, RoomStatus::Dirty);
        assert_eq!(room.occupancy, Occupancy::Vacant);

        let types = list_room_types_from_db(&pool).await.unwrap();
        assert_eq!(types[0].room_count, 1);
    }

    #[tokio::test]
    async fn room_type_in_use_cannot_be_deleted() {
        let pool = memory_pool().await.unwrap();
        let double = insert_room_type(&pool, "DBL", 2).await;
        let single = insert_room_type(&pool, "SGL", 1).await;
        insert_room(&pool, "101", 1, double.id).await;

        let err = delete_room_type_in_db(&pool, double.id).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Conflict(_))));
        assert!(delete_room_type_in_db(&pool, single.id).await.unwrap());
        assert!(!delete_room_type_in_db(&pool, single.id).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_room_type_is_a_validation_error() {
        let pool = memory_pool().await.unwrap();
        let err = create_room_in_db(
            &pool,
            CreateRoomPayload {
                number: "101".to_string(),
                floor: 1,
                room_type_id: 42,
                status: None,
                occupancy: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn status_changes_stamp_cleaning_times() {
        let pool = memory_pool().await.unwrap();
        let double = insert_room_type(&pool, "DBL", 2).await;
        let room = insert_room(&pool, "101", 1, double.id).await;

        let clean = update_room_status_in_db(&pool, room.id, Some(RoomStatus::Clean), None).await.unwrap();
        assert!(clean.last_cleaned.is_some());
        assert!(clean.last_inspected.is_none());

        let occupied = update_room_status_in_db(&pool, room.id, None, Some(Occupancy::Occupied)).await.unwrap();
        assert_eq!(occupied.status, RoomStatus::Clean);
        assert_eq!(occupied.occupancy, Occupancy::Occupied);
    }

    #[tokio::test]
    async fn availability_respects_capacity_and_service_state() {
        let pool = memory_pool().await.unwrap();
        let single = insert_room_type(&pool, "SGL", 1).await;
        let double = insert_room_type(&pool, "DBL", 2).await;
        insert_room(&pool, "101", 1, single.id).await;
        let broken = insert_room(&pool, "102", 1, double.id).await;
        insert_room(&pool, "201", 2, double.id).await;
        update_room_status_in_db(&pool, broken.id, Some(RoomStatus::OutOfOrder), None)
            .await
            .unwrap();

        let ci = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let co = NaiveDate::from_ymd_opt(2025, 7, 3).unwrap();
        let rooms = available_rooms_from_db(&pool, ci, co, 2).await.unwrap();
        let numbers: Vec<_> = rooms.iter().map(|r| r.number.as_str()).collect();
        assert_eq!(numbers, vec!["201"]);

        assert_eq!(available_rooms_from_db(&pool, ci, co, 1).await.unwrap().len(), 2);
        assert!(available_rooms_from_db(&pool, co, ci, 1).await.is_err());
    }

    #[tokio::test]
    async fn listing_filters_by_floor() {
        let pool = memory_pool().await.unwrap();
        let double = insert_room_type(&pool, "DBL", 2).await;
        insert_room(&pool, "101", 1, double.id).await;
        insert_room(&pool, "201", 2, double.id).await;
        let second = RoomQuery {
            floor: Some(2),
            ..Default::default()
        };
        let rooms = list_rooms_from_db(&pool, &second).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].number, "201");
    }
}
