// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use hotel_common::{
    group_by_floor, AvailabilityQuery, CreateRoomPayload, Room, RoomBoard, RoomDetail, RoomQuery, RoomStats,
    RoomStatusPayload, RoomType, RoomTypePayload, RoomTypeWithCount, UpdateRoomPayload,
};
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{debug, info};
use validator::Validate;

use super::{message, AppError};
use crate::auth::CurrentUser;
use crate::database::{cleaning, maintenance, reservations, rooms};

/// Number of pending cleaning and maintenance items shown on the board.
const BOARD_QUEUE_LEN: i64 = 10;

// --- Room types ---

pub async fn list_room_types(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
) -> Result<Json<Vec<RoomTypeWithCount>>, AppError> {
    Ok(Json(rooms::list_room_types_from_db(&pool).await?))
}

pub async fn get_room_type(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RoomType>, AppError> {
    rooms::get_room_type_from_db(&pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Room type with ID {} not found.", id)))
}

pub async fn create_room_type(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<RoomTypePayload>,
) -> Result<(StatusCode, Json<RoomType>), AppError> {
    user.require(user.role().manages_rooms())?;
    payload.validate()?;
    let room_type = rooms::create_room_type_in_db(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(room_type)))
}

pub async fn update_room_type(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoomTypePayload>,
) -> Result<Json<RoomType>, AppError> {
    user.require(user.role().manages_rooms())?;
    payload.validate()?;
    rooms::update_room_type_in_db(&pool, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Room type with ID {} not found.", id)))
}

pub async fn delete_room_type(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_rooms())?;
    if rooms::delete_room_type_in_db(&pool, id).await? {
        info!("Room type {} deleted.", id);
        Ok(message(format!("Room type {} deleted.", id)))
    } else {
        Err(AppError::not_found(&format!("Room type with ID {} not found.", id)))
    }
}

// --- Rooms ---

pub async fn list_rooms(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Query(query): Query<RoomQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    debug!("Listing rooms with filters {:?}", query);
    Ok(Json(rooms::list_rooms_from_db(&pool, &query).await?))
}

/// A room with its type, the guest in house and the next confirmed arrival.
pub async fn get_room(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<RoomDetail>, AppError> {
    let room = rooms::get_room_from_db(&pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Room with ID {} not found.", id)))?;
    let room_type = rooms::get_room_type_from_db(&pool, room.room_type_id)
        .await?
        .ok_or_else(|| AppError::not_found(&format!("Room type with ID {} not found.", room.room_type_id)))?;
    let current_reservation = reservations::current_reservation_for_room(&pool, id).await?;
    let next_reservation = reservations::next_reservation_for_room(&pool, id, Utc::now().date_naive()).await?;

    Ok(Json(RoomDetail {
        room,
        room_type,
        current_reservation,
        next_reservation,
    }))
}

pub async fn create_room(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Json(payload): Json<CreateRoomPayload>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    user.require(user.role().manages_rooms())?;
    payload.validate()?;
    let room = rooms::create_room_in_db(&pool, payload).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update_room(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateRoomPayload>,
) -> Result<Json<Room>, AppError> {
    user.require(user.role().manages_rooms())?;
    payload.validate()?;
    rooms::update_room_in_db(&pool, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(&format!("Room with ID {} not found.", id)))
}

pub async fn delete_room(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    user.require(user.role().manages_rooms())?;
    if rooms::deactivate_room_in_db(&pool, id).await? {
        info!("Room {} deactivated by {}.", id, user.employee.username);
        Ok(message(format!("Room {} deactivated.", id)))
    } else {
        Err(AppError::not_found(&format!("Room with ID {} not found.", id)))
    }
}

/// Handler for flipping a room's status and/or occupancy by hand.
pub async fn update_room_status(
    State(pool): State<SqlitePool>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<RoomStatusPayload>,
) -> Result<Json<Room>, AppError> {
    user.require(user.role().updates_room_status())?;
    if payload.status.is_none() && payload.occupancy.is_none() {
        return Err(AppError::bad_request("Provide a status, an occupancy or both."));
    }
    let room = rooms::update_room_status_in_db(&pool, id, payload.status, payload.occupancy).await?;
    info!(
        "Room {} set to {} / {:?} by {}.",
        room.number, room.status, room.occupancy, user.employee.username
    );
    Ok(Json(room))
}

pub async fn room_board(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
) -> Result<Json<RoomBoard>, AppError> {
    let all = rooms::list_rooms_from_db(&pool, &RoomQuery::default()).await?;
    let stats = RoomStats::from_rooms(&all);
    Ok(Json(RoomBoard {
        floors: group_by_floor(all),
        stats,
        pending_cleaning: cleaning::open_cleaning_tasks_from_db(&pool, BOARD_QUEUE_LEN).await?,
        pending_maintenance: maintenance::open_maintenance_from_db(&pool, BOARD_QUEUE_LEN).await?,
    }))
}

pub async fn room_availability(
    State(pool): State<SqlitePool>,
    _user: CurrentUser,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<Room>>, AppError> {
    let guests = query.guests.unwrap_or(1);
    let available = rooms::available_rooms_from_db(&pool, query.check_in, query.check_out, guests).await?;
    debug!(
        "{} room(s) free from {} to {} for {} guest(s)",
        available.len(),
        query.check_in,
        query.check_out,
        guests
    );
    Ok(Json(available))
}
