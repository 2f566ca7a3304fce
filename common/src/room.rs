// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{CleaningTask, MaintenanceTask, Reservation};

/// Cleanliness / serviceability of a room.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RoomStatus {
    Clean,
    Dirty,
    Inspected,
    Maintenance,
    OutOfOrder,
}

impl RoomStatus {
    /// Rooms in these states cannot receive guests.
    pub fn is_out_of_service(&self) -> bool {
        matches!(self, RoomStatus::Maintenance | RoomStatus::OutOfOrder)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RoomStatus::Clean => "clean",
            RoomStatus::Dirty => "dirty",
            RoomStatus::Inspected => "inspected",
            RoomStatus::Maintenance => "maintenance",
            RoomStatus::OutOfOrder => "out_of_order",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Occupancy {
    Vacant,
    Occupied,
    Reserved,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RoomType {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// Maximum number of guests.
    pub capacity: i64,
    pub base_rate_cents: i64,
    pub description: String,
    pub amenities: String,
    pub is_active: bool,
}

/// A room type with the number of rooms using it.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct RoomTypeWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub room_type: RoomType,
    pub room_count: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: i64,
    pub number: String,
    pub floor: i64,
    pub room_type_id: i64,
    pub status: RoomStatus,
    pub occupancy: Occupancy,
    pub last_cleaned: Option<DateTime<Utc>>,
    pub last_inspected: Option<DateTime<Utc>>,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct RoomTypePayload {
    #[validate(length(min = 1, max = 10, message = "Code must be 1 to 10 characters."))]
    pub code: String,
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    #[validate(range(min = 1, max = 10, message = "Capacity must be between 1 and 10."))]
    pub capacity: i64,
    #[validate(range(min = 0))]
    pub base_rate_cents: i64,
    pub description: Option<String>,
    pub amenities: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateRoomPayload {
    #[validate(length(min = 1, max = 10, message = "Room number must be 1 to 10 characters."))]
    pub number: String,
    #[validate(range(min = 0, max = 50))]
    pub floor: i64,
    pub room_type_id: i64,
    pub status: Option<RoomStatus>,
    pub occupancy: Option<Occupancy>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default, Validate)]
pub struct UpdateRoomPayload {
    #[validate(length(min = 1, max = 10))]
    pub number: Option<String>,
    #[validate(range(min = 0, max = 50))]
    pub floor: Option<i64>,
    pub room_type_id: Option<i64>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RoomStatusPayload {
    pub status: Option<RoomStatus>,
    pub occupancy: Option<Occupancy>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RoomQuery {
    pub floor: Option<i64>,
    pub status: Option<RoomStatus>,
    pub occupancy: Option<Occupancy>,
    pub room_type_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: Room,
    pub room_type: RoomType,
    pub current_reservation: Option<Reservation>,
    pub next_reservation: Option<Reservation>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RoomStats {
    pub total: i64,
    pub vacant: i64,
    pub occupied: i64,
    pub reserved: i64,
    pub clean: i64,
    pub dirty: i64,
    pub inspected: i64,
    pub maintenance: i64,
    pub out_of_order: i64,
    pub occupancy_rate: f64,
    pub clean_rate: f64,
}

impl RoomStats {
    pub fn from_rooms(rooms: &[Room]) -> Self {
        let count_status = |s: RoomStatus| rooms.iter().filter(|r| r.status == s).count() as i64;
        let count_occupancy =
            |o: Occupancy| rooms.iter().filter(|r| r.occupancy == o).count() as i64;

        let total = rooms.len() as i64;
        let occupied = count_occupancy(Occupancy::Occupied);
        let clean = count_status(RoomStatus::Clean);
        RoomStats {
            total,
            vacant: count_occupancy(Occupancy::Vacant),
            occupied,
            reserved: count_occupancy(Occupancy::Reserved),
            clean,
            dirty: count_status(RoomStatus::Dirty),
            inspected: count_status(RoomStatus::Inspected),
            maintenance: count_status(RoomStatus::Maintenance),
            out_of_order: count_status(RoomStatus::OutOfOrder),
            occupancy_rate: crate::percentage(occupied, total),
            clean_rate: crate::percentage(clean, total),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Floor {
    pub floor: i64,
    pub rooms: Vec<Room>,
}

/// Rooms grouped by floor, highest floor first, rooms ordered by number.
pub fn group_by_floor(mut rooms: Vec<Room>) -> Vec<Floor> {
    rooms.sort_by(|a, b| b.floor.cmp(&a.floor).then_with(|| a.number.cmp(&b.number)));
    let mut floors: Vec<Floor> = Vec::new();
    for room in rooms {
        match floors.last_mut() {
            Some(floor) if floor.floor == room.floor => floor.rooms.push(room),
            _ => floors.push(Floor {
                floor: room.floor,
                rooms: vec![room],
            }),
        }
    }
    floors
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RoomBoard {
    pub floors: Vec<Floor>,
    pub stats: RoomStats,
    pub pending_cleaning: Vec<CleaningTask>,
    pub pending_maintenance: Vec<MaintenanceTask>,
}
