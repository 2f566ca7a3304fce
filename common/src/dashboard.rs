// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use serde::{Deserialize, Serialize};

use crate::{
    AttendanceView, CleaningStats, CleaningTask, DayAttendanceStats, Department, Employee,
    MaintenanceStats, MaintenanceTask, MonthlySummary, ReservationView, RoomStats,
};

/// Role-specific landing data. The `kind` tag names the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dashboard {
    Director(DirectorDashboard),
    Reception(ReceptionDashboard),
    HousekeepingManager(HousekeepingDashboard),
    RoomAttendant(AttendantDashboard),
    MaintenanceManager(MaintenanceDashboard),
    MaintenanceTechnician(TechnicianDashboard),
    HumanResources(HrDashboard),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DirectorDashboard {
    pub rooms: RoomStats,
    pub attendance: DayAttendanceStats,
    pub pending_leaves: i64,
    pub open_cleaning: i64,
    pub open_maintenance: i64,
    pub arrivals_today: i64,
    pub departures_today: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReceptionDashboard {
    pub rooms: RoomStats,
    pub arrivals_today: Vec<ReservationView>,
    pub departures_today: Vec<ReservationView>,
    pub in_house: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HousekeepingDashboard {
    pub stats: CleaningStats,
    pub unassigned: i64,
    pub dirty_rooms: i64,
    pub team_size: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendantDashboard {
    pub tasks: Vec<CleaningTask>,
    pub pending: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MaintenanceDashboard {
    pub stats: MaintenanceStats,
    pub unassigned: i64,
    pub urgent_open: Vec<MaintenanceTask>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TechnicianDashboard {
    pub requests: Vec<MaintenanceTask>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HrDashboard {
    pub headcount: i64,
    pub attendance: DayAttendanceStats,
    pub pending_leaves: i64,
}

/// Work assigned to one employee, counted for the current month.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AssignedWork {
    pub total_month: i64,
    pub completed_month: i64,
    pub pending: i64,
    pub in_progress: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TeamStats {
    pub size: i64,
    pub present_today: i64,
    pub pending_leaves: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RoleStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<AssignedWork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance: Option<AssignedWork>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<TeamStats>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProfileView {
    pub employee: Employee,
    pub department: Option<Department>,
    pub current_attendance: Option<AttendanceView>,
    pub is_checked_in: bool,
    pub monthly: MonthlySummary,
    pub pending_leaves: i64,
    pub role_stats: RoleStats,
}

/// Result of one daily rollover run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RolloverReport {
    pub no_shows: u64,
    pub rooms_reserved: u64,
    pub stay_over_tasks: u64,
}
