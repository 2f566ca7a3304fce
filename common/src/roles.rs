// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Job role of an employee. Drives permissions, supervision and the dashboard.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EmployeeRole {
    Director,
    ReceptionManager,
    Receptionist,
    HousekeepingManager,
    RoomAttendant,
    MaintenanceManager,
    MaintenanceTechnician,
    HumanResources,
}

/// Which dashboard payload a role receives.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Director,
    Reception,
    HousekeepingManager,
    RoomAttendant,
    MaintenanceManager,
    MaintenanceTechnician,
    HumanResources,
}

impl EmployeeRole {
    pub const ALL: [EmployeeRole; 8] = [
        EmployeeRole::Director,
        EmployeeRole::ReceptionManager,
        EmployeeRole::Receptionist,
        EmployeeRole::HousekeepingManager,
        EmployeeRole::RoomAttendant,
        EmployeeRole::MaintenanceManager,
        EmployeeRole::MaintenanceTechnician,
        EmployeeRole::HumanResources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Director => "director",
            EmployeeRole::ReceptionManager => "reception_manager",
            EmployeeRole::Receptionist => "receptionist",
            EmployeeRole::HousekeepingManager => "housekeeping_manager",
            EmployeeRole::RoomAttendant => "room_attendant",
            EmployeeRole::MaintenanceManager => "maintenance_manager",
            EmployeeRole::MaintenanceTechnician => "maintenance_technician",
            EmployeeRole::HumanResources => "human_resources",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmployeeRole::Director => "Director",
            EmployeeRole::ReceptionManager => "Reception manager",
            EmployeeRole::Receptionist => "Receptionist",
            EmployeeRole::HousekeepingManager => "Housekeeping manager",
            EmployeeRole::RoomAttendant => "Room attendant",
            EmployeeRole::MaintenanceManager => "Maintenance manager",
            EmployeeRole::MaintenanceTechnician => "Maintenance technician",
            EmployeeRole::HumanResources => "Human resources",
        }
    }

    pub fn is_supervisor(&self) -> bool {
        matches!(
            self,
            EmployeeRole::Director
                | EmployeeRole::ReceptionManager
                | EmployeeRole::HousekeepingManager
                | EmployeeRole::MaintenanceManager
                | EmployeeRole::HumanResources
        )
    }

    /// Director and HR see every employee's records.
    pub fn sees_everyone(&self) -> bool {
        matches!(self, EmployeeRole::Director | EmployeeRole::HumanResources)
    }

    /// Roles whose records this role supervises. Empty for non-supervisors.
    pub fn supervised_roles(&self) -> &'static [EmployeeRole] {
        match self {
            EmployeeRole::Director | EmployeeRole::HumanResources => &Self::ALL,
            EmployeeRole::ReceptionManager => &[EmployeeRole::Receptionist],
            EmployeeRole::HousekeepingManager => &[EmployeeRole::RoomAttendant],
            EmployeeRole::MaintenanceManager => &[EmployeeRole::MaintenanceTechnician],
            _ => &[],
        }
    }

    pub fn supervises(&self, other: EmployeeRole) -> bool {
        self.supervised_roles().contains(&other)
    }

    pub fn manages_staff(&self) -> bool {
        self.sees_everyone()
    }

    pub fn manages_front_desk(&self) -> bool {
        matches!(
            self,
            EmployeeRole::Director | EmployeeRole::ReceptionManager | EmployeeRole::Receptionist
        )
    }

    pub fn manages_rooms(&self) -> bool {
        matches!(self, EmployeeRole::Director | EmployeeRole::ReceptionManager)
    }

    pub fn manages_housekeeping(&self) -> bool {
        matches!(self, EmployeeRole::Director | EmployeeRole::HousekeepingManager)
    }

    pub fn manages_maintenance(&self) -> bool {
        matches!(self, EmployeeRole::Director | EmployeeRole::MaintenanceManager)
    }

    /// May flip a room's cleanliness/occupancy flags directly.
    pub fn updates_room_status(&self) -> bool {
        self.manages_rooms() || self.manages_housekeeping() || self.manages_maintenance()
    }

    pub fn is_housekeeping_staff(&self) -> bool {
        matches!(
            self,
            EmployeeRole::HousekeepingManager | EmployeeRole::RoomAttendant
        )
    }

    pub fn is_maintenance_staff(&self) -> bool {
        matches!(
            self,
            EmployeeRole::MaintenanceManager | EmployeeRole::MaintenanceTechnician
        )
    }

    pub fn dashboard(&self) -> DashboardKind {
        match self {
            EmployeeRole::Director => DashboardKind::Director,
            EmployeeRole::ReceptionManager | EmployeeRole::Receptionist => DashboardKind::Reception,
            EmployeeRole::HousekeepingManager => DashboardKind::HousekeepingManager,
            EmployeeRole::RoomAttendant => DashboardKind::RoomAttendant,
            EmployeeRole::MaintenanceManager => DashboardKind::MaintenanceManager,
            EmployeeRole::MaintenanceTechnician => DashboardKind::MaintenanceTechnician,
            EmployeeRole::HumanResources => DashboardKind::HumanResources,
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Invalid employee role: {}", s))
    }
}
