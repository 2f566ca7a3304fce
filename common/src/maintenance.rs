// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DomainError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MaintenancePriority {
    /// Larger is more urgent.
    pub fn rank(&self) -> i64 {
        match self {
            MaintenancePriority::Low => 1,
            MaintenancePriority::Medium => 2,
            MaintenancePriority::High => 3,
            MaintenancePriority::Urgent => 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub const OPEN: [MaintenanceStatus; 3] = [
        MaintenanceStatus::Pending,
        MaintenanceStatus::Assigned,
        MaintenanceStatus::InProgress,
    ];

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// Re-assigning an already assigned request is allowed.
    pub fn assign(self) -> Result<Self, DomainError> {
        match self {
            MaintenanceStatus::Pending | MaintenanceStatus::Assigned => {
                Ok(MaintenanceStatus::Assigned)
            }
            other => Err(DomainError::transition("maintenance request", other, "assign")),
        }
    }

    pub fn start(self) -> Result<Self, DomainError> {
        match self {
            MaintenanceStatus::Assigned => Ok(MaintenanceStatus::InProgress),
            other => Err(DomainError::transition("maintenance request", other, "start")),
        }
    }

    pub fn complete(self) -> Result<Self, DomainError> {
        match self {
            MaintenanceStatus::InProgress => Ok(MaintenanceStatus::Completed),
            other => Err(DomainError::transition("maintenance request", other, "complete")),
        }
    }

    pub fn cancel(self) -> Result<Self, DomainError> {
        if self.is_open() {
            Ok(MaintenanceStatus::Cancelled)
        } else {
            Err(DomainError::transition("maintenance request", self, "cancel"))
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::Assigned => "assigned",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct MaintenanceTask {
    pub id: i64,
    pub room_id: i64,
    pub reported_by: Option<i64>,
    pub assigned_to: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub resolution: String,
    pub photo_path: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateMaintenancePayload {
    pub room_id: i64,
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters."))]
    pub title: String,
    #[validate(length(min = 1, message = "A description is required."))]
    pub description: String,
    pub priority: Option<MaintenancePriority>,
    /// Puts the room into `maintenance` until the request is completed.
    #[serde(default)]
    pub take_room_out_of_service: bool,
}

#[derive(Deserialize, Debug, Default, Validate)]
pub struct UpdateMaintenancePayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub priority: Option<MaintenancePriority>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct ResolvePayload {
    #[validate(length(min = 1, message = "Describe how the issue was resolved."))]
    pub resolution: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct MaintenanceQuery {
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<MaintenancePriority>,
    pub assigned_to: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl MaintenanceQuery {
    pub fn page_query(&self) -> crate::PageQuery {
        crate::PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct MaintenanceStats {
    pub pending: i64,
    pub in_progress: i64,
    pub urgent: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MaintenanceList {
    pub requests: crate::Page<MaintenanceTask>,
    pub stats: MaintenanceStats,
}
