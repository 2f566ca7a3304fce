// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::DomainError;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CleaningType {
    /// Full clean after a departure.
    Checkout,
    /// Light clean of an occupied room.
    StayOver,
    /// Stay-over clean with linen change.
    DeepCleaning,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CleaningStatus {
    Pending,
    InProgress,
    Completed,
    Verified,
}

impl CleaningStatus {
    pub const OPEN: [CleaningStatus; 2] = [CleaningStatus::Pending, CleaningStatus::InProgress];

    pub fn start(self) -> Result<Self, DomainError> {
        match self {
            CleaningStatus::Pending => Ok(CleaningStatus::InProgress),
            other => Err(DomainError::transition("cleaning task", other, "start")),
        }
    }

    pub fn complete(self) -> Result<Self, DomainError> {
        match self {
            CleaningStatus::InProgress => Ok(CleaningStatus::Completed),
            other => Err(DomainError::transition("cleaning task", other, "complete")),
        }
    }

    pub fn verify(self) -> Result<Self, DomainError> {
        match self {
            CleaningStatus::Completed => Ok(CleaningStatus::Verified),
            other => Err(DomainError::transition("cleaning task", other, "verify")),
        }
    }
}

impl fmt::Display for CleaningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleaningStatus::Pending => "pending",
            CleaningStatus::InProgress => "in_progress",
            CleaningStatus::Completed => "completed",
            CleaningStatus::Verified => "verified",
        };
        f.write_str(s)
    }
}

/// Highest cleaning priority; tasks generated by a check-out use it.
pub const TOP_CLEANING_PRIORITY: i64 = 1;
/// Priority of stay-over cleans generated by the daily rollover.
pub const STAY_OVER_PRIORITY: i64 = 3;

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct CleaningTask {
    pub id: i64,
    pub room_id: i64,
    pub assigned_to: Option<i64>,
    pub cleaning_type: CleaningType,
    pub status: CleaningStatus,
    /// 1 = high ... 5 = low
    pub priority: i64,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: String,
    pub photo_path: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub verified_by: Option<i64>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CleaningTask {
    pub fn is_open(&self) -> bool {
        CleaningStatus::OPEN.contains(&self.status)
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateCleaningTaskPayload {
    pub room_id: i64,
    pub assigned_to: Option<i64>,
    pub cleaning_type: Option<CleaningType>,
    #[validate(range(min = 1, max = 5, message = "Priority goes from 1 (high) to 5 (low)."))]
    pub priority: Option<i64>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default, Validate)]
pub struct UpdateCleaningTaskPayload {
    pub cleaning_type: Option<CleaningType>,
    #[validate(range(min = 1, max = 5, message = "Priority goes from 1 (high) to 5 (low)."))]
    pub priority: Option<i64>,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AssignPayload {
    pub employee_id: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct CompleteCleaningPayload {
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CleaningQuery {
    pub status: Option<CleaningStatus>,
    pub cleaning_type: Option<CleaningType>,
    pub assigned_to: Option<i64>,
    /// Tasks created on this day.
    pub date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl CleaningQuery {
    pub fn page_query(&self) -> crate::PageQuery {
        crate::PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CleaningStats {
    pub pending: i64,
    pub in_progress: i64,
    pub completed_today: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CleaningList {
    pub tasks: crate::Page<CleaningTask>,
    pub stats: CleaningStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_workflow() {
        let s = CleaningStatus::Pending.start().unwrap();
        assert_eq!(s, CleaningStatus::InProgress);
        let s = s.complete().unwrap();
        assert_eq!(s, CleaningStatus::Completed);
        assert_eq!(s.verify().unwrap(), CleaningStatus::Verified);
    }

    #[test]
    fn verification_requires_completion() {
        assert!(CleaningStatus::Pending.verify().is_err());
        assert!(CleaningStatus::InProgress.verify().is_err());
        assert!(CleaningStatus::Verified.complete().is_err());
        assert!(CleaningStatus::InProgress.start().is_err());
    }

    #[test]
    fn a_task_must_be_started_before_completion() {
        assert!(matches!(
            CleaningStatus::Pending.complete(),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(
            CleaningStatus::InProgress.complete(),
            Ok(CleaningStatus::Completed)
        );
    }
}
