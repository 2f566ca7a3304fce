// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{DomainError, PageQuery};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeaveType {
    Vacation,
    Sick,
    Personal,
    Unpaid,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
            LeaveStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A leave (vacation, sick day...) request.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Leave {
    pub id: i64,
    pub employee_id: i64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub approved_by: Option<i64>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: String,
    pub attachment_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Leave {
    /// Both ends inclusive.
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Days of this leave falling inside `year`.
    pub fn days_in_year(&self, year: i32) -> i64 {
        let (Some(jan1), Some(dec31)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return 0;
        };
        let start = self.start_date.max(jan1);
        let end = self.end_date.min(dec31);
        if end < start {
            0
        } else {
            (end - start).num_days() + 1
        }
    }

    /// Approve or reject a pending request.
    pub fn decide(&self, decision: LeaveStatus) -> Result<LeaveStatus, DomainError> {
        if !matches!(decision, LeaveStatus::Approved | LeaveStatus::Rejected) {
            return Err(DomainError::validation(
                "A decision must be either approved or rejected.",
            ));
        }
        if self.status != LeaveStatus::Pending {
            return Err(DomainError::transition("leave", self.status, "decide"));
        }
        Ok(decision)
    }

    pub fn cancel(&self) -> Result<LeaveStatus, DomainError> {
        if self.status != LeaveStatus::Pending {
            return Err(DomainError::transition("leave", self.status, "cancel"));
        }
        Ok(LeaveStatus::Cancelled)
    }

    /// Only pending requests may be edited by their owner.
    pub fn ensure_editable(&self) -> Result<(), DomainError> {
        if self.status != LeaveStatus::Pending {
            return Err(DomainError::transition("leave", self.status, "edit"));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct LeaveRequestPayload {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, message = "A reason is required."))]
    pub reason: String,
}

impl LeaveRequestPayload {
    /// Date rules that depend on the current day.
    pub fn check_dates(&self, today: NaiveDate) -> Result<(), DomainError> {
        if self.end_date < self.start_date {
            return Err(DomainError::validation(
                "The end date cannot be before the start date.",
            ));
        }
        if self.start_date < today {
            return Err(DomainError::validation(
                "Leave cannot be requested for past dates.",
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
pub struct LeaveDecisionPayload {
    pub status: LeaveStatus,
    pub rejection_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct LeaveManagementQuery {
    pub status: Option<LeaveStatus>,
    pub leave_type: Option<LeaveType>,
    /// Matches first or last name.
    pub employee: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl LeaveManagementQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LeaveSummary {
    pub allowance_days: i64,
    pub used_days: i64,
    pub remaining_days: i64,
    pub pending_count: i64,
    pub approved_count: i64,
}

/// Vacation allowance usage for `year` from one employee's requests.
pub fn leave_summary(leaves: &[Leave], year: i32, allowance_days: i64) -> LeaveSummary {
    let used_days: i64 = leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Approved && l.leave_type == LeaveType::Vacation)
        .map(|l| l.days_in_year(year))
        .sum();
    LeaveSummary {
        allowance_days,
        used_days,
        remaining_days: (allowance_days - used_days).max(0),
        pending_count: leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Pending)
            .count() as i64,
        approved_count: leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Approved)
            .count() as i64,
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MyLeaves {
    pub leaves: crate::Page<Leave>,
    pub summary: LeaveSummary,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LeaveCounts {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
    pub month_total: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LeaveManagement {
    pub leaves: crate::Page<Leave>,
    pub counts: LeaveCounts,
}
