// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainError, PageQuery};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    HalfDay,
}

/// One clock-in/clock-out pair. `check_out` stays empty while the shift is open.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub employee_id: i64,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub notes: String,
    pub check_in_location: String,
    pub check_out_location: String,
    pub created_at: DateTime<Utc>,
}

impl Attendance {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Length of the shift; an open shift is measured up to `now`.
    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        self.check_out.unwrap_or(now) - self.check_in
    }

    pub fn worked_minutes(&self, now: DateTime<Utc>) -> i64 {
        self.duration(now).num_minutes().max(0)
    }

    /// Only closed shifts count as overtime.
    pub fn is_overtime(&self, standard_hours: i64) -> bool {
        match self.check_out {
            Some(check_out) => check_out - self.check_in > Duration::hours(standard_hours),
            None => false,
        }
    }

    pub fn view(self, now: DateTime<Utc>, standard_hours: i64) -> AttendanceView {
        let minutes = self.worked_minutes(now);
        AttendanceView {
            duration_minutes: minutes,
            duration_display: format_minutes(minutes),
            overtime: self.is_overtime(standard_hours),
            attendance: self,
        }
    }
}

/// An attendance record with its derived duration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendanceView {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub duration_minutes: i64,
    pub duration_display: String,
    pub overtime: bool,
}

/// `125` -> `"2h 5m"`.
pub fn format_minutes(minutes: i64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Clocking in at or after `late_after_hour` (UTC) counts as late.
pub fn status_for_check_in(at: DateTime<Utc>, late_after_hour: u32) -> AttendanceStatus {
    if at.hour() >= late_after_hour {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    }
}

/// First day of the month and first day of the following month.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), DomainError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::validation(format!("Invalid month: {}-{}", year, month)))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| DomainError::validation(format!("Invalid month: {}-{}", year, month)))?;
    Ok((first, next))
}

/// Attendance aggregated over one calendar month for one employee.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub days_worked: i64,
    pub total_minutes: i64,
    pub average_minutes: i64,
    pub total_display: String,
    pub average_display: String,
    pub late_arrivals: i64,
    pub overtime_shifts: i64,
}

/// Aggregates the closed shifts of `records` that started in `year`/`month`.
pub fn summarize_month(
    records: &[Attendance],
    year: i32,
    month: u32,
    standard_hours: i64,
) -> MonthlySummary {
    let closed: Vec<&Attendance> = records
        .iter()
        .filter(|a| !a.is_open())
        .filter(|a| a.check_in.year() == year && a.check_in.month() == month)
        .collect();

    let days: BTreeSet<NaiveDate> = closed.iter().map(|a| a.check_in.date_naive()).collect();
    let days_worked = days.len() as i64;
    let total_minutes: i64 = closed.iter().map(|a| a.worked_minutes(a.check_in)).sum();
    let average_minutes = if days_worked > 0 {
        total_minutes / days_worked
    } else {
        0
    };

    MonthlySummary {
        year,
        month,
        days_worked,
        total_minutes,
        average_minutes,
        total_display: format_minutes(total_minutes),
        average_display: format_minutes(average_minutes),
        late_arrivals: closed
            .iter()
            .filter(|a| a.status == AttendanceStatus::Late)
            .count() as i64,
        overtime_shifts: closed
            .iter()
            .filter(|a| a.is_overtime(standard_hours))
            .count() as i64,
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CheckInPayload {
    pub notes: Option<String>,
    pub location: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CheckOutPayload {
    pub location: Option<String>,
}

/// Supervisor correction of an attendance record.
#[derive(Deserialize, Debug, Default)]
pub struct AttendanceCorrectionPayload {
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
    pub check_out: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct AttendanceHistoryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AttendanceHistoryQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct MonthQuery {
    pub employee_id: Option<i64>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Today's state of the calling employee.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MyAttendance {
    pub today: Option<AttendanceView>,
    pub is_checked_in: bool,
    pub worked_minutes_today: i64,
    pub recent: Vec<AttendanceView>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendanceHistory {
    pub records: crate::Page<AttendanceView>,
    pub summary: MonthlySummary,
}

/// Head-count style statistics for one day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DayAttendanceStats {
    pub date: NaiveDate,
    pub active_employees: i64,
    /// Clocked in, on time or late.
    pub present: i64,
    pub late: i64,
    pub absent: i64,
    pub on_leave: i64,
    pub present_percentage: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub present: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AttendanceOverview {
    pub today: DayAttendanceStats,
    pub records: Vec<AttendanceView>,
    pub last_seven_days: Vec<DailyCount>,
    pub month_worked_days: i64,
    pub month_late_arrivals: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn shift(day: u32, from: (u32, u32), to: Option<(u32, u32)>, status: AttendanceStatus) -> Attendance {
        let check_in = Utc.with_ymd_and_hms(2025, 3, day, from.0, from.1, 0).unwrap();
        Attendance {
            id: i64::from(day),
            employee_id: 1,
            check_in,
            check_out: to.map(|(h, m)| Utc.with_ymd_and_hms(2025, 3, day, h, m, 0).unwrap()),
            status,
            notes: String::new(),
            check_in_location: String::new(),
            check_out_location: String::new(),
            created_at: check_in,
        }
    }

    #[test]
    fn late_from_the_configured_hour() {
        let early = Utc.with_ymd_and_hms(2025, 3, 3, 8, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap();
        assert_eq!(status_for_check_in(early, 9), AttendanceStatus::Present);
        assert_eq!(status_for_check_in(late, 9), AttendanceStatus::Late);
    }

    #[test]
    fn open_shift_is_measured_until_now() {
        let open = shift(3, (8, 0), None, AttendanceStatus::Present);
        let now = Utc.with_ymd_and_hms(2025, 3, 3, 10, 30, 0).unwrap();
        assert_eq!(open.worked_minutes(now), 150);
        assert!(!open.is_overtime(8));
        assert_eq!(open.view(now, 8).duration_display, "2h 30m");
    }

    #[test]
    fn overtime_above_standard_hours() {
        let long = shift(3, (7, 0), Some((15, 1)), AttendanceStatus::Present);
        let exact = shift(4, (7, 0), Some((15, 0)), AttendanceStatus::Present);
        assert!(long.is_overtime(8));
        assert!(!exact.is_overtime(8));
    }

    #[test]
    fn monthly_summary_counts_closed_shifts_only() {
        let records = vec![
            shift(3, (8, 0), Some((16, 0)), AttendanceStatus::Present),
            shift(4, (9, 30), Some((18, 30)), AttendanceStatus::Late),
            shift(5, (8, 0), None, AttendanceStatus::Present),
        ];
        let summary = summarize_month(&records, 2025, 3, 8);
        assert_eq!(summary.days_worked, 2);
        assert_eq!(summary.total_minutes, 17 * 60);
        assert_eq!(summary.average_minutes, 510);
        assert_eq!(summary.average_display, "8h 30m");
        assert_eq!(summary.late_arrivals, 1);
        assert_eq!(summary.overtime_shifts, 1);

        let other_month = summarize_month(&records, 2025, 4, 8);
        assert_eq!(other_month.days_worked, 0);
        assert_eq!(other_month.average_minutes, 0);
    }

    #[test]
    fn month_bounds_wrap_the_year() {
        let (first, next) = month_bounds(2025, 12).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(month_bounds(2025, 13).is_err());
    }

    #[test]
    fn view_flattens_the_record() {
        let record = shift(3, (8, 0), Some((9, 5)), AttendanceStatus::Present);
        let json = serde_json::to_value(record.view(Utc::now(), 8)).unwrap();
        assert_eq!(json["status"], "present");
        assert_eq!(json["duration_minutes"], 65);
        assert_eq!(json["duration_display"], "1h 5m");
    }
}
