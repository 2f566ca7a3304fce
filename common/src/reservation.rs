// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{CleaningTask, CleaningType, DomainError, PageQuery};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
}

/// Operations that move a reservation through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationAction {
    Confirm,
    CheckIn,
    CheckOut,
    Cancel,
    MarkNoShow,
}

impl ReservationAction {
    fn verb(&self) -> &'static str {
        match self {
            ReservationAction::Confirm => "confirm",
            ReservationAction::CheckIn => "check in",
            ReservationAction::CheckOut => "check out",
            ReservationAction::Cancel => "cancel",
            ReservationAction::MarkNoShow => "mark as no-show",
        }
    }
}

impl ReservationStatus {
    /// Statuses that hold the room for their dates.
    pub const BLOCKING: [ReservationStatus; 2] =
        [ReservationStatus::Confirmed, ReservationStatus::CheckedIn];

    pub fn blocks_room(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::CheckedOut | ReservationStatus::Cancelled | ReservationStatus::NoShow
        )
    }

    /// pending -> confirmed -> checked_in -> checked_out, with cancellation
    /// before arrival and no-show for confirmed guests who never came.
    pub fn apply(self, action: ReservationAction) -> Result<ReservationStatus, DomainError> {
        use ReservationAction as A;
        use ReservationStatus as S;
        match (self, action) {
            (S::Pending, A::Confirm) => Ok(S::Confirmed),
            (S::Confirmed, A::CheckIn) => Ok(S::CheckedIn),
            (S::CheckedIn, A::CheckOut) => Ok(S::CheckedOut),
            (S::Pending | S::Confirmed, A::Cancel) => Ok(S::Cancelled),
            (S::Confirmed, A::MarkNoShow) => Ok(S::NoShow),
            (from, action) => Err(DomainError::transition("reservation", from, action.verb())),
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        };
        f.write_str(s)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn from_amounts(paid_cents: i64, total_cents: i64) -> Self {
        if paid_cents >= total_cents {
            PaymentStatus::Paid
        } else if paid_cents > 0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Reservation {
    pub id: i64,
    /// `RES-YYYYMMDD-NNNN`
    pub reservation_number: String,
    pub room_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub actual_check_in: Option<DateTime<Utc>>,
    pub actual_check_out: Option<DateTime<Utc>>,
    pub guest_first_name: String,
    pub guest_last_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub guest_document: String,
    pub guest_nationality: String,
    pub adults: i64,
    pub children: i64,
    pub special_requests: String,
    pub status: ReservationStatus,
    pub payment_status: PaymentStatus,
    pub room_rate_cents: i64,
    pub total_cents: i64,
    pub paid_cents: i64,
    pub internal_notes: String,
    pub cancellation_reason: String,
    pub created_by: Option<i64>,
    pub checked_in_by: Option<i64>,
    pub checked_out_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn guest_full_name(&self) -> String {
        format!("{} {}", self.guest_first_name, self.guest_last_name)
    }

    pub fn nights(&self) -> i64 {
        nights(self.check_in_date, self.check_out_date)
    }

    pub fn pending_cents(&self) -> i64 {
        self.total_cents - self.paid_cents
    }

    pub fn is_paid(&self) -> bool {
        self.paid_cents >= self.total_cents
    }

    /// Whole nights since the actual check-in (up to the actual check-out if any).
    pub fn nights_stayed(&self, now: DateTime<Utc>) -> i64 {
        match self.actual_check_in {
            Some(start) => (self.actual_check_out.unwrap_or(now) - start).num_days().max(0),
            None => 0,
        }
    }

    /// Cleaning an in-house room needs on `today`: a departure clean on the
    /// check-out day, a deep clean with linen change from the third night, a
    /// light stay-over clean otherwise.
    pub fn cleaning_needed(&self, today: NaiveDate, now: DateTime<Utc>) -> Option<CleaningType> {
        if self.status != ReservationStatus::CheckedIn {
            return None;
        }
        if self.check_out_date == today {
            Some(CleaningType::Checkout)
        } else if self.nights_stayed(now) >= 3 {
            Some(CleaningType::DeepCleaning)
        } else {
            Some(CleaningType::StayOver)
        }
    }

    pub fn view(self) -> ReservationView {
        ReservationView {
            nights: self.nights(),
            guest_full_name: self.guest_full_name(),
            pending_cents: self.pending_cents(),
            is_paid: self.is_paid(),
            reservation: self,
        }
    }
}

/// A reservation with its derived amounts.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub nights: i64,
    pub guest_full_name: String,
    pub pending_cents: i64,
    pub is_paid: bool,
}

pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().max(0)
}

/// Half-open `[start, end)` stays overlap when each starts before the other ends.
pub fn stays_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Date order and room capacity rules for a stay.
pub fn validate_stay(
    check_in: NaiveDate,
    check_out: NaiveDate,
    adults: i64,
    children: i64,
    capacity: i64,
) -> Result<(), DomainError> {
    if check_out <= check_in {
        return Err(DomainError::validation(
            "The check-out date must be after the check-in date.",
        ));
    }
    if adults < 1 {
        return Err(DomainError::validation("At least one adult is required."));
    }
    if children < 0 {
        return Err(DomainError::validation("Children cannot be negative."));
    }
    if adults + children > capacity {
        return Err(DomainError::validation(format!(
            "This room holds at most {} guests.",
            capacity
        )));
    }
    Ok(())
}

pub fn format_reservation_number(date: NaiveDate, suffix: u16) -> String {
    format!("RES-{}-{:04}", date.format("%Y%m%d"), suffix % 10_000)
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateReservationPayload {
    pub room_id: i64,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    #[validate(length(min = 1, max = 100, message = "Guest first name is required."))]
    pub guest_first_name: String,
    #[validate(length(min = 1, max = 100, message = "Guest last name is required."))]
    pub guest_last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub guest_email: String,
    #[validate(length(min = 1, max = 20, message = "Guest phone is required."))]
    pub guest_phone: String,
    pub guest_document: Option<String>,
    pub guest_nationality: Option<String>,
    #[validate(range(min = 1, message = "At least one adult is required."))]
    pub adults: Option<i64>,
    #[validate(range(min = 0))]
    pub children: Option<i64>,
    pub special_requests: Option<String>,
    /// Defaults to the room type's base rate.
    #[validate(range(min = 1, message = "The nightly rate must be positive."))]
    pub room_rate_cents: Option<i64>,
    pub internal_notes: Option<String>,
}

#[derive(Deserialize, Debug, Default, Validate)]
pub struct UpdateReservationPayload {
    pub room_id: Option<i64>,
    pub check_in_date: Option<NaiveDate>,
    pub check_out_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub guest_first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub guest_last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub guest_email: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub guest_phone: Option<String>,
    pub guest_document: Option<String>,
    pub guest_nationality: Option<String>,
    #[validate(range(min = 1))]
    pub adults: Option<i64>,
    #[validate(range(min = 0))]
    pub children: Option<i64>,
    pub special_requests: Option<String>,
    #[validate(range(min = 1))]
    pub room_rate_cents: Option<i64>,
    pub internal_notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct CancelReservationPayload {
    pub reason: Option<String>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct PaymentPayload {
    #[validate(range(min = 1, message = "The amount must be positive."))]
    pub amount_cents: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct ReservationQuery {
    pub status: Option<ReservationStatus>,
    pub room_id: Option<i64>,
    /// Stays overlapping `[from, to]`.
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Matches guest name, email or reservation number.
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ReservationQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrontDeskDay {
    pub date: NaiveDate,
    pub arrivals: Vec<ReservationView>,
    pub departures: Vec<ReservationView>,
}

/// A departed stay and the cleaning task its room received.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckOutResult {
    pub reservation: ReservationView,
    pub cleaning_task: CleaningTask,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn lifecycle_follows_the_front_desk_flow() {
        let s = ReservationStatus::Pending;
        let s = s.apply(ReservationAction::Confirm).unwrap();
        assert_eq!(s, ReservationStatus::Confirmed);
        let s = s.apply(ReservationAction::CheckIn).unwrap();
        assert_eq!(s, ReservationStatus::CheckedIn);
        let s = s.apply(ReservationAction::CheckOut).unwrap();
        assert_eq!(s, ReservationStatus::CheckedOut);
        assert!(s.is_terminal());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        assert!(ReservationStatus::Pending.apply(ReservationAction::CheckIn).is_err());
        assert!(ReservationStatus::CheckedIn.apply(ReservationAction::Cancel).is_err());
        assert!(ReservationStatus::Pending.apply(ReservationAction::MarkNoShow).is_err());
        assert!(ReservationStatus::Cancelled.apply(ReservationAction::Confirm).is_err());
        assert_eq!(
            ReservationStatus::Confirmed.apply(ReservationAction::Cancel),
            Ok(ReservationStatus::Cancelled)
        );
        assert_eq!(
            ReservationStatus::Confirmed.apply(ReservationAction::MarkNoShow),
            Ok(ReservationStatus::NoShow)
        );
    }

    #[test]
    fn back_to_back_stays_do_not_overlap() {
        let (a, b, c, d) = (date(2025, 6, 1), date(2025, 6, 4), date(2025, 6, 4), date(2025, 6, 6));
        assert!(!stays_overlap(a, b, c, d));
        assert!(stays_overlap(a, b, date(2025, 6, 3), d));
        assert!(stays_overlap(a, d, b, c));
    }

    #[test]
    fn stay_rules() {
        let (ci, co) = (date(2025, 6, 1), date(2025, 6, 3));
        assert!(validate_stay(ci, co, 2, 0, 2).is_ok());
        assert!(validate_stay(ci, ci, 1, 0, 2).is_err());
        assert!(validate_stay(ci, co, 0, 1, 2).is_err());
        assert!(validate_stay(ci, co, 2, 1, 2).is_err());
        assert_eq!(nights(ci, co), 2);
    }

    #[test]
    fn payment_status_from_amounts() {
        assert_eq!(PaymentStatus::from_amounts(0, 10_000), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_amounts(2_500, 10_000), PaymentStatus::Partial);
        assert_eq!(PaymentStatus::from_amounts(10_000, 10_000), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_amounts(0, 0), PaymentStatus::Paid);
    }

    #[test]
    fn reservation_numbers_are_zero_padded() {
        assert_eq!(format_reservation_number(date(2025, 6, 1), 42), "RES-20250601-0042");
    }

    #[test]
    fn cleaning_needed_for_in_house_guests() {
        let now = Utc.with_ymd_and_hms(2025, 6, 5, 10, 0, 0).unwrap();
        let mut r = Reservation {
            id: 1,
            reservation_number: "RES-20250601-0001".to_string(),
            room_id: 1,
            check_in_date: date(2025, 6, 1),
            check_out_date: date(2025, 6, 8),
            actual_check_in: Some(Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap()),
            actual_check_out: None,
            guest_first_name: "Ada".to_string(),
            guest_last_name: "King".to_string(),
            guest_email: "ada@example.com".to_string(),
            guest_phone: "600000000".to_string(),
            guest_document: String::new(),
            guest_nationality: String::new(),
            adults: 1,
            children: 0,
            special_requests: String::new(),
            status: ReservationStatus::CheckedIn,
            payment_status: PaymentStatus::Unpaid,
            room_rate_cents: 10_000,
            total_cents: 70_000,
            paid_cents: 0,
            internal_notes: String::new(),
            cancellation_reason: String::new(),
            created_by: None,
            checked_in_by: None,
            checked_out_by: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(r.nights_stayed(now), 3);
        assert_eq!(r.cleaning_needed(now.date_naive(), now), Some(CleaningType::DeepCleaning));

        r.actual_check_in = Some(Utc.with_ymd_and_hms(2025, 6, 4, 15, 0, 0).unwrap());
        assert_eq!(r.cleaning_needed(now.date_naive(), now), Some(CleaningType::StayOver));
        assert_eq!(r.cleaning_needed(date(2025, 6, 8), now), Some(CleaningType::Checkout));

        r.status = ReservationStatus::Confirmed;
        assert_eq!(r.cleaning_needed(now.date_naive(), now), None);

        let view = r.view();
        assert_eq!(view.nights, 7);
        assert_eq!(view.pending_cents, 70_000);
        assert_eq!(view.guest_full_name, "Ada King");
    }
}
