// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use hotel_common::{
    CancelReservationPayload, CheckOutResult, CreateReservationPayload, DayQuery, FrontDeskDay, Page,
    PaymentPayload, Reservation, ReservationQuery, ReservationView, UpdateReservationPayload,
};
use tracing::{debug, info};
use validator::Validate;

use super::AppError;
use crate::auth::CurrentUser;
use crate::database::reservations;
use crate::state::AppState;

fn views(list: Vec<Reservation>) -> Vec<ReservationView> {
    list.into_iter().map(Reservation::view).collect()
}

pub async fn list_reservations(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReservationQuery>,
) -> Result<Json<Page<ReservationView>>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let (items, total) = reservations::list_reservations_from_db(&state.pool, &query).await?;
    Ok(Json(Page::new(views(items), &query.page_query(), total)))
}

pub async fn get_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    reservations::get_reservation_from_db(&state.pool, id)
        .await?
        .map(|r| Json(r.view()))
        .ok_or_else(|| AppError::not_found(&format!("Reservation with ID {} not found.", id)))
}

/// Handler for booking a room. The stay starts as pending.
pub async fn create_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateReservationPayload>,
) -> Result<(StatusCode, Json<ReservationView>), AppError> {
    user.require(user.role().manages_front_desk())?;
    payload.validate()?;
    debug!(
        "Booking room {} from {} to {} for {} {}",
        payload.room_id, payload.check_in_date, payload.check_out_date, payload.guest_first_name, payload.guest_last_name
    );
    let reservation = reservations::create_reservation_in_db(&state.pool, payload, user.id(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(reservation.view())))
}

pub async fn update_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateReservationPayload>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    payload.validate()?;
    let reservation = reservations::update_reservation_in_db(&state.pool, id, payload, Utc::now()).await?;
    Ok(Json(reservation.view()))
}

pub async fn confirm_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let reservation = reservations::confirm_reservation_in_db(&state.pool, id, Utc::now()).await?;
    Ok(Json(reservation.view()))
}

pub async fn check_in_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let reservation = reservations::check_in_reservation_in_db(&state.pool, id, user.id(), Utc::now()).await?;
    Ok(Json(reservation.view()))
}

/// Handler for a guest departure. Returns the stay and the checkout cleaning task.
pub async fn check_out_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<CheckOutResult>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let (reservation, cleaning_task) =
        reservations::check_out_reservation_in_db(&state.pool, id, user.id(), Utc::now()).await?;
    Ok(Json(CheckOutResult {
        reservation: reservation.view(),
        cleaning_task,
    }))
}

pub async fn cancel_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    payload: Option<Json<CancelReservationPayload>>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let reason = payload.and_then(|Json(p)| p.reason);
    let reservation = reservations::cancel_reservation_in_db(&state.pool, id, reason, Utc::now()).await?;
    info!("Reservation {} cancelled by {}.", reservation.reservation_number, user.employee.username);
    Ok(Json(reservation.view()))
}

pub async fn mark_no_show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let reservation = reservations::mark_no_show_in_db(&state.pool, id, Utc::now()).await?;
    Ok(Json(reservation.view()))
}

pub async fn record_payment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PaymentPayload>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    payload.validate()?;
    let reservation = reservations::record_payment_in_db(&state.pool, id, payload.amount_cents, Utc::now()).await?;
    info!(
        "Payment of {} cents recorded on {} by {}.",
        payload.amount_cents, reservation.reservation_number, user.employee.username
    );
    Ok(Json(reservation.view()))
}

pub async fn refund_reservation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ReservationView>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let reservation = reservations::refund_reservation_in_db(&state.pool, id, Utc::now()).await?;
    Ok(Json(reservation.view()))
}

/// Arrivals and departures of `?date=`, today by default.
pub async fn front_desk_day(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DayQuery>,
) -> Result<Json<FrontDeskDay>, AppError> {
    user.require(user.role().manages_front_desk())?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(FrontDeskDay {
        date,
        arrivals: views(reservations::arrivals_from_db(&state.pool, date).await?),
        departures: views(reservations::departures_from_db(&state.pool, date).await?),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::reservations::tests::booking;
    use crate::database::rooms::tests::{insert_room, insert_room_type};
    use crate::handlers::test_support::{state, user};
    use hotel_common::{CleaningType, EmployeeRole, ReservationStatus};

    #[tokio::test]
    async fn housekeeping_cannot_book() {
        let state = state().await;
        let maid = user(&state.pool, "maid", EmployeeRole::RoomAttendant).await;
        let kind = insert_room_type(&state.pool, "DBL", 2).await;
        let room = insert_room(&state.pool, "101", 1, kind.id).await;
        let err = create_reservation(State(state), maid, Json(booking(room.id, 0, 2)))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn full_stay_through_the_front_desk() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let kind = insert_room_type(&state.pool, "DBL", 2).await;
        let room = insert_room(&state.pool, "101", 1, kind.id).await;

        let (status, Json(created)) = create_reservation(State(state.clone()), clerk.clone(), Json(booking(room.id, 0, 2)))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.nights, 2);
        assert_eq!(created.pending_cents, 20_000);
        let id = created.reservation.id;

        confirm_reservation(State(state.clone()), clerk.clone(), Path(id)).await.unwrap();
        let Json(checked_in) = check_in_reservation(State(state.clone()), clerk.clone(), Path(id)).await.unwrap();
        assert_eq!(checked_in.reservation.status, ReservationStatus::CheckedIn);
        assert_eq!(checked_in.reservation.checked_in_by, Some(clerk.id()));

        let err = check_in_reservation(State(state.clone()), clerk.clone(), Path(id)).await.unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);

        let Json(paid) = record_payment(State(state.clone()), clerk.clone(), Path(id), Json(PaymentPayload { amount_cents: 20_000 }))
            .await
            .unwrap();
        assert!(paid.is_paid);

        let Json(out) = check_out_reservation(State(state.clone()), clerk.clone(), Path(id)).await.unwrap();
        assert_eq!(out.reservation.reservation.status, ReservationStatus::CheckedOut);
        assert_eq!(out.cleaning_task.cleaning_type, CleaningType::Checkout);
        assert_eq!(out.cleaning_task.room_id, room.id);
    }

    #[tokio::test]
    async fn confirmed_overlap_conflicts() {
        let state = state().await;
        let clerk = user(&state.pool, "clerk", EmployeeRole::Receptionist).await;
        let kind = insert_room_type(&state.pool, "DBL", 2).await;
        let room = insert_room(&state.pool, "101", 1, kind.id).await;

        let (_, Json(first)) = create_reservation(State(state.clone()), clerk.clone(), Json(booking(room.id, 1, 3)))
            .await
            .unwrap();
        confirm_reservation(State(state.clone()), clerk.clone(), Path(first.reservation.id))
            .await
            .unwrap();

        let err = create_reservation(State(state.clone()), clerk.clone(), Json(booking(room.id, 2, 2)))
            .await
            .unwrap_err();
        assert_eq!(err.code, StatusCode::CONFLICT);

        let Json(cancelled) = cancel_reservation(
            State(state.clone()),
            clerk.clone(),
            Path(first.reservation.id),
            Some(Json(CancelReservationPayload {
                reason: Some("Guest called".to_string()),
            })),
        )
        .await
        .unwrap();
        assert_eq!(cancelled.reservation.status, ReservationStatus::Cancelled);
        assert_eq!(cancelled.reservation.cancellation_reason, "Guest called");

        assert!(create_reservation(State(state), clerk, Json(booking(room.id, 2, 2))).await.is_ok());
    }
}
