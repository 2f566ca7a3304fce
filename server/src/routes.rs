// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderName;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    attendance, auth, cleaning, dashboard, departments, employees, leaves, maintenance, media, reservations,
    rollover, rooms,
};
use crate::media::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Room for the multipart envelope around the largest accepted file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates and configures the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("authorization"),
        ])
        .allow_origin(Any);

    let media_root = state.config.media_root.clone();

    Router::new()
        .merge(auth_routes())
        .merge(staff_routes())
        .merge(leave_routes())
        .merge(room_routes())
        .merge(reservation_routes())
        .merge(housekeeping_routes())
        .merge(maintenance_routes())
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/password", put(auth::change_password))
}

/// Departments, employees, profile and attendance.
fn staff_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/api/departments/{id}",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        .route(
            "/api/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/api/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route("/api/employees/{id}/stats", get(employees::employee_stats))
        .route(
            "/api/profile",
            get(employees::get_profile).patch(employees::update_profile),
        )
        .route("/api/profile/avatar", post(media::upload_avatar))
        .route("/api/attendance/check-in", post(attendance::check_in))
        .route("/api/attendance/check-out", post(attendance::check_out))
        .route("/api/attendance/me", get(attendance::my_attendance))
        .route("/api/attendance/history", get(attendance::history))
        .route("/api/attendance/overview", get(attendance::overview))
        .route("/api/attendance/report", get(attendance::report))
        .route("/api/attendance/{id}", patch(attendance::correct))
}

fn leave_routes() -> Router<AppState> {
    Router::new()
        .route("/api/leaves", get(leaves::my_leaves).post(leaves::request_leave))
        .route("/api/leaves/manage", get(leaves::manage_leaves))
        .route("/api/leaves/{id}", get(leaves::get_leave).put(leaves::update_leave))
        .route("/api/leaves/{id}/cancel", post(leaves::cancel_leave))
        .route("/api/leaves/{id}/decision", post(leaves::decide_leave))
        .route("/api/leaves/{id}/attachment", post(media::upload_leave_attachment))
}

fn room_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/room-types",
            get(rooms::list_room_types).post(rooms::create_room_type),
        )
        .route(
            "/api/room-types/{id}",
            get(rooms::get_room_type)
                .put(rooms::update_room_type)
                .delete(rooms::delete_room_type),
        )
        .route("/api/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/api/rooms/board", get(rooms::room_board))
        .route("/api/rooms/availability", get(rooms::room_availability))
        .route(
            "/api/rooms/{id}",
            get(rooms::get_room).put(rooms::update_room).delete(rooms::delete_room),
        )
        .route("/api/rooms/{id}/status", patch(rooms::update_room_status))
}

fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route("/api/reservations/day", get(reservations::front_desk_day))
        .route(
            "/api/reservations/{id}",
            get(reservations::get_reservation).put(reservations::update_reservation),
        )
        .route("/api/reservations/{id}/confirm", post(reservations::confirm_reservation))
        .route("/api/reservations/{id}/check-in", post(reservations::check_in_reservation))
        .route("/api/reservations/{id}/check-out", post(reservations::check_out_reservation))
        .route("/api/reservations/{id}/cancel", post(reservations::cancel_reservation))
        .route("/api/reservations/{id}/no-show", post(reservations::mark_no_show))
        .route("/api/reservations/{id}/payments", post(reservations::record_payment))
        .route("/api/reservations/{id}/refund", post(reservations::refund_reservation))
}

fn housekeeping_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/housekeeping/tasks",
            get(cleaning::list_cleaning_tasks).post(cleaning::create_cleaning_task),
        )
        .route("/api/housekeeping/tasks/mine", get(cleaning::my_cleaning_tasks))
        .route("/api/housekeeping/staff", get(cleaning::cleaning_staff))
        .route(
            "/api/housekeeping/tasks/{id}",
            get(cleaning::get_cleaning_task)
                .put(cleaning::update_cleaning_task)
                .delete(cleaning::delete_cleaning_task),
        )
        .route("/api/housekeeping/tasks/{id}/assign", post(cleaning::assign_cleaning_task))
        .route("/api/housekeeping/tasks/{id}/start", post(cleaning::start_cleaning_task))
        .route("/api/housekeeping/tasks/{id}/complete", post(cleaning::complete_cleaning_task))
        .route("/api/housekeeping/tasks/{id}/verify", post(cleaning::verify_cleaning_task))
        .route("/api/housekeeping/tasks/{id}/photo", post(media::upload_cleaning_photo))
        .route("/api/housekeeping/rollover", patch(rollover::run_rollover))
}

fn maintenance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/maintenance",
            get(maintenance::list_maintenance).post(maintenance::report_maintenance),
        )
        .route("/api/maintenance/mine", get(maintenance::my_maintenance))
        .route("/api/maintenance/staff", get(maintenance::maintenance_staff))
        .route(
            "/api/maintenance/{id}",
            get(maintenance::get_maintenance)
                .put(maintenance::update_maintenance)
                .delete(maintenance::delete_maintenance),
        )
        .route("/api/maintenance/{id}/assign", post(maintenance::assign_maintenance))
        .route("/api/maintenance/{id}/start", post(maintenance::start_maintenance))
        .route("/api/maintenance/{id}/complete", post(maintenance::complete_maintenance))
        .route("/api/maintenance/{id}/cancel", post(maintenance::cancel_maintenance))
        .route("/api/maintenance/{id}/photo", post(media::upload_maintenance_photo))
}
