use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use hotel_server::config::Config;
use hotel_server::database;
use hotel_server::routes::create_router;
use hotel_server::state::AppState;
use http_body_util::BodyExt; // For `collect`
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt; // For `oneshot`

const DIRECTOR: &str = "director";
const DIRECTOR_PASSWORD: &str = "director-password";

/// A router over a fresh in-memory database holding one director account.
/// The temporary media root lives as long as the returned `TempDir`.
async fn setup_app() -> (Router, TempDir) {
    let pool = database::memory_pool()
        .await
        .expect("Failed to open in-memory database");
    database::bootstrap_director(&pool, DIRECTOR, DIRECTOR_PASSWORD)
        .await
        .expect("Failed to create the director");

    let media = tempfile::tempdir().expect("Failed to create media directory");
    let config = Config {
        media_root: media.path().to_path_buf(),
        ..Config::default()
    };
    (create_router(AppState::new(pool, config)), media)
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Creates an employee as the director and logs them in.
async fn hire(app: &Router, director: &str, username: &str, role: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/employees",
        Some(director),
        Some(json!({
            "username": username,
            "password": "password123",
            "first_name": username,
            "last_name": "Test",
            "email": format!("{}@example.com", username),
            "role": role
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "hire failed: {}", body);
    let id = body["id"].as_i64().unwrap();
    (id, login(app, username, "password123").await)
}

async fn create_room(app: &Router, token: &str) -> i64 {
    let (status, room_type) = send(
        app,
        Method::POST,
        "/api/room-types",
        Some(token),
        Some(json!({ "code": "dbl", "name": "Double", "capacity": 2, "base_rate_cents": 12_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room_type["code"], "DBL");

    let uri = format!("/api/room-types/{}", room_type["id"]);
    let (status, fetched) = send(app, Method::GET, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["base_rate_cents"], 12_000);

    let (status, room) = send(
        app,
        Method::POST,
        "/api/rooms",
        Some(token),
        Some(json!({ "number": "101", "floor": 1, "room_type_id": room_type["id"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(room["status"], "dirty");
    assert_eq!(room["occupancy"], "vacant");
    room["id"].as_i64().unwrap()
}

fn booking(room_id: i64, from_today: i64, nights: i64) -> Value {
    let check_in = Utc::now().date_naive() + Duration::days(from_today);
    json!({
        "room_id": room_id,
        "check_in_date": check_in.to_string(),
        "check_out_date": (check_in + Duration::days(nights)).to_string(),
        "guest_first_name": "Grace",
        "guest_last_name": "Hopper",
        "guest_email": "grace@example.com",
        "guest_phone": "0600000000",
        "adults": 2
    })
}

#[tokio::test]
async fn test_login_me_and_logout() {
    let (app, _media) = setup_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": DIRECTOR, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let bad_password = body["error"].clone();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "nobody", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], bad_password);

    let token = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;
    let (status, me) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], DIRECTOR);
    assert_eq!(me["role"], "director");
    assert!(me.get("password_hash").is_none());

    let (status, _) = send(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let (app, _media) = setup_app().await;
    let (status, body) = send(&app, Method::GET, "/api/dashboard", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_departments_require_staff_management() {
    let (app, _media) = setup_app().await;
    let director = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;
    let (_, clerk) = hire(&app, &director, "clerk", "receptionist").await;

    let payload = json!({ "code": "spa", "name": "Spa" });
    let (status, _) = send(&app, Method::POST, "/api/departments", Some(&clerk), Some(payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, department) = send(&app, Method::POST, "/api/departments", Some(&director), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(department["code"], "SPA");
    assert!(department["color"].as_str().unwrap().starts_with('#'));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/departments",
        Some(&director),
        Some(json!({ "code": "TOOLONG", "name": "Bad" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["code"].is_array());

    let uri = format!("/api/departments/{}", department["id"]);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&director), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, list) = send(&app, Method::GET, "/api/departments", Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().iter().all(|d| d["code"] != "SPA"));
}

#[tokio::test]
async fn test_stay_from_booking_to_checkout() {
    let (app, _media) = setup_app().await;
    let director = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;
    let (_, clerk) = hire(&app, &director, "clerk", "receptionist").await;
    let room_id = create_room(&app, &director).await;

    let (status, reservation) = send(&app, Method::POST, "/api/reservations", Some(&clerk), Some(booking(room_id, 0, 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reservation["status"], "pending");
    assert_eq!(reservation["total_cents"], 24_000);
    assert!(reservation["reservation_number"].as_str().unwrap().starts_with("RES-"));
    let id = reservation["id"].as_i64().unwrap();

    let (status, confirmed) = send(&app, Method::POST, &format!("/api/reservations/{}/confirm", id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "confirmed");

    // Same room, overlapping nights.
    let (status, _) = send(&app, Method::POST, "/api/reservations", Some(&clerk), Some(booking(room_id, 1, 2))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, day) = send(&app, Method::GET, "/api/reservations/day", Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["arrivals"].as_array().unwrap().len(), 1);

    let (status, checked_in) = send(&app, Method::POST, &format!("/api/reservations/{}/check-in", id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(checked_in["status"], "checked_in");
    let (status, _) = send(&app, Method::POST, &format!("/api/reservations/{}/check-in", id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, room) = send(&app, Method::GET, &format!("/api/rooms/{}", room_id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["occupancy"], "occupied");
    assert_eq!(room["current_reservation"]["id"], id);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/reservations/{}/payments", id),
        Some(&clerk),
        Some(json!({ "amount_cents": 24_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, out) = send(&app, Method::POST, &format!("/api/reservations/{}/check-out", id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(out["reservation"]["status"], "checked_out");
    assert_eq!(out["reservation"]["payment_status"], "paid");
    assert_eq!(out["cleaning_task"]["cleaning_type"], "checkout");
    assert_eq!(out["cleaning_task"]["priority"], 1);

    let (status, tasks) = send(&app, Method::GET, "/api/housekeeping/tasks", Some(&director), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks["tasks"]["total"], 1);
    assert_eq!(tasks["stats"]["pending"], 1);

    let (status, room) = send(&app, Method::GET, &format!("/api/rooms/{}", room_id), Some(&clerk), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["status"], "dirty");
    assert_eq!(room["occupancy"], "vacant");
}

#[tokio::test]
async fn test_leave_is_decided_by_the_right_manager() {
    let (app, _media) = setup_app().await;
    let director = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;
    let (_, maid) = hire(&app, &director, "maid", "room_attendant").await;
    let (_, reception) = hire(&app, &director, "recm", "reception_manager").await;
    let (hk_id, housekeeping) = hire(&app, &director, "hkm", "housekeeping_manager").await;

    let start = Utc::now().date_naive() + Duration::days(10);
    let (status, leave) = send(
        &app,
        Method::POST,
        "/api/leaves",
        Some(&maid),
        Some(json!({
            "leave_type": "vacation",
            "start_date": start.to_string(),
            "end_date": (start + Duration::days(4)).to_string(),
            "reason": "Summer holidays"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let decision_uri = format!("/api/leaves/{}/decision", leave["id"]);

    let (status, _) = send(&app, Method::POST, &decision_uri, Some(&reception), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, managed) = send(&app, Method::GET, "/api/leaves/manage", Some(&housekeeping), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(managed["counts"]["pending"], 1);

    let (status, approved) = send(&app, Method::POST, &decision_uri, Some(&housekeeping), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["status"], "approved");
    assert_eq!(approved["approved_by"], hk_id);

    let (status, mine) = send(&app, Method::GET, "/api/leaves", Some(&maid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine["summary"]["approved_count"], 1);
    assert_eq!(mine["leaves"]["items"][0]["status"], "approved");
}

#[tokio::test]
async fn test_attendance_once_per_day() {
    let (app, _media) = setup_app().await;
    let director = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;
    let (_, tech) = hire(&app, &director, "tech", "maintenance_technician").await;

    let (status, record) = send(&app, Method::POST, "/api/attendance/check-in", Some(&tech), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(record["check_out"].is_null());

    let (status, _) = send(&app, Method::POST, "/api/attendance/check-in", Some(&tech), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, me) = send(&app, Method::GET, "/api/attendance/me", Some(&tech), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["is_checked_in"], true);

    let (status, _) = send(&app, Method::POST, "/api/attendance/check-out", Some(&tech), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::POST, "/api/attendance/check-out", Some(&tech), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::GET, "/api/attendance/overview", Some(&tech), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_avatar_upload_is_served_back() {
    let (app, media) = setup_app().await;
    let director = login(&app, DIRECTOR, DIRECTOR_PASSWORD).await;

    let boundary = "hotel-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\nContent-Type: image/png\r\n\r\nfake-png-bytes\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/profile/avatar")
        .header(header::AUTHORIZATION, format!("Bearer {}", director))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let employee: Value = serde_json::from_slice(&bytes).unwrap();

    let avatar = employee["avatar_path"].as_str().unwrap().to_string();
    assert!(avatar.starts_with("avatars/") && avatar.ends_with(".png"));
    assert!(media.path().join(&avatar).exists());

    let request = Request::builder()
        .uri(format!("/media/{}", avatar))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&served[..], b"fake-png-bytes");
}
