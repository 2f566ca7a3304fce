// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
pub mod attendance;
pub mod cleaning;
pub mod dashboard;
pub mod departments;
pub mod employees;
pub mod leaves;
pub mod maintenance;
pub mod reservations;
pub mod rollover;
pub mod rooms;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use hotel_common::EmployeeRole;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::colors;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS departments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    color TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL DEFAULT '',
    department_id INTEGER NULL REFERENCES departments(id) ON DELETE SET NULL,
    role TEXT NOT NULL,
    phone TEXT NOT NULL DEFAULT '',
    avatar_path TEXT NULL,
    employee_number TEXT NULL UNIQUE,
    hire_date DATE NULL,
    is_available BOOLEAN NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT 1,
    bio TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    check_in TIMESTAMP NOT NULL,
    check_out TIMESTAMP NULL,
    status TEXT NOT NULL,
    notes TEXT NOT NULL DEFAULT '',
    check_in_location TEXT NOT NULL DEFAULT '',
    check_out_location TEXT NOT NULL DEFAULT '',
    created_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attendance_employee_check_in ON attendance (employee_id, check_in);

CREATE TABLE IF NOT EXISTS leaves (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    employee_id INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
    leave_type TEXT NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL,
    approved_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    approved_at TIMESTAMP NULL,
    rejection_reason TEXT NOT NULL DEFAULT '',
    attachment_path TEXT NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS room_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    capacity INTEGER NOT NULL,
    base_rate_cents INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    amenities TEXT NOT NULL DEFAULT '',
    is_active BOOLEAN NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS rooms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    number TEXT NOT NULL UNIQUE,
    floor INTEGER NOT NULL,
    room_type_id INTEGER NOT NULL REFERENCES room_types(id),
    status TEXT NOT NULL,
    occupancy TEXT NOT NULL,
    last_cleaned TIMESTAMP NULL,
    last_inspected TIMESTAMP NULL,
    notes TEXT NOT NULL DEFAULT '',
    is_active BOOLEAN NOT NULL DEFAULT 1,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reservation_number TEXT NOT NULL UNIQUE,
    room_id INTEGER NOT NULL REFERENCES rooms(id),
    check_in_date DATE NOT NULL,
    check_out_date DATE NOT NULL,
    actual_check_in TIMESTAMP NULL,
    actual_check_out TIMESTAMP NULL,
    guest_first_name TEXT NOT NULL,
    guest_last_name TEXT NOT NULL,
    guest_email TEXT NOT NULL,
    guest_phone TEXT NOT NULL,
    guest_document TEXT NOT NULL DEFAULT '',
    guest_nationality TEXT NOT NULL DEFAULT '',
    adults INTEGER NOT NULL,
    children INTEGER NOT NULL,
    special_requests TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL,
    payment_status TEXT NOT NULL,
    room_rate_cents INTEGER NOT NULL,
    total_cents INTEGER NOT NULL,
    paid_cents INTEGER NOT NULL DEFAULT 0,
    internal_notes TEXT NOT NULL DEFAULT '',
    cancellation_reason TEXT NOT NULL DEFAULT '',
    created_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    checked_in_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    checked_out_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_reservations_room_dates ON reservations (room_id, check_in_date, check_out_date);

CREATE TABLE IF NOT EXISTS cleaning_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id INTEGER NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
    assigned_to INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    cleaning_type TEXT NOT NULL,
    status TEXT NOT NULL,
    priority INTEGER NOT NULL,
    scheduled_for TIMESTAMP NULL,
    notes TEXT NOT NULL DEFAULT '',
    photo_path TEXT NULL,
    started_at TIMESTAMP NULL,
    completed_at TIMESTAMP NULL,
    verified_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    verified_at TIMESTAMP NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS maintenance_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id INTEGER NOT NULL REFERENCES rooms(id) ON DELETE CASCADE,
    reported_by INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    assigned_to INTEGER NULL REFERENCES employees(id) ON DELETE SET NULL,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    priority TEXT NOT NULL,
    status TEXT NOT NULL,
    resolution TEXT NOT NULL DEFAULT '',
    photo_path TEXT NULL,
    assigned_at TIMESTAMP NULL,
    resolved_at TIMESTAMP NULL,
    created_at TIMESTAMP NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
"#;

/// Departments every hotel starts with.
const DEFAULT_DEPARTMENTS: [(&str, &str); 5] = [
    ("DIR", "Direction"),
    ("REC", "Reception"),
    ("LIM", "Housekeeping"),
    ("MAN", "Maintenance"),
    ("RES", "Restaurant"),
];

/// Establishes the database connection pool.
/// If the database does not exist, it creates it (and its directory).
/// It also ensures every table has the correct schema.
pub async fn establish_connection_pool(database_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        if let Some(parent) = database_file_path(database_url).and_then(Path::parent) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        info!("Creating database {}", database_url);
        Sqlite::create_database(database_url)
            .await
            .context("Failed to create database")?;
    } else {
        info!("Database already exists.");
    }

    let pool = SqlitePool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;
    seed_departments(&pool).await?;

    Ok(pool)
}

/// A fresh in-memory database with the full schema and default departments.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .context("Failed to open in-memory database")?;
    create_schema(&pool).await?;
    seed_departments(&pool).await?;
    Ok(pool)
}

pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .context("Failed to create the schema")?;
    info!("Database schema is ready.");
    Ok(())
}

/// Inserts the default departments when the table is empty.
pub async fn seed_departments(pool: &SqlitePool) -> Result<()> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
        .fetch_one(pool)
        .await
        .context("Failed to count departments")?;
    if existing > 0 {
        debug!("{} departments present, skipping seed.", existing);
        return Ok(());
    }

    let now = Utc::now();
    for (index, (code, name)) in DEFAULT_DEPARTMENTS.iter().enumerate() {
        sqlx::query(
            "INSERT INTO departments (code, name, color, description, is_active, created_at) VALUES (?, ?, ?, '', 1, ?)",
        )
        .bind(code)
        .bind(name)
        .bind(colors::palette_color(index))
        .bind(now)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to seed department {}", code))?;
    }
    info!("Seeded {} default departments.", DEFAULT_DEPARTMENTS.len());
    Ok(())
}

/// Creates a director account when no employee exists yet.
/// Returns true if an account was created.
pub async fn bootstrap_director(pool: &SqlitePool, username: &str, password: &str) -> Result<bool> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await
        .context("Failed to count employees")?;
    if existing > 0 {
        return Ok(false);
    }

    let department_id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM departments WHERE code = 'DIR'")
            .fetch_optional(pool)
            .await
            .context("Failed to look up the direction department")?;

    let password_hash = crate::auth::password::hash_password(password)?;
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO employees (username, password_hash, first_name, last_name, email, department_id, role, created_at, updated_at) VALUES (?, ?, ?, '', '', ?, ?, ?, ?)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(username)
    .bind(department_id)
    .bind(EmployeeRole::Director)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create the bootstrap director")?;

    warn!("Created bootstrap director account '{}'. Change its password.", username);
    Ok(true)
}

/// `sqlite://database/sqlite.db` -> `database/sqlite.db`. None for in-memory URLs.
fn database_file_path(database_url: &str) -> Option<&Path> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        None
    } else {
        Some(Path::new(path))
    }
}
