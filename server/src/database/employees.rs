// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use hotel_common::{
    CreateEmployeePayload, Employee, EmployeeQuery, EmployeeRole, ProfileUpdatePayload,
    UpdateEmployeePayload,
};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};
use tracing::{debug, info};

/// Restricts a query to rows whose `column` holds one of `roles`.
pub(crate) fn push_role_scope(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, roles: &[EmployeeRole]) {
    if roles.is_empty() {
        builder.push(" AND 0");
        return;
    }
    builder.push(format!(" AND {} IN (", column));
    let mut separated = builder.separated(", ");
    for role in roles {
        separated.push_bind(*role);
    }
    separated.push_unseparated(")");
}

pub async fn get_employee_from_db<'e, E: SqliteExecutor<'e>>(executor: E, id: i64) -> Result<Option<Employee>> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve employee with ID: {}", id))
}

pub async fn get_employee_by_username_from_db(pool: &SqlitePool, username: &str) -> Result<Option<Employee>> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to retrieve employee {}", username))
}

fn push_list_filters(builder: &mut QueryBuilder<'_, Sqlite>, roles: &[EmployeeRole], query: &EmployeeQuery) {
    builder.push(" WHERE is_active = 1");
    push_role_scope(builder, "role", roles);
    if let Some(department_id) = query.department_id {
        builder.push(" AND department_id = ").push_bind(department_id);
    }
    if let Some(available) = query.available {
        builder.push(" AND is_available = ").push_bind(available);
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        builder
            .push(" AND (first_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name LIKE ")
            .push_bind(pattern.clone())
            .push(" OR employee_number LIKE ")
            .push_bind(pattern.clone())
            .push(" OR username LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Active employees whose role is in `roles`, filtered and paginated.
/// Returns the page and the total number of matches.
pub async fn list_employees_from_db(
    pool: &SqlitePool,
    roles: &[EmployeeRole],
    query: &EmployeeQuery,
) -> Result<(Vec<Employee>, i64)> {
    let page = query.page_query();

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM employees");
    push_list_filters(&mut count, roles, query);
    let total: i64 = count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count employees")?;

    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM employees");
    push_list_filters(&mut select, roles, query);
    select
        .push(" ORDER BY first_name ASC, last_name ASC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
    let employees = select
        .build_query_as::<Employee>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve employees from DB")?;

    Ok((employees, total))
}

/// Active, available employees with one of `roles`, by name.
pub async fn list_available_staff_from_db(pool: &SqlitePool, roles: &[EmployeeRole]) -> Result<Vec<Employee>> {
    let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM employees WHERE is_active = 1 AND is_available = 1");
    push_role_scope(&mut select, "role", roles);
    select.push(" ORDER BY first_name ASC, last_name ASC");
    select
        .build_query_as::<Employee>()
        .fetch_all(pool)
        .await
        .context("Failed to retrieve available staff")
}

pub async fn count_active_employees_in_db(pool: &SqlitePool, roles: &[EmployeeRole]) -> Result<i64> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM employees WHERE is_active = 1");
    push_role_scope(&mut count, "role", roles);
    count
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await
        .context("Failed to count active employees")
}

pub async fn create_employee_in_db(
    pool: &SqlitePool,
    payload: CreateEmployeePayload,
    password_hash: String,
    now: DateTime<Utc>,
) -> Result<Employee> {
    debug!("Insert values: username={}, role={}", payload.username, payload.role);

    let id = sqlx::query(
        "INSERT INTO employees (username, password_hash, first_name, last_name, email, department_id, role, phone, employee_number, hire_date, is_available, is_active, bio, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)",
    )
    .bind(payload.username.trim())
    .bind(&password_hash)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.email.trim())
    .bind(payload.department_id)
    .bind(payload.role)
    .bind(payload.phone.as_deref().unwrap_or_default())
    .bind(payload.employee_number.as_deref())
    .bind(payload.hire_date)
    .bind(payload.is_available.unwrap_or(true))
    .bind(payload.bio.as_deref().unwrap_or_default())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to insert employee into DB")?
    .last_insert_rowid();

    info!("Employee {} created with ID: {}", payload.username, id);
    get_employee_from_db(pool, id)
        .await?
        .context("Inserted employee disappeared")
}

async fn save_employee(pool: &SqlitePool, employee: &Employee) -> Result<()> {
    sqlx::query(
        "UPDATE employees SET first_name = ?, last_name = ?, email = ?, department_id = ?, role = ?, phone = ?, avatar_path = ?, employee_number = ?, hire_date = ?, is_available = ?, is_active = ?, bio = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&employee.first_name)
    .bind(&employee.last_name)
    .bind(&employee.email)
    .bind(employee.department_id)
    .bind(employee.role)
    .bind(&employee.phone)
    .bind(&employee.avatar_path)
    .bind(&employee.employee_number)
    .bind(employee.hire_date)
    .bind(employee.is_available)
    .bind(employee.is_active)
    .bind(&employee.bio)
    .bind(employee.updated_at)
    .bind(employee.id)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to update employee with ID: {}", employee.id))?;
    Ok(())
}

pub async fn update_employee_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateEmployeePayload,
) -> Result<Option<Employee>> {
    let Some(mut employee) = get_employee_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(first_name) = payload.first_name {
        employee.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = payload.last_name {
        employee.last_name = last_name.trim().to_string();
    }
    if let Some(email) = payload.email {
        employee.email = email.trim().to_string();
    }
    if payload.department_id.is_some() {
        employee.department_id = payload.department_id;
    }
    if let Some(role) = payload.role {
        employee.role = role;
    }
    if let Some(phone) = payload.phone {
        employee.phone = phone;
    }
    if payload.employee_number.is_some() {
        employee.employee_number = payload.employee_number;
    }
    if payload.hire_date.is_some() {
        employee.hire_date = payload.hire_date;
    }
    if let Some(bio) = payload.bio {
        employee.bio = bio;
    }
    if let Some(is_available) = payload.is_available {
        employee.is_available = is_available;
    }
    if let Some(is_active) = payload.is_active {
        employee.is_active = is_active;
    }
    employee.updated_at = Utc::now();

    save_employee(pool, &employee).await?;
    Ok(Some(employee))
}

pub async fn update_profile_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: ProfileUpdatePayload,
) -> Result<Option<Employee>> {
    let Some(mut employee) = get_employee_from_db(pool, id).await? else {
        return Ok(None);
    };
    if let Some(phone) = payload.phone {
        employee.phone = phone;
    }
    if let Some(bio) = payload.bio {
        employee.bio = bio;
    }
    if let Some(is_available) = payload.is_available {
        employee.is_available = is_available;
    }
    employee.updated_at = Utc::now();
    save_employee(pool, &employee).await?;
    Ok(Some(employee))
}

pub async fn set_password_in_db(pool: &SqlitePool, id: i64, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE employees SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to change password of employee {}", id))?;
    Ok(())
}

pub async fn set_avatar_in_db(pool: &SqlitePool, id: i64, path: &str) -> Result<()> {
    sqlx::query("UPDATE employees SET avatar_path = ?, updated_at = ? WHERE id = ?")
        .bind(path)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to set avatar of employee {}", id))?;
    Ok(())
}

/// Soft delete: the account can no longer log in and disappears from listings.
/// Returns false if no active employee has this ID.
pub async fn deactivate_employee_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE employees SET is_active = 0, updated_at = ? WHERE id = ? AND is_active = 1")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to deactivate employee with ID: {}", id))?;

    let rows_affected = result.rows_affected();
    info!("Deactivated {} rows for employee ID: {}", rows_affected, id);
    Ok(rows_affected > 0)
}
