// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use chrono::Utc;
use hotel_common::department::normalize_department_code;
use hotel_common::{CreateDepartmentPayload, Department, DomainError, UpdateDepartmentPayload};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};

use crate::colors;

pub async fn list_departments_from_db(pool: &SqlitePool, include_inactive: bool) -> Result<Vec<Department>> {
    let sql = if include_inactive {
        "SELECT * FROM departments ORDER BY name ASC"
    } else {
        "SELECT * FROM departments WHERE is_active = 1 ORDER BY name ASC"
    };
    sqlx::query_as::<_, Department>(sql)
        .fetch_all(pool)
        .await
        .context("Failed to retrieve departments from DB")
}

pub async fn get_department_from_db<'e, E: SqliteExecutor<'e>>(
    executor: E,
    id: i64,
) -> Result<Option<Department>> {
    sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await
        .with_context(|| format!("Failed to retrieve department with ID: {}", id))
}

async fn active_colors(pool: &SqlitePool) -> Result<Vec<String>> {
    sqlx::query_scalar("SELECT color FROM departments WHERE is_active = 1 ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to retrieve department colors")
}

fn palette_color_or_error(color: &str) -> Result<String> {
    colors::normalize_color(color)
        .ok_or_else(|| DomainError::validation("Color must be one of the department palette colors.").into())
}

/// Inserts a new department. Without an explicit colour, the first palette
/// colour not used by an active department is assigned.
pub async fn create_department_in_db(pool: &SqlitePool, payload: CreateDepartmentPayload) -> Result<Department> {
    let code = normalize_department_code(&payload.code);
    let color = match payload.color.as_deref() {
        Some(color) => palette_color_or_error(color)?,
        None => colors::next_department_color(&active_colors(pool).await?),
    };
    let description = payload.description.unwrap_or_default();
    let created_at = Utc::now();

    debug!("Insert values: code={}, name={}, color={}", code, payload.name, color);

    let id = sqlx::query(
        "INSERT INTO departments (code, name, color, description, is_active, created_at) VALUES (?, ?, ?, ?, 1, ?)",
    )
    .bind(&code)
    .bind(payload.name.trim())
    .bind(&color)
    .bind(&description)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert department into DB")?
    .last_insert_rowid();

    info!("Department {} created with ID: {}", code, id);
    Ok(Department {
        id,
        code,
        name: payload.name.trim().to_string(),
        color,
        description,
        is_active: true,
        created_at,
    })
}

pub async fn update_department_in_db(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateDepartmentPayload,
) -> Result<Option<Department>> {
    let Some(mut department) = get_department_from_db(pool, id).await? else {
        return Ok(None);
    };

    if let Some(name) = payload.name {
        department.name = name.trim().to_string();
    }
    if let Some(color) = payload.color.as_deref() {
        department.color = palette_color_or_error(color)?;
    }
    if let Some(description) = payload.description {
        department.description = description;
    }
    if let Some(is_active) = payload.is_active {
        department.is_active = is_active;
    }

    sqlx::query("UPDATE departments SET name = ?, color = ?, description = ?, is_active = ? WHERE id = ?")
        .bind(&department.name)
        .bind(&department.color)
        .bind(&department.description)
        .bind(department.is_active)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update department with ID: {}", id))?;

    Ok(Some(department))
}

/// Soft delete. Employees keep their department link.
/// Returns false if no active department has this ID.
pub async fn deactivate_department_in_db(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE departments SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to deactivate department with ID: {}", id))?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;

    fn payload(code: &str, color: Option<&str>) -> CreateDepartmentPayload {
        CreateDepartmentPayload {
            code: code.to_string(),
            name: "Spa".to_string(),
            color: color.map(str::to_string),
            description: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_first_unused_palette_color() {
        let pool = memory_pool().await.unwrap();
        // The five seeded departments hold the first five colours.
        let spa = create_department_in_db(&pool, payload("spa", None)).await.unwrap();
        assert_eq!(spa.code, "SPA");
        assert_eq!(spa.color, colors::palette_color(5));
    }

    #[tokio::test]
    async fn create_rejects_colors_outside_palette() {
        let pool = memory_pool().await.unwrap();
        let err = create_department_in_db(&pool, payload("SPA", Some("#000000")))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::Validation(_))));

        let ok = create_department_in_db(&pool, payload("GYM", Some("#6b7280"))).await.unwrap();
        assert_eq!(ok.color, "#6B7280");
    }

    #[tokio::test]
    async fn duplicate_codes_violate_uniqueness() {
        let pool = memory_pool().await.unwrap();
        let err = create_department_in_db(&pool, payload("rec", None)).await.unwrap_err();
        let is_unique = matches!(
            err.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        );
        assert!(is_unique);
    }

    #[tokio::test]
    async fn deactivated_departments_are_hidden_by_default() {
        let pool = memory_pool().await.unwrap();
        let spa = create_department_in_db(&pool, payload("SPA", None)).await.unwrap();
        assert!(deactivate_department_in_db(&pool, spa.id).await.unwrap());
        assert!(!deactivate_department_in_db(&pool, spa.id).await.unwrap());

        assert_eq!(list_departments_from_db(&pool, false).await.unwrap().len(), 5);
        assert_eq!(list_departments_from_db(&pool, true).await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn update_changes_only_given_fields() {
        let pool = memory_pool().await.unwrap();
        let spa = create_department_in_db(&pool, payload("SPA", None)).await.unwrap();
        let updated = update_department_in_db(
            &pool,
            spa.id,
            UpdateDepartmentPayload {
                name: Some("Wellness".to_string()),
                color: None,
                description: None,
                is_active: None,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(updated.name, "Wellness");
        assert_eq!(updated.color, spa.color);
        assert!(update_department_in_db(&pool, 999, UpdateDepartmentPayload {
            name: None,
            color: None,
            description: None,
            is_active: None,
        })
        .await
        .unwrap()
        .is_none());
    }
}
