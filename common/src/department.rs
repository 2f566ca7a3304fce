// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// A hotel department (direction, reception, housekeeping...).
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    /// Three uppercase letters, e.g. `REC`.
    pub code: String,
    pub name: String,
    /// Hex colour tag from the department palette.
    pub color: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateDepartmentPayload {
    #[validate(custom(function = "validate_department_code"))]
    pub code: String,
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters."))]
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct UpdateDepartmentPayload {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters."))]
    pub name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct DepartmentQuery {
    pub include_inactive: Option<bool>,
}

/// Codes are stored trimmed and uppercased.
pub fn normalize_department_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn validate_department_code(code: &str) -> Result<(), ValidationError> {
    let code = normalize_department_code(code);
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_code")
            .with_message("The code must be exactly 3 letters.".into()))
    }
}
