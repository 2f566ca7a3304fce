// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{EmployeeRole, PageQuery};

/// A staff member. Employees are also the login accounts of the service.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub username: String,

    // Never leaves the server.
    #[serde(skip)]
    pub password_hash: String,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<i64>,
    pub role: EmployeeRole,
    pub phone: String,
    pub avatar_path: Option<String>,
    pub employee_number: Option<String>,
    pub hire_date: Option<NaiveDate>,

    /// Whether the employee can take new assignments.
    pub is_available: bool,

    /// Inactive employees cannot log in and are hidden from listings.
    pub is_active: bool,

    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.username.clone()
        } else {
            name.to_string()
        }
    }

    /// Whether `self` may see or act on `other`'s personal records.
    pub fn can_supervise(&self, other: &Employee) -> bool {
        self.role.supervises(other.role)
    }
}

#[derive(Deserialize, Debug, Validate)]
pub struct CreateEmployeePayload {
    #[validate(length(min = 3, max = 150, message = "Username must be 3 to 150 characters."))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
    #[validate(length(min = 1, message = "First name is required."))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required."))]
    pub last_name: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub department_id: Option<i64>,
    pub role: EmployeeRole,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub employee_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub bio: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Validate)]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    pub department_id: Option<i64>,
    pub role: Option<EmployeeRole>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub employee_number: Option<String>,
    pub hire_date: Option<NaiveDate>,
    pub bio: Option<String>,
    pub is_available: Option<bool>,
    pub is_active: Option<bool>,
}

/// The subset of fields an employee may change on their own profile.
#[derive(Deserialize, Debug, Default, Validate)]
pub struct ProfileUpdatePayload {
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub is_available: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
pub struct EmployeeQuery {
    pub department_id: Option<i64>,
    pub search: Option<String>,
    pub available: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl EmployeeQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub employee: Employee,
}

#[derive(Deserialize, Debug, Validate)]
pub struct ChangePasswordPayload {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub new_password: String,
}
