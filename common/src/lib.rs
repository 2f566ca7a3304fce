// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Domain types shared by the hotel staff-operations server and its clients.
//!
//! Every record here maps one-to-one to a table row (`sqlx::FromRow`), every
//! status column is a text-encoded enum (`sqlx::Type`), and the business rules
//! that do not need the database (state transitions, derived amounts,
//! supervision scopes) live next to the types they govern so they can be
//! tested without a pool.

pub mod attendance;
pub mod cleaning;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod error;
pub mod leave;
pub mod maintenance;
pub mod reservation;
pub mod roles;
pub mod room;

pub use attendance::*;
pub use cleaning::*;
pub use dashboard::*;
pub use department::*;
pub use employee::*;
pub use error::DomainError;
pub use leave::*;
pub use maintenance::*;
pub use reservation::*;
pub use roles::EmployeeRole;
pub use room::*;

use serde::{Deserialize, Serialize};

/// Default page size of every paginated listing.
pub const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

/// `?page=&per_page=` query parameters shared by list endpoints.
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// One-based page number.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * self.limit()
    }
}

/// One page of a listing, with the total number of matching rows.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        Self {
            items,
            page: query.page(),
            per_page: query.per_page(),
            total,
        }
    }
}

/// Percentage of `part` over `total`, rounded to one decimal. Zero when `total` is zero.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((part as f64 / total as f64) * 1000.0).round() / 10.0
}
