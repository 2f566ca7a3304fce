// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! JSON API for the daily operations of a hotel's staff: attendance,
//! leaves, rooms, reservations, housekeeping and maintenance.

pub mod auth;
pub mod colors;
pub mod config;
pub mod database;
pub mod handlers;
pub mod media;
pub mod rollover;
pub mod routes;
pub mod state;
