// SPDX-License-Identifier: MIT

//! Userdeck: user administration dashboard API
//!
//! This crate provides the backend API for managing user accounts,
//! recording an append-only activity log and serving dashboard
//! statistics to privileged users.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Db;
use services::ActivityLogger;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Db,
    pub activity_log: ActivityLogger,
}
