// SPDX-License-Identifier: MIT

//! Activity log model.
//!
//! Entries are append-only: they are created when users act and never
//! mutated or deleted through the API. Rows survive the deletion of their
//! user (the foreign key is nulled).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One recorded user or system action.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActivityLogEntry {
    pub id: i64,
    /// Acting user; `None` for system entries (failed logins, bootstrap)
    /// and for entries whose user was since deleted.
    pub user_id: Option<i64>,
    /// Short action name, e.g. "Login", "User Edit"
    pub action: String,
    pub description: Option<String>,
    /// Client address the request came from
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Well-known action names recorded by the route handlers.
pub mod actions {
    pub const LOGIN: &str = "Login";
    pub const FAILED_LOGIN: &str = "Failed Login";
    pub const LOGOUT: &str = "Logout";
    pub const REGISTRATION: &str = "Registration";
    pub const PROFILE_UPDATE: &str = "Profile Update";
    pub const PASSWORD_CHANGE: &str = "Password Change";
    pub const USER_EDIT: &str = "User Edit";
    pub const USER_DELETE: &str = "User Delete";
    pub const BOOTSTRAP: &str = "Bootstrap";
}
