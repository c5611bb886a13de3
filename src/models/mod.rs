// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod activity;
pub mod stats;
pub mod user;

pub use activity::ActivityLogEntry;
pub use stats::{DashboardStats, MonthlySignups};
pub use user::{NewUser, User};
