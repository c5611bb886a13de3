// SPDX-License-Identifier: MIT

//! Services module - business logic layer.

pub mod activity;
pub mod bootstrap;
pub mod password;

pub use activity::{client_ip, ActivityLogger};
