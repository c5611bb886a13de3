//! Dashboard statistics for the admin overview.
//!
//! Counts come straight from aggregate queries; the 12-month signup series
//! is bucketed here so that empty months still appear in charts.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// Number of months covered by the signup growth series.
pub const GROWTH_MONTHS: u32 = 12;

/// Aggregate user statistics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    /// All accounts
    pub total_users: i64,
    /// Accounts with `is_active`
    pub active_users: i64,
    /// Accounts with `is_admin`
    pub admin_users: i64,
    /// Accounts created in the last 30 days
    pub new_users: i64,
    /// Signups per month, oldest first, always 12 entries
    pub user_growth: Vec<MonthlySignups>,
}

/// One month of the signup series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySignups {
    /// Human-readable label, e.g. "Aug 2026"
    pub month: String,
    pub count: i64,
}

/// Build the last-12-months signup series from per-month counts.
///
/// `counts` is keyed by "YYYY-MM" as produced by the signup aggregate
/// query. Months with no signups get a zero entry so the series always has
/// `GROWTH_MONTHS` points ending at the current month.
pub fn build_user_growth(counts: &HashMap<String, i64>, now: DateTime<Utc>) -> Vec<MonthlySignups> {
    let mut series = Vec::with_capacity(GROWTH_MONTHS as usize);

    for offset in (0..GROWTH_MONTHS).rev() {
        let (year, month) = months_back(now.year(), now.month(), offset);
        let key = format!("{:04}-{:02}", year, month);
        let count = counts.get(&key).copied().unwrap_or(0);
        series.push(MonthlySignups {
            month: month_label(year, month),
            count,
        });
    }

    series
}

/// Step `offset` months back from (year, month).
fn months_back(year: i32, month: u32, offset: u32) -> (i32, u32) {
    // month is 1-based; work in 0-based months for the arithmetic
    let total = year as i64 * 12 + (month as i64 - 1) - offset as i64;
    ((total.div_euclid(12)) as i32, (total.rem_euclid(12) + 1) as u32)
}

/// "Aug 2026"-style label for a month.
fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%b %Y").to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}
