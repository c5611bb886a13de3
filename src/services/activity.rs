// SPDX-License-Identifier: MIT

//! Activity logging service.
//!
//! Every interesting user action gets one append-only row. Logging is
//! best-effort: a failed insert must never fail the request that caused
//! it, so errors are traced and swallowed here.

use axum::http::HeaderMap;

use crate::db::Db;

/// Records user and system actions in the activity log.
#[derive(Clone)]
pub struct ActivityLogger {
    db: Db,
}

impl ActivityLogger {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Record an action. `user_id` is `None` for system entries such as
    /// failed login attempts.
    pub async fn log(
        &self,
        user_id: Option<i64>,
        action: &str,
        description: Option<&str>,
        ip_address: Option<&str>,
    ) {
        if let Err(e) = self
            .db
            .insert_activity(user_id, action, description, ip_address)
            .await
        {
            tracing::warn!(
                error = %e,
                action,
                user_id,
                "Failed to record activity log entry"
            );
        }
    }
}

/// Extract the client address from proxy headers.
///
/// `X-Forwarded-For` may carry a comma-separated chain; the first hop is
/// the original client.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        let first = forwarded.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(client_ip(&headers), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));

        assert_eq!(client_ip(&headers), Some("198.51.100.4".to_string()));
    }

    #[test]
    fn test_client_ip_none_when_absent() {
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
