//! User account model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User account row.
///
/// `password_hash` never leaves the persistence layer; API responses are
/// built from `UserResponse` in the route modules.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Unique login/display name
    pub username: String,
    /// Unique email address
    pub email: String,
    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role flag: admins see the management surface
    pub is_admin: bool,
    /// Deactivated accounts cannot authenticate
    pub is_active: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Most recent successful login
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Display name: "First Last" when both are set, else the username.
    pub fn full_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => self.username.clone(),
        }
    }
}

/// Fields required to create a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_user(first: Option<&str>, last: Option<&str>) -> User {
        User {
            id: 1,
            username: "jdoe".to_string(),
            email: "jdoe@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
            is_active: true,
            first_name: first.map(String::from),
            last_name: last.map(String::from),
            phone: None,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_full_name_uses_both_names() {
        let user = make_user(Some("Jane"), Some("Doe"));
        assert_eq!(user.full_name(), "Jane Doe");
    }

    #[test]
    fn test_full_name_falls_back_to_username() {
        assert_eq!(make_user(Some("Jane"), None).full_name(), "jdoe");
        assert_eq!(make_user(None, None).full_name(), "jdoe");
    }
}
