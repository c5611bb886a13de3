// SPDX-License-Identifier: MIT

//! SQLite pool wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, filtered listing, aggregate counts)
//! - Activity log (append-only entries)
//!
//! All timestamps are stored as RFC3339 text in UTC, which keeps SQLite's
//! date functions and lexicographic ordering usable on the raw columns.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use crate::error::AppError;
use crate::models::{ActivityLogEntry, NewUser, User};

/// Role filter for the admin user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    User,
}

/// Account status filter for the admin user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// Filters and pagination for the admin user listing.
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    /// Substring match over username, email and names
    pub search: Option<String>,
    pub role: RoleFilter,
    pub status: StatusFilter,
    /// 1-indexed page number
    pub page: u32,
    pub per_page: u32,
}

/// SQLite database handle.
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Open (creating if missing) the database at `url` and connect a pool.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {}", e)))?;

        tracing::info!(url, "Connected to SQLite");

        Ok(Self { pool })
    }

    /// In-memory database for tests. A single connection keeps every
    /// operation on the same memory store.
    pub async fn connect_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Database(format!("Migration failed: {}", e)))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user account.
    pub async fn insert_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (username, email, password_hash, is_admin, is_active,
                 first_name, last_name, phone, created_at)
            VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.is_admin)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by id.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by email (login identifier).
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Check whether `email` is used by a user other than `exclude_id`.
    pub async fn email_taken(&self, email: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND id != IFNULL(?, -1)",
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Check whether `username` is used by a user other than `exclude_id`.
    pub async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE username = ? AND id != IFNULL(?, -1)",
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Update a user's own profile fields.
    pub async fn update_profile(
        &self,
        id: i64,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = ?, email = ?, first_name = ?, last_name = ?, phone = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        Ok(user)
    }

    /// Admin update: profile fields plus role and status flags.
    #[allow(clippy::too_many_arguments)]
    pub async fn admin_update_user(
        &self,
        id: i64,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        phone: Option<&str>,
        is_admin: bool,
        is_active: bool,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = ?, email = ?, first_name = ?, last_name = ?,
                phone = ?, is_admin = ?, is_active = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(phone)
        .bind(is_admin)
        .bind(is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        Ok(user)
    }

    /// Replace a user's password hash.
    pub async fn update_password_hash(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Record a successful login.
    pub async fn touch_last_login(&self, id: i64, when: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(when)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user account. Activity rows keep existing with a nulled
    /// user_id via the foreign key action.
    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Filtered, paginated user listing. Returns the page plus the total
    /// match count.
    pub async fn list_users(&self, query: &UserListQuery) -> Result<(Vec<User>, i64), AppError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        push_user_filters(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let page = query.page.max(1);
        let offset = (page as i64 - 1) * query.per_page as i64;

        let mut qb = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        push_user_filters(&mut qb, query);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        qb.push_bind(query.per_page as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok((users, total))
    }

    /// Most recently created accounts.
    pub async fn recent_users(&self, limit: u32) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    // ─── Aggregate Counts ────────────────────────────────────────

    pub async fn count_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_active_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_admin_users(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_admin = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Accounts created at or after `since`.
    pub async fn count_users_created_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Signups per month since `since`, keyed "YYYY-MM".
    pub async fn signup_counts_by_month(
        &self,
        since: DateTime<Utc>,
    ) -> Result<HashMap<String, i64>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) AS count
            FROM users
            WHERE created_at >= ?
            GROUP BY month
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    // ─── Activity Log Operations ─────────────────────────────────

    /// Append one activity log entry.
    pub async fn insert_activity(
        &self,
        user_id: Option<i64>,
        action: &str,
        description: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (user_id, action, description, ip_address, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(description)
        .bind(ip_address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// All activity entries, newest first, paginated.
    pub async fn list_activities(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<ActivityLogEntry>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log")
            .fetch_one(&self.pool)
            .await?;

        let offset = (page.max(1) as i64 - 1) * per_page as i64;
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT * FROM activity_log ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }

    /// One user's activity entries, newest first, paginated.
    pub async fn list_activities_for_user(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<ActivityLogEntry>, i64), AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_log WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let offset = (page.max(1) as i64 - 1) * per_page as i64;
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            r#"
            SELECT * FROM activity_log
            WHERE user_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }

    /// Most recent activity entries across all users.
    pub async fn recent_activities(&self, limit: u32) -> Result<Vec<ActivityLogEntry>, AppError> {
        let entries = sqlx::query_as::<_, ActivityLogEntry>(
            "SELECT * FROM activity_log ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

/// Append the WHERE clauses for the admin user listing filters.
fn push_user_filters<'a>(qb: &mut QueryBuilder<'a, sqlx::Sqlite>, query: &'a UserListQuery) {
    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() {
            let pattern = format!("%{}%", search);
            qb.push(" AND (username LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR first_name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR last_name LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
    }

    match query.role {
        RoleFilter::Admin => {
            qb.push(" AND is_admin = 1");
        }
        RoleFilter::User => {
            qb.push(" AND is_admin = 0");
        }
        RoleFilter::All => {}
    }

    match query.status {
        StatusFilter::Active => {
            qb.push(" AND is_active = 1");
        }
        StatusFilter::Inactive => {
            qb.push(" AND is_active = 0");
        }
        StatusFilter::All => {}
    }
}
