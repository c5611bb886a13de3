// SPDX-License-Identifier: MIT

//! Admin routes: user management, activity log, dashboard statistics.
//!
//! All handlers here sit behind both the auth and the admin middleware.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::db::{RoleFilter, StatusFilter, UserListQuery};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::activity::actions;
use crate::models::stats::{build_user_growth, DashboardStats};
use crate::routes::api::{ActivitiesPage, ActivityResponse, UserResponse, MAX_PER_PAGE};
use crate::routes::auth::USERNAME_RE;
use crate::services::client_ip;
use crate::AppState;

const NEW_USER_WINDOW_DAYS: i64 = 30;
const RECENT_USERS: u32 = 5;
const RECENT_ACTIVITIES: u32 = 10;

/// Admin routes. Auth and admin middleware are applied in routes/mod.rs.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route(
            "/api/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/api/admin/activities", get(list_activities))
        .route("/api/admin/stats", get(get_stats))
        .route("/api/admin/dashboard", get(get_dashboard))
}

// ─── User Listing ────────────────────────────────────────────

#[derive(Deserialize)]
struct UserListParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    role: RoleFilter,
    #[serde(default)]
    status: StatusFilter,
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    10
}

#[derive(Serialize)]
pub struct UsersPage {
    pub users: Vec<UserResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// List users with search, role and status filters.
async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserListParams>,
) -> Result<Json<UsersPage>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }

    let per_page = params.per_page.min(MAX_PER_PAGE);
    let query = UserListQuery {
        search: params.search,
        role: params.role,
        status: params.status,
        page: params.page,
        per_page,
    };

    let (users, total) = state.db.list_users(&query).await?;

    Ok(Json(UsersPage {
        users: users.into_iter().map(UserResponse::from).collect(),
        page: params.page,
        per_page,
        total,
    }))
}

/// Get one user by id.
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(UserResponse::from(user)))
}

// ─── User Edit / Delete ──────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct AdminUserUpdateRequest {
    #[validate(
        length(min = 3, max = 20, message = "Username must be 3-20 characters"),
        regex(
            path = *USERNAME_RE,
            message = "Usernames must have only letters, numbers, dots or underscores"
        )
    )]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 10, max = 20))]
    pub phone: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
}

/// Edit a user, including role and status flags.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<AdminUserUpdateRequest>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.db.email_taken(&payload.email, Some(id)).await? {
        return Err(AppError::Conflict(
            "Email already exists for another user".to_string(),
        ));
    }
    if state.db.username_taken(&payload.username, Some(id)).await? {
        return Err(AppError::Conflict(
            "Username already exists for another user".to_string(),
        ));
    }

    let updated = state
        .db
        .admin_update_user(
            id,
            &payload.username,
            &payload.email,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
            payload.phone.as_deref(),
            payload.is_admin,
            payload.is_active,
        )
        .await?;

    state
        .activity_log
        .log(
            Some(admin.user_id),
            actions::USER_EDIT,
            Some(&format!("Edited user: {}", updated.username)),
            client_ip(&headers).as_deref(),
        )
        .await;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = updated.id,
        "User edited by admin"
    );

    Ok(Json(UserResponse::from(updated)))
}

#[derive(Serialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a user. Admins cannot delete their own account.
///
/// The user's activity rows are kept with a nulled user id.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<DeleteUserResponse>> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

    let username = user.username;
    state.db.delete_user(id).await?;

    state
        .activity_log
        .log(
            Some(admin.user_id),
            actions::USER_DELETE,
            Some(&format!("Deleted user: {}", username)),
            client_ip(&headers).as_deref(),
        )
        .await;

    tracing::info!(
        admin_id = admin.user_id,
        user_id = id,
        username = %username,
        "User deleted by admin"
    );

    Ok(Json(DeleteUserResponse {
        success: true,
        message: format!("User {} deleted", username),
    }))
}

// ─── Activity Log ────────────────────────────────────────────

#[derive(Deserialize)]
struct ActivityListParams {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_activity_per_page")]
    per_page: u32,
}

fn default_activity_per_page() -> u32 {
    20
}

/// All activity log entries, newest first.
async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ActivityListParams>,
) -> Result<Json<ActivitiesPage>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }

    let per_page = params.per_page.min(MAX_PER_PAGE);
    let (entries, total) = state.db.list_activities(params.page, per_page).await?;

    Ok(Json(ActivitiesPage {
        activities: entries.into_iter().map(ActivityResponse::from).collect(),
        page: params.page,
        per_page,
        total,
    }))
}

// ─── Statistics ──────────────────────────────────────────────

/// Aggregate user statistics for charts.
async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<DashboardStats>> {
    Ok(Json(gather_stats(&state).await?))
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_users: Vec<UserResponse>,
    pub recent_activities: Vec<ActivityResponse>,
}

/// Dashboard overview: stats plus the most recent users and activity.
async fn get_dashboard(State(state): State<Arc<AppState>>) -> Result<Json<DashboardResponse>> {
    let stats = gather_stats(&state).await?;
    let recent_users = state.db.recent_users(RECENT_USERS).await?;
    let recent_activities = state.db.recent_activities(RECENT_ACTIVITIES).await?;

    Ok(Json(DashboardResponse {
        stats,
        recent_users: recent_users.into_iter().map(UserResponse::from).collect(),
        recent_activities: recent_activities
            .into_iter()
            .map(ActivityResponse::from)
            .collect(),
    }))
}

async fn gather_stats(state: &Arc<AppState>) -> Result<DashboardStats> {
    let now = Utc::now();
    let total_users = state.db.count_users().await?;
    let active_users = state.db.count_active_users().await?;
    let admin_users = state.db.count_admin_users().await?;
    let new_users = state
        .db
        .count_users_created_since(now - Duration::days(NEW_USER_WINDOW_DAYS))
        .await?;

    // 366 days comfortably covers the 12 month buckets
    let counts = state
        .db
        .signup_counts_by_month(now - Duration::days(366))
        .await?;

    Ok(DashboardStats {
        total_users,
        active_users,
        admin_users,
        new_users,
        user_growth: build_user_growth(&counts, now),
    })
}
