// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::activity::actions;
use crate::models::{ActivityLogEntry, User};
use crate::routes::auth::USERNAME_RE;
use crate::services::{client_ip, password};
use crate::time_utils::{format_opt_utc_rfc3339, format_utc_rfc3339};
use crate::AppState;

pub(crate) const MAX_PER_PAGE: u32 = 100;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me).put(update_me))
        .route("/api/me/password", put(change_password))
        .route("/api/me/activities", get(my_activities))
}

// ─── Shared Response Types ───────────────────────────────────

/// User profile as exposed by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            is_admin: user.is_admin,
            is_active: user.is_active,
            created_at: format_utc_rfc3339(user.created_at),
            last_login: format_opt_utc_rfc3339(user.last_login),
        }
    }
}

/// Activity log entry as exposed by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: String,
}

impl From<ActivityLogEntry> for ActivityResponse {
    fn from(entry: ActivityLogEntry) -> Self {
        Self {
            id: entry.id,
            user_id: entry.user_id,
            action: entry.action,
            description: entry.description,
            ip_address: entry.ip_address,
            timestamp: format_utc_rfc3339(entry.timestamp),
        }
    }
}

/// Paginated activity listing.
#[derive(Serialize)]
pub struct ActivitiesPage {
    pub activities: Vec<ActivityResponse>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

// ─── Profile ─────────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse::from(profile)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileUpdateRequest {
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
}

/// Update the current user's profile.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(payload): Json<ProfileUpdateRequest>,
) -> Result<Json<UserResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    // Uniqueness checks must exclude the user's own row
    if state
        .db
        .email_taken(&payload.email, Some(user.user_id))
        .await?
    {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state
        .db
        .username_taken(&payload.username, Some(user.user_id))
        .await?
    {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let updated = state
        .db
        .update_profile(
            user.user_id,
            &payload.username,
            &payload.email,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
            payload.phone.as_deref(),
        )
        .await?;

    state
        .activity_log
        .log(
            Some(user.user_id),
            actions::PROFILE_UPDATE,
            Some("User updated profile information"),
            client_ip(&headers).as_deref(),
        )
        .await;

    Ok(Json(UserResponse::from(updated)))
}

// ─── Password Change ─────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub new_password: String,
}

#[derive(Serialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
}

/// Change the current user's password after re-verifying the old one.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    headers: HeaderMap,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    if !password::verify_password(&payload.current_password, &profile.password_hash) {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&payload.new_password)?;
    state.db.update_password_hash(user.user_id, &new_hash).await?;

    state
        .activity_log
        .log(
            Some(user.user_id),
            actions::PASSWORD_CHANGE,
            Some("User changed password"),
            client_ip(&headers).as_deref(),
        )
        .await;

    Ok(Json(ChangePasswordResponse { success: true }))
}

// ─── Own Activity ────────────────────────────────────────────

#[derive(Deserialize)]
struct MyActivitiesQuery {
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

/// The current user's recent activity, newest first.
async fn my_activities(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<MyActivitiesQuery>,
) -> Result<Json<ActivitiesPage>> {
    if params.page < 1 {
        return Err(AppError::BadRequest(
            "Page must be greater than 0".to_string(),
        ));
    }

    let per_page = params.per_page.min(MAX_PER_PAGE);
    let (entries, total) = state
        .db
        .list_activities_for_user(user.user_id, params.page, per_page)
        .await?;

    Ok(Json(ActivitiesPage {
        activities: entries.into_iter().map(ActivityResponse::from).collect(),
        page: params.page,
        per_page,
        total,
    }))
}
