// SPDX-License-Identifier: MIT

//! Registration, login and logout routes.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, AuthUser, SESSION_COOKIE};
use crate::models::activity::actions;
use crate::models::NewUser;
use crate::routes::api::UserResponse;
use crate::services::{client_ip, password};
use crate::AppState;

/// Usernames start with a letter, then letters, digits, dots or
/// underscores.
pub(crate) static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z][A-Za-z0-9_.]*$").expect("valid username regex"));

/// Public authentication routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Routes that need an authenticated session.
pub fn session_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
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
    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub last_name: Option<String>,
    #[validate(length(min = 10, max = 20))]
    pub phone: Option<String>,
}

/// Create a new regular user account.
async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if state.db.email_taken(&payload.email, None).await? {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }
    if state.db.username_taken(&payload.username, None).await? {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let user = state
        .db
        .insert_user(&NewUser {
            username: payload.username,
            email: payload.email,
            password_hash: password::hash_password(&payload.password)?,
            // Self-registered accounts are never admins
            is_admin: false,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
        })
        .await?;

    state
        .activity_log
        .log(
            Some(user.id),
            actions::REGISTRATION,
            Some("New user account created"),
            client_ip(&headers).as_deref(),
        )
        .await;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Authenticate with email and password.
///
/// Issues a JWT both as an HttpOnly cookie and in the response body, so
/// browser and API clients can each pick their transport.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let ip = client_ip(&headers);

    let user = match state.db.get_user_by_email(&payload.email).await? {
        Some(user) if password::verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            // System entry: no user id for failed attempts
            state
                .activity_log
                .log(
                    None,
                    actions::FAILED_LOGIN,
                    Some(&format!(
                        "Failed login attempt for email: {}",
                        payload.email
                    )),
                    ip.as_deref(),
                )
                .await;
            return Err(AppError::Unauthorized);
        }
    };

    if !user.is_active {
        tracing::warn!(user_id = user.id, "Login rejected for deactivated account");
        return Err(AppError::Forbidden);
    }

    state.db.touch_last_login(user.id, chrono::Utc::now()).await?;
    state
        .activity_log
        .log(
            Some(user.id),
            actions::LOGIN,
            Some("User logged in successfully"),
            ip.as_deref(),
        )
        .await;

    let token = create_jwt(
        user.id,
        state.config.session_ttl_minutes,
        &state.config.jwt_signing_key,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub success: bool,
}

/// End the session. Clears the cookie; bearer tokens are discarded
/// client-side.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    state
        .activity_log
        .log(
            Some(user.user_id),
            actions::LOGOUT,
            Some("User logged out"),
            client_ip(&headers).as_deref(),
        )
        .await;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));

    Ok((jar, Json(LogoutResponse { success: true })))
}
