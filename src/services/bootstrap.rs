// SPDX-License-Identifier: MIT

//! Startup bootstrap: schema migration and initial admin creation.

use crate::config::Config;
use crate::db::Db;
use crate::error::AppError;
use crate::models::activity::actions;
use crate::models::NewUser;
use crate::services::password;

/// Ensure the schema exists and, on a fresh database, create the initial
/// admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD` when configured.
///
/// The admin is only created while the users table is empty, so an
/// existing deployment never gets surprise accounts from stale env vars.
pub async fn prepare_database(db: &Db, config: &Config) -> Result<(), AppError> {
    db.migrate().await?;

    let user_count = db.count_users().await?;
    tracing::info!(users = user_count, "Database ready");

    if user_count > 0 {
        return Ok(());
    }

    let (Some(email), Some(pwd)) = (&config.admin_email, &config.admin_password) else {
        tracing::warn!(
            "Users table is empty and no ADMIN_EMAIL/ADMIN_PASSWORD configured; \
             no account can log in until one is created"
        );
        return Ok(());
    };

    let username = config
        .admin_username
        .clone()
        .unwrap_or_else(|| "admin".to_string());

    let admin = db
        .insert_user(&NewUser {
            username,
            email: email.clone(),
            password_hash: password::hash_password(pwd)?,
            is_admin: true,
            first_name: None,
            last_name: None,
            phone: None,
        })
        .await?;

    db.insert_activity(
        None,
        actions::BOOTSTRAP,
        Some(&format!("Initial admin account created: {}", admin.username)),
        None,
    )
    .await?;

    tracing::info!(user_id = admin.id, email = %admin.email, "Bootstrap admin created");

    Ok(())
}
