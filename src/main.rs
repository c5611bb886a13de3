// SPDX-License-Identifier: MIT

//! Userdeck API Server
//!
//! Serves the user administration dashboard: accounts, role-based access,
//! an append-only activity log and aggregate statistics.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use userdeck::{config::Config, db::Db, services::bootstrap, services::ActivityLogger, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Userdeck API");

    // Open the database, apply migrations and bootstrap the first admin
    let db = Db::connect(&config.database_url)
        .await
        .expect("Failed to open database");
    bootstrap::prepare_database(&db, &config)
        .await
        .expect("Failed to prepare database");

    let activity_log = ActivityLogger::new(db.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        activity_log,
    });

    // Build router
    let app = userdeck::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize logging. `LOG_FORMAT=json` switches to structured JSON
/// output for log collectors.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("userdeck=debug".parse().unwrap())
        .add_directive("info".parse().unwrap());

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        let format = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true);
        tracing_subscriber::registry().with(filter).with(format).init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
