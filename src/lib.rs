use std::path::Path;
use std::sync::Arc;

use crate::model::{DatabaseError, DbConnection, ModelManager};
use crate::services::{
    mail::{Mailer, mailer_from_config},
    video::video_host_from_config,
};
use crate::utils::signal::shutdown_signal;
use crate::{error::AppResult, web::AppState};
use axum::Router;
use sqlx::migrate::Migrator;
use tokio::net::TcpListener;

pub mod config;
pub use config::{Config, ConfigError, ConfigResult};

pub mod auth;
pub mod error;
pub mod model;
pub mod services;
pub mod utils;
pub mod web;

static APPLICATION_NAME: &str = "coursekit";

/// Connects to the database, applies pending migrations and wires the
/// configured mailer and video host into the router.
pub async fn build_server() -> AppResult<(AppState, Router)> {
    let use_local = cfg!(debug_assertions);
    let config = Config::get_or_init(use_local).await;
    let db = DbConnection::connect(config.app().database_uri())?;

    tracing::debug!("applying migrations...");
    let migrator = Migrator::new(Path::new("./migrations"))
        .await
        .map_err(DatabaseError::from)?;
    migrator.run(db.pool()).await.map_err(DatabaseError::from)?;

    let mailer = mailer_from_config(config)?;
    let state = AppState::new(
        ModelManager::new(db),
        config,
        mailer,
        video_host_from_config(config),
    );

    Ok(build_server_with_state(state))
}

pub fn build_server_with_state(state: AppState) -> (AppState, Router) {
    let app = web::routes::build_app(state.clone());
    (state, app)
}

/// Router over an existing pool with the local config and the given mailer.
/// Migrations are left to the caller.
pub async fn build_server_with_pool(
    db: DbConnection,
    mailer: Arc<dyn Mailer>,
) -> AppResult<(AppState, Router)> {
    let config = Config::get_or_init(true).await;

    let state = AppState::new(
        ModelManager::new(db),
        config,
        mailer,
        video_host_from_config(config),
    );
    Ok(build_server_with_state(state))
}

#[tracing::instrument]
pub async fn setup_workers() -> AppResult<()> {
    let (state, app) = build_server().await?;
    let bindto = state.config().host().bindto();
    let listener = TcpListener::bind(bindto).await?;

    tracing::info!("axum is starting at: {}", bindto);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn setup_trace() {
    use tracing_error::ErrorLayer;
    use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

    // load .env file for RUST_LOG etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .with(ErrorLayer::default())
        .init();

    tracing::debug!("tracing initialized.");
}

#[tracing::instrument]
pub async fn run() -> AppResult<()> {
    setup_trace();
    setup_workers().await?;
    Ok(())
}
