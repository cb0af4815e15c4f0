//! HTTP trigger surface for the batch jobs.
//!
//! A scheduler calls `/api/cron/<job>` with the shared bearer secret; each call
//! runs the job once against the current time and answers with its report.

pub mod auth;
pub mod error;
pub mod routes;

use crate::{config::Settings, errors::Result, notify::Notifier};
use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Shared connection pool
    pub db: DatabaseConnection,
    /// Loaded settings
    pub settings: Arc<Settings>,
    /// Delivery for cleanup notifications
    pub notifier: Arc<dyn Notifier>,
    /// Expected bearer token on cron routes
    pub cron_secret: Arc<str>,
}

/// Builds the router: protected cron routes plus an open health check.
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    let cron = Router::new()
        .route(
            "/api/cron/materialize",
            get(routes::materialize).post(routes::materialize),
        )
        .route(
            "/api/cron/reconcile",
            get(routes::reconcile).post(routes::reconcile),
        )
        .route(
            "/api/cron/budget-guard",
            get(routes::budget_guard).post(routes::budget_guard),
        )
        .route(
            "/api/cron/cleanup",
            get(routes::cleanup).post(routes::cleanup),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_cron_secret,
        ));

    Router::new()
        .route("/health", get(routes::health))
        .merge(cron)
        .with_state(state)
}

/// Serves the router on `bind_addr` until Ctrl-C.
pub async fn serve(state: AppState, bind_addr: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
