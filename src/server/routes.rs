//! Route handlers. Each cron handler runs its job as of the request time.

use super::{AppState, error::ApiError};
use crate::core::runner::{Job, JobSummary, run_job};
use axum::{Json, extract::State};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;

async fn trigger(state: &AppState, job: Job) -> Result<Json<JobSummary>, ApiError> {
    let summary = run_job(
        &state.db,
        &state.settings,
        state.notifier.as_ref(),
        job,
        Utc::now(),
    )
    .await?;
    Ok(Json(summary))
}

/// `/api/cron/materialize`
pub async fn materialize(State(state): State<Arc<AppState>>) -> Result<Json<JobSummary>, ApiError> {
    trigger(&state, Job::Materialize).await
}

/// `/api/cron/reconcile`
pub async fn reconcile(State(state): State<Arc<AppState>>) -> Result<Json<JobSummary>, ApiError> {
    trigger(&state, Job::Reconcile).await
}

/// `/api/cron/budget-guard`
pub async fn budget_guard(State(state): State<Arc<AppState>>) -> Result<Json<JobSummary>, ApiError> {
    trigger(&state, Job::BudgetGuard).await
}

/// `/api/cron/cleanup`
pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<JobSummary>, ApiError> {
    trigger(&state, Job::Cleanup).await
}

/// `/health`, unauthenticated liveness check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
