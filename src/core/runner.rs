//! Dispatches a named job and records its run.

use crate::{
    config::Settings,
    core::{
        budget_guard::{BudgetGuardReport, run_budget_guard},
        cleanup::{CleanupReport, run_cleanup},
        job_state::record_job_run,
        materializer::{MaterializeReport, materialize_all},
        reconciler::{ReconcileReport, reconcile_statuses},
        report,
    },
    errors::{Error, Result},
    notify::Notifier,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// The batch jobs the service can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Generate subscription incomes
    Materialize,
    /// Repair income statuses
    Reconcile,
    /// Move records into correctly-typed budgets
    BudgetGuard,
    /// Advance plan subscriptions towards warning, blocking and deletion
    Cleanup,
}

impl Job {
    /// Every job, in the order they are usually scheduled
    pub const ALL: [Self; 4] = [
        Self::Materialize,
        Self::Reconcile,
        Self::BudgetGuard,
        Self::Cleanup,
    ];

    /// Name used on the command line, in routes and in the run ledger
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Materialize => "materialize",
            Self::Reconcile => "reconcile",
            Self::BudgetGuard => "budget-guard",
            Self::Cleanup => "cleanup",
        }
    }

    /// Looks a job up by its [`Job::as_str`] name.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|job| job.as_str() == name)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Unknown job '{name}'. Expected one of: materialize, reconcile, budget-guard, cleanup"
                ),
            })
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report produced by whichever job ran. Serializes as the bare report.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum JobSummary {
    /// Report of [`Job::Materialize`]
    Materialize(MaterializeReport),
    /// Report of [`Job::Reconcile`]
    Reconcile(ReconcileReport),
    /// Report of [`Job::BudgetGuard`]
    BudgetGuard(BudgetGuardReport),
    /// Report of [`Job::Cleanup`]
    Cleanup(CleanupReport),
}

impl JobSummary {
    /// Human-readable rendering for the command line.
    #[must_use]
    pub fn format(&self) -> String {
        match self {
            Self::Materialize(r) => report::format_materialize_summary(r),
            Self::Reconcile(r) => report::format_reconcile_summary(r),
            Self::BudgetGuard(r) => report::format_budget_guard_summary(r),
            Self::Cleanup(r) => report::format_cleanup_summary(r),
        }
    }
}

/// Runs `job` once as of `now`.
///
/// The run is recorded in the job ledger afterwards. A ledger write failure
/// is logged and does not fail the job.
pub async fn run_job(
    db: &DatabaseConnection,
    settings: &Settings,
    notifier: &dyn Notifier,
    job: Job,
    now: DateTime<Utc>,
) -> Result<JobSummary> {
    info!("Running job {job} as of {now}");

    let summary = match job {
        Job::Materialize => {
            JobSummary::Materialize(materialize_all(db, now, &settings.jobs).await?)
        }
        Job::Reconcile => {
            JobSummary::Reconcile(reconcile_statuses(db, now, &settings.jobs).await?)
        }
        Job::BudgetGuard => JobSummary::BudgetGuard(run_budget_guard(db).await?),
        Job::Cleanup => {
            JobSummary::Cleanup(run_cleanup(db, notifier, now, &settings.cleanup).await?)
        }
    };

    if let Err(e) = record_job_run(db, job.as_str(), now, &summary).await {
        warn!("Failed to record run of {job}: {e}");
    }

    Ok(summary)
}
