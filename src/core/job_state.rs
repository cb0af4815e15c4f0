//! Job run ledger.
//!
//! Records when each batch job last ran and what it reported, using the
//! key-value `job_state` table. Keys look like `last_run:materialize`.

use crate::{
    entities::{JobState, job_state},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};

/// Stored value of a `last_run:*` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    /// The `now` the job ran as of
    pub ran_at: DateTime<Utc>,
    /// The job's report as JSON
    pub summary: serde_json::Value,
}

fn last_run_key(job: &str) -> String {
    format!("last_run:{job}")
}

/// Retrieves a value from the `job_state` table.
pub async fn get_job_state_value<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    Ok(JobState::find()
        .filter(job_state::Column::Key.eq(key))
        .one(db)
        .await?
        .map(|state| state.value))
}

/// Sets or updates a value in the `job_state` table.
pub async fn set_job_state_value<C>(db: &C, key: &str, value: String, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = JobState::find()
        .filter(job_state::Column::Key.eq(key))
        .one(db)
        .await?;

    if let Some(state) = existing {
        // Update existing record
        let mut active_model: job_state::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        // Insert new record
        let new_state = job_state::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value),
            updated_at: Set(now),
            ..Default::default()
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Records that `job` ran at `ran_at` with the given summary.
pub async fn record_job_run<C, S>(db: &C, job: &str, ran_at: DateTime<Utc>, summary: &S) -> Result<()>
where
    C: ConnectionTrait,
    S: Serialize,
{
    let run = JobRun {
        ran_at,
        summary: serde_json::to_value(summary).map_err(|e| Error::Config {
            message: format!("Failed to serialize {job} summary: {e}"),
        })?,
    };
    let value = serde_json::to_string(&run).map_err(|e| Error::Config {
        message: format!("Failed to serialize {job} run: {e}"),
    })?;

    set_job_state_value(db, &last_run_key(job), value, ran_at).await
}

/// Last recorded run of `job`, if any.
pub async fn last_job_run<C>(db: &C, job: &str) -> Result<Option<JobRun>>
where
    C: ConnectionTrait,
{
    get_job_state_value(db, &last_run_key(job))
        .await?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|e| Error::Config {
                message: format!("Failed to parse last run of {job}: {e}"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::cleanup::CleanupReport;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_last_job_run_none() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(last_job_run(&db, "materialize").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_record_and_read_back() -> Result<()> {
        let db = setup_test_db().await?;
        let report = CleanupReport {
            warnings30: 2,
            warnings7: 1,
            blocked: 0,
            deleted: 0,
        };

        record_job_run(&db, "cleanup", at(2025, 1, 1, 6), &report).await?;

        let run = last_job_run(&db, "cleanup").await?.unwrap();
        assert_eq!(run.ran_at, at(2025, 1, 1, 6));
        assert_eq!(run.summary["warnings30"], 2);
        assert_eq!(run.summary["deleted"], 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_overwrites_previous_run() -> Result<()> {
        let db = setup_test_db().await?;

        record_job_run(&db, "reconcile", at(2025, 1, 1, 0), &serde_json::json!({"corrected": 1})).await?;
        record_job_run(&db, "reconcile", at(2025, 1, 2, 0), &serde_json::json!({"corrected": 0})).await?;

        let run = last_job_run(&db, "reconcile").await?.unwrap();
        assert_eq!(run.ran_at, at(2025, 1, 2, 0));

        // Verify only one record exists
        let count = JobState::find()
            .filter(job_state::Column::Key.eq("last_run:reconcile"))
            .count(&db)
            .await?;
        assert_eq!(count, 1);

        Ok(())
    }
}
