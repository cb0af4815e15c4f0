//! Status reconciliation for subscription-derived incomes.
//!
//! Generated incomes are the ones carrying a client and the source tag. One
//! dated in the future must be `PENDING` with no payment
//! date. Data corrections can move an already-paid income back into the
//! future; this pass rolls those back. When enabled it also settles pending
//! incomes whose date has arrived.

use crate::{
    config::JobSettings,
    entities::{Income, IncomeStatus, income},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Summary of a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    /// Future-dated subscription incomes inspected
    pub examined: usize,
    /// Incomes reset to `PENDING`
    pub corrected: usize,
    /// Past-due incomes moved to `PAID`
    pub promoted: usize,
    /// Ids of the incomes reset to `PENDING`
    pub corrected_ids: Vec<i64>,
}

/// Re-derives the status of every subscription-derived income from `now`.
#[instrument(skip(db, settings))]
pub async fn reconcile_statuses(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    settings: &JobSettings,
) -> Result<ReconcileReport> {
    let prefix = settings.subscription_source_prefix.as_str();
    let mut report = ReconcileReport::default();

    let future_incomes: Vec<_> = Income::find()
        .filter(income::Column::ClientId.is_not_null())
        .filter(income::Column::Source.starts_with(prefix))
        .filter(income::Column::Date.gt(now))
        .order_by_asc(income::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter(|i| is_generated(i, prefix))
        .collect();
    report.examined = future_incomes.len();

    for stale in future_incomes {
        let is_pending = IncomeStatus::parse(&stale.status) == Some(IncomeStatus::Pending);
        if is_pending && stale.payment_date.is_none() {
            continue;
        }

        debug!(
            "Resetting income {} dated {} from {} to PENDING",
            stale.id, stale.date, stale.status
        );
        let id = stale.id;
        let mut active_model: income::ActiveModel = stale.into();
        active_model.status = Set(IncomeStatus::Pending.as_str().to_string());
        active_model.payment_date = Set(None);
        active_model.update(db).await?;

        report.corrected += 1;
        report.corrected_ids.push(id);
    }

    if settings.promote_past_due {
        report.promoted = promote_past_due(db, now, prefix).await?;
    }

    info!(
        "Reconciler examined {} future income(s), corrected {}, promoted {}",
        report.examined, report.corrected, report.promoted
    );

    Ok(report)
}

/// SQLite `LIKE` ignores ASCII case and treats `%`/`_` as wildcards, so the
/// tag is re-checked exactly.
fn is_generated(income: &income::Model, prefix: &str) -> bool {
    income.client_id.is_some() && income.source.starts_with(prefix)
}

/// Marks due subscription incomes still pending as paid on their own date.
async fn promote_past_due(db: &DatabaseConnection, now: DateTime<Utc>, prefix: &str) -> Result<usize> {
    let due = Income::find()
        .filter(income::Column::ClientId.is_not_null())
        .filter(income::Column::Source.starts_with(prefix))
        .filter(income::Column::Date.lte(now))
        .filter(
            Condition::any()
                .add(income::Column::Status.eq(IncomeStatus::Pending.as_str()))
                .add(income::Column::PaymentDate.is_null()),
        )
        .all(db)
        .await?;

    let mut promoted = 0;
    for pending in due.into_iter().filter(|i| is_generated(i, prefix)) {
        let date = pending.date;
        let mut active_model: income::ActiveModel = pending.into();
        active_model.status = Set(IncomeStatus::Paid.as_str().to_string());
        active_model.payment_date = Set(Some(date));
        active_model.update(db).await?;
        promoted += 1;
    }

    Ok(promoted)
}
