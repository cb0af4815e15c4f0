//! Subscription income materialization.
//!
//! For every active client subscription this module walks the billing dates
//! and makes sure exactly one income exists per `(client, date)`. Re-running
//! it over the same range creates nothing new.
//!
//! Each missing date is written in its own database transaction covering both
//! the budget lookup/creation and the income insert. A unique index on
//! `(client_id, date)` backs the existence check: if a concurrent run wins the
//! race, the insert fails with a constraint violation and the date is counted
//! as already materialized.

use crate::{
    config::JobSettings,
    core::{
        budget::budget_for_date,
        cadence::{self, Cadence},
        clock,
    },
    entities::{BudgetType, Client, Income, IncomeStatus, client, income},
    errors::{Error, Result},
};
use chrono::{DateTime, Days, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

/// A validated subscription, ready to be walked.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPlan {
    /// Client carrying the subscription
    pub client_id: i64,
    /// Owner of the budgets incomes are booked into
    pub user_id: String,
    /// Declared budget type of the generated incomes
    pub budget_type: BudgetType,
    /// How often the subscription bills
    pub cadence: Cadence,
    /// Amount per billing date
    pub price: f64,
    /// First billing date
    pub start: NaiveDate,
    /// Last billing date; open-ended subscriptions run through today
    pub end: NaiveDate,
    /// Source tag written on every generated income
    pub source: String,
}

/// Why a subscription was skipped before anything was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Client whose subscription was rejected
    pub client_id: i64,
    /// Always `false`
    pub success: bool,
    /// Why the subscription was rejected
    pub reason: String,
}

impl ValidationFailure {
    fn new(client_id: i64, reason: impl Into<String>) -> Self {
        Self {
            client_id,
            success: false,
            reason: reason.into(),
        }
    }
}

/// A subscription whose materialization hit a storage error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientFailure {
    /// Client whose run failed
    pub client_id: i64,
    /// Rendered storage error
    pub error: String,
}

/// Result of materializing one subscription.
#[derive(Debug, Clone)]
pub enum ClientOutcome {
    /// Dates were walked; `created` holds the new incomes
    Materialized {
        /// Incomes inserted by this run
        created: Vec<income::Model>,
        /// Dates that already had an income
        already_present: usize,
    },
    /// Validation failed, nothing was written
    Invalid(ValidationFailure),
}

/// Result of one date's materialization attempt.
#[derive(Debug, Clone)]
pub enum Materialized {
    /// A new income was inserted
    Created(income::Model),
    /// The date already had an income
    AlreadyPresent,
}

/// Summary of a full materializer run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializeReport {
    /// Incomes created by this run
    pub created_count: usize,
    /// Billing dates that already had an income
    pub already_present_count: usize,
    /// Active subscriptions looked at
    pub clients_processed: usize,
    /// Subscriptions skipped by validation
    pub invalid: Vec<ValidationFailure>,
    /// Subscriptions that hit a storage error
    pub failed: Vec<ClientFailure>,
}

/// Builds the source tag for a client, e.g. `"Subscription: Acme"`.
#[must_use]
pub fn source_tag(prefix: &str, client_name: &str) -> String {
    format!("{prefix}{client_name}")
}

/// Initial status for an income dated `date`: paid once due, pending before.
#[must_use]
pub fn initial_status(
    date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> (IncomeStatus, Option<DateTime<Utc>>) {
    if date <= now {
        (IncomeStatus::Paid, Some(date))
    } else {
        (IncomeStatus::Pending, None)
    }
}

/// Checks a client's subscription fields before any mutation.
///
/// `today` closes open-ended subscriptions.
pub fn validate_subscription(
    client: &client::Model,
    today: NaiveDate,
    source_prefix: &str,
) -> std::result::Result<SubscriptionPlan, ValidationFailure> {
    let Some(start) = client.subscription_start else {
        return Err(ValidationFailure::new(client.id, "subscription start date is missing"));
    };
    let Some(raw_cadence) = client.subscription_cadence.as_deref() else {
        return Err(ValidationFailure::new(client.id, "subscription cadence is missing"));
    };
    if raw_cadence.trim().is_empty() {
        return Err(ValidationFailure::new(client.id, "subscription cadence is missing"));
    }
    if !client.subscription_price.is_finite() || client.subscription_price <= 0.0 {
        return Err(ValidationFailure::new(
            client.id,
            format!(
                "subscription price {} must be a positive amount",
                client.subscription_price
            ),
        ));
    }
    let Some(budget_type) = BudgetType::parse(&client.budget_type) else {
        return Err(ValidationFailure::new(
            client.id,
            format!("unknown budget type {:?}", client.budget_type),
        ));
    };

    let cadence = Cadence::from_stored(raw_cadence);
    let end = match (client.subscription_end, cadence) {
        (Some(end), _) => end,
        // A one-time charge needs no end date
        (None, Cadence::OneTime) => start,
        (None, _) => today,
    };

    if start > end {
        return Err(ValidationFailure::new(
            client.id,
            format!("subscription start {start} is after end {end}"),
        ));
    }

    Ok(SubscriptionPlan {
        client_id: client.id,
        user_id: client.user_id.clone(),
        budget_type,
        cadence,
        price: client.subscription_price,
        start,
        end,
        source: source_tag(source_prefix, &client.name),
    })
}

/// Whether an income for `client_id` already exists on `date`'s day.
///
/// Compares whole days so rows carrying a time of day still match.
pub async fn income_exists<C>(db: &C, client_id: i64, date: NaiveDate) -> Result<bool>
where
    C: ConnectionTrait,
{
    let day_start = clock::start_of_day(date);
    let next_day = date
        .checked_add_days(Days::new(1))
        .map_or(DateTime::<Utc>::MAX_UTC, clock::start_of_day);

    let count = Income::find()
        .filter(income::Column::ClientId.eq(client_id))
        .filter(income::Column::Date.gte(day_start))
        .filter(income::Column::Date.lt(next_day))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// Creates the income for one billing date inside a single transaction.
///
/// A unique-constraint violation means another run got there first and is
/// reported as [`Materialized::AlreadyPresent`].
pub(crate) async fn materialize_date(
    db: &DatabaseConnection,
    plan: &SubscriptionPlan,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Materialized> {
    let day = clock::start_of_day(date);
    let (status, payment_date) = initial_status(day, now);

    let txn = db.begin().await?;

    let budget = budget_for_date(&txn, &plan.user_id, date, plan.budget_type).await?;

    let new_income = income::ActiveModel {
        budget_id: Set(budget.id),
        client_id: Set(Some(plan.client_id)),
        amount: Set(plan.price),
        date: Set(day),
        source: Set(plan.source.clone()),
        status: Set(status.as_str().to_string()),
        payment_date: Set(payment_date),
        recurring_source_id: Set(None),
        created_at: Set(now),
        ..Default::default()
    };

    match new_income.insert(&txn).await.map_err(Error::from) {
        Ok(model) => {
            txn.commit().await?;
            debug!(
                "Created income {} for client {} on {} ({})",
                model.id,
                plan.client_id,
                date,
                status.as_str()
            );
            Ok(Materialized::Created(model))
        }
        Err(err) if err.is_unique_violation() => {
            txn.rollback().await?;
            debug!(
                "Income for client {} on {} was created concurrently",
                plan.client_id, date
            );
            Ok(Materialized::AlreadyPresent)
        }
        Err(err) => {
            txn.rollback().await?;
            Err(err)
        }
    }
}

/// Materializes every billing date of one client's subscription.
pub async fn materialize_client(
    db: &DatabaseConnection,
    client: &client::Model,
    now: DateTime<Utc>,
    settings: &JobSettings,
) -> Result<ClientOutcome> {
    let today = clock::service_date(now);
    let plan = match validate_subscription(client, today, &settings.subscription_source_prefix) {
        Ok(plan) => plan,
        Err(failure) => return Ok(ClientOutcome::Invalid(failure)),
    };

    let dates = match cadence::walk(plan.start, plan.end, plan.cadence, settings.max_occurrences) {
        Ok(dates) => dates,
        Err(Error::IterationCapExceeded { cap }) => {
            return Ok(ClientOutcome::Invalid(ValidationFailure::new(
                client.id,
                format!("{} cadence from {} to {} exceeds {cap} billing dates", plan.cadence, plan.start, plan.end),
            )));
        }
        Err(err) => return Err(err),
    };

    let mut created = Vec::new();
    let mut already_present = 0;

    for date in dates {
        if income_exists(db, plan.client_id, date).await? {
            already_present += 1;
            continue;
        }
        match materialize_date(db, &plan, date, now).await? {
            Materialized::Created(model) => created.push(model),
            Materialized::AlreadyPresent => already_present += 1,
        }
    }

    Ok(ClientOutcome::Materialized {
        created,
        already_present,
    })
}

/// Runs the materializer over every active subscription.
///
/// One bad subscription never blocks the rest: validation failures and
/// storage errors are collected in the report. Only failing to load the
/// subscriptions at all aborts the run.
#[instrument(skip(db, settings))]
pub async fn materialize_all(
    db: &DatabaseConnection,
    now: DateTime<Utc>,
    settings: &JobSettings,
) -> Result<MaterializeReport> {
    let clients = Client::find()
        .filter(client::Column::SubscriptionStatus.eq(client::SUBSCRIPTION_ACTIVE))
        .order_by_asc(client::Column::Id)
        .all(db)
        .await?;

    let mut report = MaterializeReport::default();

    for client in &clients {
        report.clients_processed += 1;
        match materialize_client(db, client, now, settings).await {
            Ok(ClientOutcome::Materialized {
                created,
                already_present,
            }) => {
                report.created_count += created.len();
                report.already_present_count += already_present;
            }
            Ok(ClientOutcome::Invalid(failure)) => {
                warn!(
                    "Skipping subscription of client {}: {}",
                    failure.client_id, failure.reason
                );
                report.invalid.push(failure);
            }
            Err(err) => {
                error!("Failed to materialize client {}: {}", client.id, err);
                report.failed.push(ClientFailure {
                    client_id: client.id,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        "Materializer created {} income(s) across {} subscription(s), {} already present",
        report.created_count, report.clients_processed, report.already_present_count
    );

    Ok(report)
}
