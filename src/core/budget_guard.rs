//! Budget-type guard.
//!
//! Recurring records (incomes, expenses, bills, savings) point at the record
//! they were copied from through `recurring_source_id`. A copy must live in a
//! budget of the same type (personal or business) as its parent. When it does
//! not, the copy is moved to the parent-typed budget for the same month and
//! year, which is created if needed.
//!
//! Subscription-generated incomes get the same treatment against the declared
//! budget type of their client.
//!
//! Each record kind is scanned independently so a failure in one scan is
//! reported without stopping the others. Dangling parents are counted as
//! orphans and skipped.

use crate::{
    core::budget::find_or_create_budget,
    entities::{Bill, Budget, BudgetType, Client, Expense, Income, Saving, bill, budget, expense, income, saving},
    errors::{Error, Result},
};
use sea_orm::{DatabaseTransaction, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};

/// Kinds of budget records that can be recurring copies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Row in `incomes`
    Income,
    /// Row in `expenses`
    Expense,
    /// Row in `bills`
    Bill,
    /// Row in `savings`
    Saving,
}

impl RecordKind {
    /// All kinds in scan order
    pub const ALL: [Self; 4] = [Self::Income, Self::Expense, Self::Bill, Self::Saving];

    /// Lowercase name used in logs and reports
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Bill => "bill",
            Self::Saving => "saving",
        }
    }
}

/// One record moved to another budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetFix {
    /// Kind of the moved record
    pub kind: RecordKind,
    /// Id of the moved record
    pub record_id: i64,
    /// Budget it was filed under
    pub from_budget_id: i64,
    /// Budget it now lives in
    pub to_budget_id: i64,
    /// Type of the destination budget
    pub budget_type: BudgetType,
}

/// A scan, or one record within it, that failed; everything else still ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFailure {
    /// Record kind or scan name, e.g. `"expense"` or `"subscription_income"`
    pub scan: String,
    /// Set when a single record failed rather than the whole scan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    /// Rendered error
    pub error: String,
}

/// Summary of a guard run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetGuardReport {
    /// Records moved to a correctly-typed budget
    pub fixed: usize,
    /// Records whose parent or budget could not be resolved
    pub orphans: usize,
    /// Every move made, in scan order
    pub fixes: Vec<BudgetFix>,
    /// Scans or records that could not be checked
    pub failures: Vec<ScanFailure>,
}

/// The parts of a record the guard needs, regardless of kind.
#[derive(Debug, Clone, Copy)]
struct Linked {
    id: i64,
    budget_id: i64,
    parent_id: i64,
}

/// Outcome of checking one record against its expected type.
enum Check {
    Matches,
    Orphan,
    Moved(BudgetFix),
}

/// Runs every scan and collects the fixes.
#[instrument(skip(db))]
pub async fn run_budget_guard(db: &DatabaseConnection) -> Result<BudgetGuardReport> {
    let mut report = BudgetGuardReport::default();

    for kind in RecordKind::ALL {
        match scan_recurring_kind(db, kind, &mut report).await {
            Ok(()) => {}
            Err(err) => {
                error!("Budget guard scan of {} records failed: {}", kind.as_str(), err);
                report.failures.push(ScanFailure {
                    scan: kind.as_str().to_string(),
                    record_id: None,
                    error: err.to_string(),
                });
            }
        }
    }

    if let Err(err) = scan_subscription_incomes(db, &mut report).await {
        error!("Budget guard scan of subscription incomes failed: {}", err);
        report.failures.push(ScanFailure {
            scan: SUBSCRIPTION_INCOME_SCAN.to_string(),
            record_id: None,
            error: err.to_string(),
        });
    }

    info!(
        "Budget guard fixed {} record(s), skipped {} orphan(s), {} scan failure(s)",
        report.fixed,
        report.orphans,
        report.failures.len()
    );

    Ok(report)
}

const SUBSCRIPTION_INCOME_SCAN: &str = "subscription_income";

async fn scan_recurring_kind(
    db: &DatabaseConnection,
    kind: RecordKind,
    report: &mut BudgetGuardReport,
) -> Result<()> {
    let children = linked_records(db, kind).await?;

    for child in children {
        match check_linked(db, kind, child).await {
            Ok(check) => record_check(report, check),
            Err(err) => record_failure(report, kind.as_str(), child.id, &err),
        }
    }

    Ok(())
}

/// Resolves the parent's budget type and moves `child` if it differs.
async fn check_linked(db: &DatabaseConnection, kind: RecordKind, child: Linked) -> Result<Check> {
    let Some(parent_budget_id) = budget_of(db, kind, child.parent_id).await? else {
        warn!(
            "{} {} references missing parent {}",
            kind.as_str(),
            child.id,
            child.parent_id
        );
        return Ok(Check::Orphan);
    };
    let Some(expected) = budget_type_of(db, parent_budget_id).await? else {
        return Ok(Check::Orphan);
    };

    ensure_budget_type(db, kind, child.id, child.budget_id, expected).await
}

async fn scan_subscription_incomes(db: &DatabaseConnection, report: &mut BudgetGuardReport) -> Result<()> {
    let declared: HashMap<i64, Option<BudgetType>> = Client::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, BudgetType::parse(&c.budget_type)))
        .collect();

    let generated = Income::find()
        .filter(income::Column::ClientId.is_not_null())
        .order_by_asc(income::Column::Id)
        .all(db)
        .await?;

    for record in generated {
        let Some(client_id) = record.client_id else {
            continue;
        };
        let Some(Some(expected)) = declared.get(&client_id).copied() else {
            report.orphans += 1;
            continue;
        };

        match ensure_budget_type(db, RecordKind::Income, record.id, record.budget_id, expected).await {
            Ok(check) => record_check(report, check),
            Err(err) => record_failure(report, SUBSCRIPTION_INCOME_SCAN, record.id, &err),
        }
    }

    Ok(())
}

fn record_failure(report: &mut BudgetGuardReport, scan: &str, record_id: i64, err: &Error) {
    error!("Budget guard could not check {} {}: {}", scan, record_id, err);
    report.failures.push(ScanFailure {
        scan: scan.to_string(),
        record_id: Some(record_id),
        error: err.to_string(),
    });
}

fn record_check(report: &mut BudgetGuardReport, check: Check) {
    match check {
        Check::Matches => {}
        Check::Orphan => report.orphans += 1,
        Check::Moved(fix) => {
            info!(
                "Moved {} {} from budget {} to {} budget {}",
                fix.kind.as_str(),
                fix.record_id,
                fix.from_budget_id,
                fix.budget_type,
                fix.to_budget_id
            );
            report.fixed += 1;
            report.fixes.push(fix);
        }
    }
}

/// Moves a record into the `expected`-typed budget of its month if needed.
///
/// Lookup, budget creation and the move share one transaction, which is
/// rolled back when any step fails.
async fn ensure_budget_type(
    db: &DatabaseConnection,
    kind: RecordKind,
    record_id: i64,
    budget_id: i64,
    expected: BudgetType,
) -> Result<Check> {
    let txn = db.begin().await?;

    match relocate(&txn, kind, record_id, budget_id, expected).await {
        Ok(check) => {
            txn.commit().await?;
            Ok(check)
        }
        Err(err) => {
            txn.rollback().await?;
            Err(err)
        }
    }
}

async fn relocate(
    txn: &DatabaseTransaction,
    kind: RecordKind,
    record_id: i64,
    budget_id: i64,
    expected: BudgetType,
) -> Result<Check> {
    let Some(current) = Budget::find_by_id(budget_id).one(txn).await? else {
        return Ok(Check::Orphan);
    };
    if current.kind() == Some(expected) {
        return Ok(Check::Matches);
    }

    let month = u32::try_from(current.month).unwrap_or(0);
    let target = find_or_create_budget(txn, &current.user_id, month, current.year, expected).await?;
    move_record(txn, kind, record_id, target.id).await?;

    Ok(Check::Moved(BudgetFix {
        kind,
        record_id,
        from_budget_id: current.id,
        to_budget_id: target.id,
        budget_type: expected,
    }))
}

async fn budget_type_of<C>(db: &C, budget_id: i64) -> Result<Option<BudgetType>>
where
    C: ConnectionTrait,
{
    Ok(Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .as_ref()
        .and_then(budget::Model::kind))
}

/// Every record of `kind` carrying a `recurring_source_id`.
async fn linked_records<C>(db: &C, kind: RecordKind) -> Result<Vec<Linked>>
where
    C: ConnectionTrait,
{
    let linked = match kind {
        RecordKind::Income => Income::find()
            .filter(income::Column::RecurringSourceId.is_not_null())
            .order_by_asc(income::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|m| m.recurring_source_id.map(|parent_id| Linked { id: m.id, budget_id: m.budget_id, parent_id }))
            .collect(),
        RecordKind::Expense => Expense::find()
            .filter(expense::Column::RecurringSourceId.is_not_null())
            .order_by_asc(expense::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|m| m.recurring_source_id.map(|parent_id| Linked { id: m.id, budget_id: m.budget_id, parent_id }))
            .collect(),
        RecordKind::Bill => Bill::find()
            .filter(bill::Column::RecurringSourceId.is_not_null())
            .order_by_asc(bill::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|m| m.recurring_source_id.map(|parent_id| Linked { id: m.id, budget_id: m.budget_id, parent_id }))
            .collect(),
        RecordKind::Saving => Saving::find()
            .filter(saving::Column::RecurringSourceId.is_not_null())
            .order_by_asc(saving::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .filter_map(|m| m.recurring_source_id.map(|parent_id| Linked { id: m.id, budget_id: m.budget_id, parent_id }))
            .collect(),
    };
    Ok(linked)
}

/// Budget id of the record `id` of `kind`, `None` if the record is gone.
async fn budget_of<C>(db: &C, kind: RecordKind, id: i64) -> Result<Option<i64>>
where
    C: ConnectionTrait,
{
    let budget_id = match kind {
        RecordKind::Income => Income::find_by_id(id).one(db).await?.map(|m| m.budget_id),
        RecordKind::Expense => Expense::find_by_id(id).one(db).await?.map(|m| m.budget_id),
        RecordKind::Bill => Bill::find_by_id(id).one(db).await?.map(|m| m.budget_id),
        RecordKind::Saving => Saving::find_by_id(id).one(db).await?.map(|m| m.budget_id),
    };
    Ok(budget_id)
}

async fn move_record<C>(db: &C, kind: RecordKind, id: i64, budget_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    match kind {
        RecordKind::Income => {
            income::ActiveModel {
                id: Set(id),
                budget_id: Set(budget_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        RecordKind::Expense => {
            expense::ActiveModel {
                id: Set(id),
                budget_id: Set(budget_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        RecordKind::Bill => {
            bill::ActiveModel {
                id: Set(id),
                budget_id: Set(budget_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        RecordKind::Saving => {
            saving::ActiveModel {
                id: Set(id),
                budget_id: Set(budget_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
    }
    Ok(())
}
