//! Budget container lookup.
//!
//! Budgets are created on demand, one per `(user, month, year, type)`. The
//! create path inserts with `ON CONFLICT DO NOTHING` and reads back, so two
//! jobs racing for the same key end up sharing one row.

use crate::{
    entities::{Budget, BudgetType, budget},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use tracing::debug;

/// Finds the budget for a key, if it exists.
pub async fn find_budget<C>(
    db: &C,
    user_id: &str,
    month: u32,
    year: i32,
    budget_type: BudgetType,
) -> Result<Option<budget::Model>>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::Month.eq(month_column(month)?))
        .filter(budget::Column::Year.eq(year))
        .filter(budget::Column::BudgetType.eq(budget_type.as_str()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the budget for a key, creating it when missing.
///
/// Run this inside the same database transaction as the write that needs the
/// budget so a failure cannot leave one without the other.
pub async fn find_or_create_budget<C>(
    db: &C,
    user_id: &str,
    month: u32,
    year: i32,
    budget_type: BudgetType,
) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    if let Some(existing) = find_budget(db, user_id, month, year, budget_type).await? {
        return Ok(existing);
    }

    let new_budget = budget::ActiveModel {
        user_id: Set(user_id.to_string()),
        month: Set(month_column(month)?),
        year: Set(year),
        budget_type: Set(budget_type.as_str().to_string()),
        ..Default::default()
    };

    let inserted = Budget::insert(new_budget)
        .on_conflict(
            OnConflict::columns([
                budget::Column::UserId,
                budget::Column::Month,
                budget::Column::Year,
                budget::Column::BudgetType,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    debug!(
        "Budget {} {}/{} {} insert affected {} row(s)",
        user_id, month, year, budget_type, inserted
    );

    find_budget(db, user_id, month, year, budget_type)
        .await?
        .ok_or_else(|| Error::BudgetNotFound {
            user_id: user_id.to_string(),
            month,
            year,
            budget_type: budget_type.to_string(),
        })
}

/// Budget containing `date` for the given user and type, created on demand.
pub async fn budget_for_date<C>(
    db: &C,
    user_id: &str,
    date: NaiveDate,
    budget_type: BudgetType,
) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    find_or_create_budget(db, user_id, date.month(), date.year(), budget_type).await
}

fn month_column(month: u32) -> Result<i32> {
    if !(1..=12).contains(&month) {
        return Err(Error::Validation {
            reason: format!("month {month} is out of range"),
        });
    }
    i32::try_from(month).map_err(|_| Error::Validation {
        reason: format!("month {month} is out of range"),
    })
}
