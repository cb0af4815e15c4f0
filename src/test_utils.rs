//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.
#![allow(clippy::expect_used)]

use crate::{
    config::database,
    core::budget_guard::RecordKind,
    entities::{self, BudgetType, IncomeStatus, PlanStatus, client},
    errors::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all migrations applied.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::connect("sqlite::memory:").await?;
    database::run_migrations(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date.
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Shorthand for a UTC instant.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid test instant")
}

/// Creates a budget directly, bypassing find-or-create.
pub async fn create_test_budget(
    db: &DatabaseConnection,
    user_id: &str,
    month: i32,
    year: i32,
    budget_type: BudgetType,
) -> Result<entities::budget::Model> {
    entities::budget::ActiveModel {
        user_id: Set(user_id.to_string()),
        month: Set(month),
        year: Set(year),
        budget_type: Set(budget_type.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an active monthly business subscription with sensible defaults.
///
/// # Defaults
/// * `user_id`: `"user_1"`
/// * `price`: 100.0
/// * `cadence`: `"MONTHLY"`
/// * start 2025-01-15, end 2025-04-15
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
) -> Result<client::Model> {
    create_custom_client(
        db,
        name,
        BudgetType::Business,
        Some("MONTHLY"),
        Some(ymd(2025, 1, 15)),
        Some(ymd(2025, 4, 15)),
        100.0,
    )
    .await
}

/// Creates an active subscription with custom parameters.
pub async fn create_custom_client(
    db: &DatabaseConnection,
    name: &str,
    budget_type: BudgetType,
    cadence: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    price: f64,
) -> Result<client::Model> {
    client::ActiveModel {
        user_id: Set("user_1".to_string()),
        name: Set(name.to_string()),
        budget_type: Set(budget_type.as_str().to_string()),
        subscription_status: Set(client::SUBSCRIPTION_ACTIVE.to_string()),
        subscription_price: Set(price),
        subscription_start: Set(start),
        subscription_end: Set(end),
        subscription_cadence: Set(cadence.map(str::to_string)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates an income row directly, for setting up stale or leaked states.
pub async fn create_test_income(
    db: &DatabaseConnection,
    budget_id: i64,
    client_id: Option<i64>,
    date: DateTime<Utc>,
    source: &str,
    status: IncomeStatus,
    payment_date: Option<DateTime<Utc>>,
) -> Result<entities::income::Model> {
    entities::income::ActiveModel {
        budget_id: Set(budget_id),
        client_id: Set(client_id),
        amount: Set(100.0),
        date: Set(date),
        source: Set(source.to_string()),
        status: Set(status.as_str().to_string()),
        payment_date: Set(payment_date),
        recurring_source_id: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a record of any kind into `budget_id` and returns its id.
pub async fn create_linked_record(
    db: &DatabaseConnection,
    kind: RecordKind,
    budget_id: i64,
    recurring_source_id: Option<i64>,
) -> Result<i64> {
    let date = at(2025, 3, 10, 0);
    let id = match kind {
        RecordKind::Income => {
            entities::income::ActiveModel {
                budget_id: Set(budget_id),
                client_id: Set(None),
                amount: Set(250.0),
                date: Set(date),
                source: Set("Consulting".to_string()),
                status: Set(IncomeStatus::Paid.as_str().to_string()),
                payment_date: Set(Some(date)),
                recurring_source_id: Set(recurring_source_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        RecordKind::Expense => {
            entities::expense::ActiveModel {
                budget_id: Set(budget_id),
                name: Set("Software".to_string()),
                amount: Set(49.0),
                date: Set(date),
                recurring_source_id: Set(recurring_source_id),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        RecordKind::Bill => {
            entities::bill::ActiveModel {
                budget_id: Set(budget_id),
                name: Set("Rent".to_string()),
                amount: Set(1200.0),
                date: Set(date),
                recurring_source_id: Set(recurring_source_id),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
        RecordKind::Saving => {
            entities::saving::ActiveModel {
                budget_id: Set(budget_id),
                name: Set("Emergency fund".to_string()),
                amount: Set(300.0),
                date: Set(date),
                recurring_source_id: Set(recurring_source_id),
                ..Default::default()
            }
            .insert(db)
            .await?
            .id
        }
    };
    Ok(id)
}

/// Creates a user with a derived email address.
pub async fn create_test_user(db: &DatabaseConnection, user_id: &str) -> Result<entities::user::Model> {
    entities::user::ActiveModel {
        id: Set(user_id.to_string()),
        email: Set(format!("{user_id}@example.com")),
        name: Set(None),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Creates a plan subscription in the given state.
pub async fn create_plan_subscription(
    db: &DatabaseConnection,
    user_id: &str,
    status: PlanStatus,
    expires_at: DateTime<Utc>,
    blocked_at: Option<DateTime<Utc>>,
) -> Result<entities::plan_subscription::Model> {
    entities::plan_subscription::ActiveModel {
        user_id: Set(user_id.to_string()),
        status: Set(status.as_str().to_string()),
        expires_at: Set(expires_at),
        warned_30_at: Set(None),
        warned_7_at: Set(None),
        blocked_at: Set(blocked_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
