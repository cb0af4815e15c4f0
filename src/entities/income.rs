//! Income entity - Income records, including the ones generated from
//! client subscriptions.
//!
//! Generated incomes carry a `client_id` and a `source` starting with the
//! configured subscription tag. `(client_id, date)` is unique.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Income database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "incomes")]
pub struct Model {
    /// Unique identifier for the income
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Budget this income is booked into
    pub budget_id: i64,
    /// Client whose subscription generated this income
    pub client_id: Option<i64>,
    /// Income amount in dollars
    pub amount: f64,
    /// Billing date, normalized to the start of the day (UTC)
    pub date: DateTimeUtc,
    /// Human-readable source, e.g. `"Subscription: Acme"`
    pub source: String,
    /// `"PENDING"` or `"PAID"`, see [`IncomeStatus`]
    pub status: String,
    /// When the income was paid, only set while `PAID`
    pub payment_date: Option<DateTimeUtc>,
    /// Parent income this one was spawned from
    pub recurring_source_id: Option<i64>,
    /// When the row was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Income and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each income belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// Generated incomes belong to a client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment status of an income
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncomeStatus {
    /// Due in the future, or not yet settled
    Pending,
    /// Settled
    Paid,
}

impl IncomeStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
        }
    }

    /// Parses a stored value, ignoring case.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "PAID" => Some(Self::Paid),
            _ => None,
        }
    }
}
