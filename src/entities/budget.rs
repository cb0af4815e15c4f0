//! Budget entity - The per-user, per-month container owning incomes,
//! expenses, bills and savings.
//!
//! A budget is unique per `(user_id, month, year, budget_type)`; the unique
//! index is created by the migrations.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: String,
    /// Calendar month, 1 through 12
    pub month: i32,
    /// Calendar year
    pub year: i32,
    /// `"PERSONAL"` or `"BUSINESS"`, see [`BudgetType`]
    pub budget_type: String,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One budget has many incomes
    #[sea_orm(has_many = "super::income::Entity")]
    Incomes,
    /// One budget has many expenses
    #[sea_orm(has_many = "super::expense::Entity")]
    Expenses,
    /// One budget has many bills
    #[sea_orm(has_many = "super::bill::Entity")]
    Bills,
    /// One budget has many savings
    #[sea_orm(has_many = "super::saving::Entity")]
    Savings,
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl Related<super::expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl Related<super::bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bills.def()
    }
}

impl Related<super::saving::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Savings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Parsed budget type, `None` if the stored value is unknown.
    #[must_use]
    pub fn kind(&self) -> Option<BudgetType> {
        BudgetType::parse(&self.budget_type)
    }
}

/// Whether a budget (or a subscription's declared owner) is personal or business.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetType {
    /// Household finances
    Personal,
    /// Business finances
    Business,
}

impl BudgetType {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Business => "BUSINESS",
        }
    }

    /// Parses a stored value, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PERSONAL" => Some(Self::Personal),
            "BUSINESS" => Some(Self::Business),
            _ => None,
        }
    }
}

impl std::fmt::Display for BudgetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
