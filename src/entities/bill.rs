//! Bill entity - Recurring obligations booked into a budget.
//!
//! Recurring copies point at their parent through `recurring_source_id`.
//! The column has no foreign key, so the parent may be gone.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Bill database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bills")]
pub struct Model {
    /// Unique identifier for the bill
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Budget this record is booked into
    pub budget_id: i64,
    /// Display name
    pub name: String,
    /// Amount in dollars
    pub amount: f64,
    /// Date the amount is booked on
    pub date: DateTimeUtc,
    /// Parent record this one was copied from
    pub recurring_source_id: Option<i64>,
}

/// Defines relationships between Bill and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each bill belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
