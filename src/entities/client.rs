//! Client entity - A client-like record carrying a subscription definition.
//!
//! The `subscription_*` columns describe what gets billed and how often.
//! `subscription_cadence` is free text on purpose: unknown values are
//! handled by the cadence walker rather than rejected at load time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription status value for clients that should be billed
pub const SUBSCRIPTION_ACTIVE: &str = "ACTIVE";

/// Client database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns the client
    pub user_id: String,
    /// Client name, used to build the income source tag
    pub name: String,
    /// Declared budget type of incomes generated for this client
    pub budget_type: String,
    /// `"ACTIVE"`, `"PAUSED"` or `"CANCELLED"`
    pub subscription_status: String,
    /// Amount billed per cycle
    pub subscription_price: f64,
    /// First billing date
    pub subscription_start: Option<Date>,
    /// Last billing date, `None` for open-ended subscriptions
    pub subscription_end: Option<Date>,
    /// `"WEEKLY"`, `"MONTHLY"`, `"YEARLY"` or `"ONE_TIME"`
    pub subscription_cadence: Option<String>,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many generated incomes
    #[sea_orm(has_many = "super::income::Entity")]
    Incomes,
}

impl Related<super::income::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incomes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
