//! Plan subscription entity - A user's paid plan for the budgeting app itself.
//!
//! The cleanup job walks these rows to send expiry warnings, block expired
//! accounts and purge data once the grace period is over.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Plan subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plan_subscriptions")]
pub struct Model {
    /// Unique identifier for the plan subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Subscribed user
    pub user_id: String,
    /// `"ACTIVE"`, `"BLOCKED"` or `"DELETED"`, see [`PlanStatus`]
    pub status: String,
    /// End of the paid period
    pub expires_at: DateTimeUtc,
    /// When the first (30 day) expiry warning went out
    pub warned_30_at: Option<DateTimeUtc>,
    /// When the final (7 day) expiry warning went out
    pub warned_7_at: Option<DateTimeUtc>,
    /// When the account was blocked for non-renewal
    pub blocked_at: Option<DateTimeUtc>,
}

/// Plan subscriptions are not linked to other tables
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Lifecycle of a plan subscription
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    /// Paid up, possibly already warned
    Active,
    /// Expired; data is kept until the grace period ends
    Blocked,
    /// User data has been purged
    Deleted,
}

impl PlanStatus {
    /// Stored representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Blocked => "BLOCKED",
            Self::Deleted => "DELETED",
        }
    }
}
