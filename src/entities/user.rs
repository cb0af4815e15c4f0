//! User entity - Account holders as known to the external auth provider.
//!
//! Only the contact details needed for plan notifications are kept here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Identifier issued by the auth provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Address used for expiry and blocking notifications
    pub email: String,
    /// Display name, if the user provided one
    pub name: Option<String>,
}

/// Users are referenced by `user_id` columns without foreign keys
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
