//! Creates every table from its entity definition.
//!
//! `Schema::create_table_from_entity` keeps column types and foreign keys in
//! step with the `DeriveEntityModel` structs.

use crate::entities::{Bill, Budget, Client, Expense, Income, JobState, PlanSubscription, Saving, User};
use sea_orm::{EntityTrait, Schema};
use sea_orm_migration::prelude::*;

/// Creates the tables
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        // Parents before children so foreign keys resolve
        create_from_entity(manager, &schema, User).await?;
        create_from_entity(manager, &schema, Client).await?;
        create_from_entity(manager, &schema, Budget).await?;
        create_from_entity(manager, &schema, Income).await?;
        create_from_entity(manager, &schema, Expense).await?;
        create_from_entity(manager, &schema, Bill).await?;
        create_from_entity(manager, &schema, Saving).await?;
        create_from_entity(manager, &schema, PlanSubscription).await?;
        create_from_entity(manager, &schema, JobState).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, JobState).await?;
        drop_table(manager, PlanSubscription).await?;
        drop_table(manager, Saving).await?;
        drop_table(manager, Bill).await?;
        drop_table(manager, Expense).await?;
        drop_table(manager, Income).await?;
        drop_table(manager, Budget).await?;
        drop_table(manager, Client).await?;
        drop_table(manager, User).await?;

        Ok(())
    }
}

async fn create_from_entity<E>(
    manager: &SchemaManager<'_>,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .create_table(schema.create_table_from_entity(entity).if_not_exists().to_owned())
        .await
}

async fn drop_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}
