//! Uniqueness guarantees the jobs rely on, plus lookup indexes.
//!
//! `idx_incomes_client_date` turns a racing second materialization of the same
//! billing date into a constraint violation instead of a duplicate row.

use crate::entities::{
    Bill, BillColumn, Budget, BudgetColumn, Expense, ExpenseColumn, Income, IncomeColumn, Saving,
    SavingColumn,
};
use sea_orm_migration::prelude::*;

/// Adds the unique and lookup indexes
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_budgets_user_month_year_type")
                    .table(Budget)
                    .col(BudgetColumn::UserId)
                    .col(BudgetColumn::Month)
                    .col(BudgetColumn::Year)
                    .col(BudgetColumn::BudgetType)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incomes_client_date")
                    .table(Income)
                    .col(IncomeColumn::ClientId)
                    .col(IncomeColumn::Date)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incomes_source_date")
                    .table(Income)
                    .col(IncomeColumn::Source)
                    .col(IncomeColumn::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_incomes_recurring_source")
                    .table(Income)
                    .col(IncomeColumn::RecurringSourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_recurring_source")
                    .table(Expense)
                    .col(ExpenseColumn::RecurringSourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_bills_recurring_source")
                    .table(Bill)
                    .col(BillColumn::RecurringSourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_savings_recurring_source")
                    .table(Saving)
                    .col(SavingColumn::RecurringSourceId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_savings_recurring_source").table(Saving).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_bills_recurring_source").table(Bill).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_expenses_recurring_source").table(Expense).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_incomes_recurring_source").table(Income).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_incomes_source_date").table(Income).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_incomes_client_date").table(Income).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_budgets_user_month_year_type").table(Budget).to_owned())
            .await?;
        Ok(())
    }
}
