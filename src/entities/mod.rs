//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod bill;
pub mod budget;
pub mod client;
pub mod expense;
pub mod income;
pub mod job_state;
pub mod plan_subscription;
pub mod saving;
pub mod user;

// Re-export specific types to avoid conflicts
pub use bill::{Column as BillColumn, Entity as Bill, Model as BillModel};
pub use budget::{BudgetType, Column as BudgetColumn, Entity as Budget, Model as BudgetModel};
pub use client::{Column as ClientColumn, Entity as Client, Model as ClientModel};
pub use expense::{Column as ExpenseColumn, Entity as Expense, Model as ExpenseModel};
pub use income::{Column as IncomeColumn, Entity as Income, IncomeStatus, Model as IncomeModel};
pub use job_state::{Column as JobStateColumn, Entity as JobState, Model as JobStateModel};
pub use plan_subscription::{
    Column as PlanSubscriptionColumn, Entity as PlanSubscription, Model as PlanSubscriptionModel,
    PlanStatus,
};
pub use saving::{Column as SavingColumn, Entity as Saving, Model as SavingModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
