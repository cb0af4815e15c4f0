//! Versioned schema migrations.
//!
//! Every table and index is created here and nowhere else. The binary applies
//! pending migrations once at startup through [`Migrator`].

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_tables;
mod m20250101_000002_add_indexes;

/// Runner for all schema migrations, applied in declaration order
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_tables::Migration),
            Box::new(m20250101_000002_add_indexes::Migration),
        ]
    }
}
