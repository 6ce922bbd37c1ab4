pub use sea_orm_migration::prelude::*;

pub use m20260101_000001_seed_categories::{EXPENSE_CATEGORIES, INCOME_CATEGORIES};

mod m20260101_000000_init;
mod m20260101_000001_seed_categories;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000000_init::Migration),
            Box::new(m20260101_000001_seed_categories::Migration),
        ]
    }
}
