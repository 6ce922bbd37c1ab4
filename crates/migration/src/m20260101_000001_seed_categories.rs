//! Seeds the shared category list.
//!
//! Inserts are keyed on the unique category name, so running this against a
//! database that already holds some of the names leaves those rows untouched.

use chrono::Utc;
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use sea_orm_migration::{SchemaManagerConnection, prelude::*};
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

pub const INCOME_CATEGORIES: [&str; 4] = ["Salary", "Freelance", "Investment", "Other Income"];

pub const EXPENSE_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Rent",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Shopping",
    "Other Expense",
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = manager.get_database_backend();

        for name in INCOME_CATEGORIES {
            insert_category(db, backend, name, "income").await?;
        }
        for name in EXPENSE_CATEGORIES {
            insert_category(db, backend, name, "expense").await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = manager.get_database_backend();

        for name in INCOME_CATEGORIES.into_iter().chain(EXPENSE_CATEGORIES) {
            db.execute(Statement::from_sql_and_values(
                backend,
                "DELETE FROM categories WHERE name = ?;",
                vec![name.to_string().into()],
            ))
            .await?;
        }
        Ok(())
    }
}

async fn insert_category(
    db: &SchemaManagerConnection<'_>,
    backend: DbBackend,
    name: &str,
    kind: &str,
) -> Result<(), DbErr> {
    let values = vec![
        Uuid::new_v4().as_bytes().to_vec().into(),
        name.to_string().into(),
        kind.to_string().into(),
        Utc::now().into(),
    ];
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT OR IGNORE INTO categories (id, name, kind, created_at) VALUES (?, ?, ?, ?);",
        values,
    ))
    .await?;
    Ok(())
}
