//! Income and expense records.
//!
//! Both kinds share one table and one shape; the `kind` column keeps them
//! apart and every query in the engine is scoped by it. A record is owned by
//! exactly one user for its whole life.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Income,
    Expense,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for RecordKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidCategory(format!(
                "invalid record kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub occurred_on: Date,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A stored record joined with its category display name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: RecordKind,
    pub category_id: Uuid,
    pub category_name: String,
    pub amount: MoneyCents,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<(Model, String)> for Record {
    type Error = EngineError;

    fn try_from((model, category_name): (Model, String)) -> ResultEngine<Self> {
        Ok(Self {
            kind: RecordKind::try_from(model.kind.as_str())?,
            id: model.id,
            user_id: model.user_id,
            category_id: model.category_id,
            category_name,
            amount: MoneyCents::new(model.amount_minor),
            description: model.description,
            date: model.occurred_on,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// The caller-controlled fields of a record, used for create and replace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordInput {
    pub category_id: Uuid,
    pub amount: MoneyCents,
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Optional list filters, combined with AND.
///
/// `start_date` and `end_date` are both inclusive. A `None` field places no
/// constraint on that column.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub category_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
