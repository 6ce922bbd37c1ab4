//! Shared category registry.
//!
//! Categories are seeded by the migration and are read-only at runtime. Each
//! one belongs to exactly one [`RecordKind`], and only records of that kind
//! may reference it.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, RecordKind, ResultEngine};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::records::Entity")]
    Records,
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub kind: RecordKind,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            kind: RecordKind::try_from(model.kind.as_str())?,
            id: model.id,
            name: model.name,
            created_at: model.created_at,
        })
    }
}
