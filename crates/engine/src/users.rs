//! Users table.
//!
//! Emails are stored case-folded; the password hash is only ever read by the
//! server's credential check and never leaves the engine's `User` conversion.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

pub(crate) const DEFAULT_CURRENCY: &str = "USD";
pub(crate) const DEFAULT_THEME: &str = "light";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub currency: String,
    pub theme: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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

/// A registered user, without credentials.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub currency: String,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            username: model.username,
            currency: model.currency,
            theme: model.theme,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A user together with the stored password hash, for credential checks.
#[derive(Clone, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl From<Model> for UserCredentials {
    fn from(model: Model) -> Self {
        let password_hash = model.password_hash.clone();
        Self {
            user: User::from(model),
            password_hash,
        }
    }
}
