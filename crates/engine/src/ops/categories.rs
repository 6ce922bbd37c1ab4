use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{Category, EngineError, RecordKind, ResultEngine, categories};

use super::Engine;

/// Outcome of resolving the category a record wants to reference.
///
/// Kept distinct internally so logs and tests can tell the cases apart; the
/// public API collapses every non-`Found` case into one `InvalidCategory`.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum CategoryLookup {
    Found(Category),
    Missing,
    KindMismatch { actual: RecordKind },
}

impl CategoryLookup {
    pub(super) fn into_result(self, expected: RecordKind) -> ResultEngine<Category> {
        match self {
            Self::Found(category) => Ok(category),
            Self::Missing => {
                tracing::debug!("record references a missing category");
                Err(EngineError::InvalidCategory(format!(
                    "invalid {} category",
                    expected.as_str()
                )))
            }
            Self::KindMismatch { actual } => {
                tracing::debug!(
                    expected = expected.as_str(),
                    actual = actual.as_str(),
                    "record references a category of the wrong kind"
                );
                Err(EngineError::InvalidCategory(format!(
                    "invalid {} category",
                    expected.as_str()
                )))
            }
        }
    }
}

impl Engine {
    /// List every category, ordered by kind and then name.
    pub async fn list_categories(&self) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .order_by_asc(categories::Column::Kind)
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// List the categories of one kind, ordered by name.
    pub async fn list_categories_by_kind(&self, kind: RecordKind) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Return a category by id.
    pub async fn category(&self, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
        Category::try_from(model)
    }

    pub(super) async fn lookup_category<C: ConnectionTrait>(
        db: &C,
        category_id: Uuid,
        expected: RecordKind,
    ) -> ResultEngine<CategoryLookup> {
        let Some(model) = categories::Entity::find_by_id(category_id).one(db).await? else {
            return Ok(CategoryLookup::Missing);
        };
        let category = Category::try_from(model)?;
        if category.kind != expected {
            return Ok(CategoryLookup::KindMismatch {
                actual: category.kind,
            });
        }
        Ok(CategoryLookup::Found(category))
    }
}
