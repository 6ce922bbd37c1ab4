use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Record, RecordFilter, RecordInput, RecordKind, ResultEngine, categories, records,
    util::{ensure_ordered_range, ensure_positive_amount, normalize_optional_text},
};

use super::{Engine, with_tx};

/// Adds the optional `RecordFilter` constraints to a records query.
pub(super) trait ApplyRecordFilter: QueryFilter + Sized {
    fn apply_record_filter(self, filter: &RecordFilter) -> Self;
}

impl<T> ApplyRecordFilter for T
where
    T: QueryFilter + Sized,
{
    fn apply_record_filter(mut self, filter: &RecordFilter) -> Self {
        if let Some(category_id) = filter.category_id {
            self = self.filter(records::Column::CategoryId.eq(category_id));
        }
        if let Some(date) = filter.date {
            self = self.filter(records::Column::OccurredOn.eq(date));
        }
        if let Some(start) = filter.start_date {
            self = self.filter(records::Column::OccurredOn.gte(start));
        }
        if let Some(end) = filter.end_date {
            self = self.filter(records::Column::OccurredOn.lte(end));
        }
        self
    }
}

pub(super) fn validate_filter(filter: &RecordFilter) -> ResultEngine<()> {
    ensure_ordered_range(filter.start_date, filter.end_date)
}

fn not_found(kind: RecordKind) -> EngineError {
    EngineError::NotFoundOrUnauthorized(kind.as_str().to_string())
}

pub(super) fn join_category(
    rows: Vec<(records::Model, Option<categories::Model>)>,
) -> ResultEngine<Vec<Record>> {
    rows.into_iter()
        .map(|(record, category)| {
            let category = category
                .ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
            Record::try_from((record, category.name))
        })
        .collect()
}

impl Engine {
    /// Create a record of `kind` owned by `user_id`.
    ///
    /// The amount must be > 0 and the category must exist with the same kind
    /// as the record.
    pub async fn create_record(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        input: RecordInput,
    ) -> ResultEngine<Record> {
        ensure_positive_amount(input.amount)?;
        let description = normalize_optional_text(input.description.as_deref());

        with_tx!(self, |db_tx| {
            let category = Self::lookup_category(&db_tx, input.category_id, kind)
                .await?
                .into_result(kind)?;

            let now = Utc::now();
            let model = records::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                category_id: ActiveValue::Set(category.id),
                amount_minor: ActiveValue::Set(input.amount.cents()),
                description: ActiveValue::Set(description),
                occurred_on: ActiveValue::Set(input.date),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::debug!(record_id = %model.id, kind = kind.as_str(), "created record");
            Record::try_from((model, category.name))
        })
    }

    /// Return one of the user's records.
    pub async fn record(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        record_id: Uuid,
    ) -> ResultEngine<Record> {
        Self::find_record(&self.database, kind, user_id, record_id).await
    }

    /// List the user's records, newest date first and, within a date, newest
    /// created first.
    pub async fn list_records(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        filter: &RecordFilter,
    ) -> ResultEngine<Vec<Record>> {
        validate_filter(filter)?;

        let rows = records::Entity::find()
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::Kind.eq(kind.as_str()))
            .apply_record_filter(filter)
            .find_also_related(categories::Entity)
            .order_by_desc(records::Column::OccurredOn)
            .order_by_desc(records::Column::CreatedAt)
            .all(&self.database)
            .await?;

        join_category(rows)
    }

    /// Replace the caller-controlled fields of one of the user's records.
    ///
    /// The owner never changes. A record that does not exist and one owned by
    /// someone else both fail with `NotFoundOrUnauthorized`.
    pub async fn update_record(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        record_id: Uuid,
        input: RecordInput,
    ) -> ResultEngine<Record> {
        ensure_positive_amount(input.amount)?;
        let description = normalize_optional_text(input.description.as_deref());

        with_tx!(self, |db_tx| {
            Self::lookup_category(&db_tx, input.category_id, kind)
                .await?
                .into_result(kind)?;

            let result = records::Entity::update_many()
                .col_expr(records::Column::CategoryId, Expr::value(input.category_id))
                .col_expr(
                    records::Column::AmountMinor,
                    Expr::value(input.amount.cents()),
                )
                .col_expr(records::Column::Description, Expr::value(description))
                .col_expr(records::Column::OccurredOn, Expr::value(input.date))
                .col_expr(records::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(records::Column::Id.eq(record_id))
                .filter(records::Column::UserId.eq(user_id))
                .filter(records::Column::Kind.eq(kind.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(not_found(kind));
            }

            tracing::debug!(record_id = %record_id, kind = kind.as_str(), "updated record");
            Self::find_record(&db_tx, kind, user_id, record_id).await
        })
    }

    /// Delete one of the user's records.
    pub async fn delete_record(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        record_id: Uuid,
    ) -> ResultEngine<()> {
        let result = records::Entity::delete_many()
            .filter(records::Column::Id.eq(record_id))
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::Kind.eq(kind.as_str()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(not_found(kind));
        }

        tracing::debug!(record_id = %record_id, kind = kind.as_str(), "deleted record");
        Ok(())
    }

    async fn find_record<C: ConnectionTrait>(
        db: &C,
        kind: RecordKind,
        user_id: Uuid,
        record_id: Uuid,
    ) -> ResultEngine<Record> {
        let (record, category) = records::Entity::find_by_id(record_id)
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::Kind.eq(kind.as_str()))
            .find_also_related(categories::Entity)
            .one(db)
            .await?
            .ok_or_else(|| not_found(kind))?;

        let category =
            category.ok_or_else(|| EngineError::KeyNotFound("category".to_string()))?;
        Record::try_from((record, category.name))
    }
}
