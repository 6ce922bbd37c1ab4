use chrono::{Months, NaiveDate};
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, Record, RecordFilter, RecordKind, ResultEngine, User, categories,
    records,
};

use super::{
    Engine,
    records::{ApplyRecordFilter, join_category, validate_filter},
};

/// Everything the printable report shows for one user and one period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub user: User,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub balance: MoneyCents,
    pub incomes: Vec<Record>,
    pub expenses: Vec<Record>,
}

/// Resolve the report period. A missing start defaults to one month before
/// `today` and a missing end to `today`.
fn report_period(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let start = match start {
        Some(start) => start,
        None => today
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| EngineError::InvalidDate(format!("one month before {today}")))?,
    };
    let end = end.unwrap_or(today);
    Ok((start, end))
}

impl Engine {
    /// Collect the user's records dated within `[start, end]` (inclusive) and
    /// their totals.
    ///
    /// Fails with `InvalidDate` when `start` is after `end`.
    pub async fn export_report(
        &self,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ResultEngine<ExportReport> {
        let (start, end) = report_period(start, end, today)?;
        let filter = RecordFilter {
            start_date: Some(start),
            end_date: Some(end),
            ..RecordFilter::default()
        };
        validate_filter(&filter)?;

        let user = self.user(user_id).await?;
        let incomes = self
            .records_in_period(RecordKind::Income, user_id, &filter)
            .await?;
        let expenses = self
            .records_in_period(RecordKind::Expense, user_id, &filter)
            .await?;

        let total_income: MoneyCents = incomes.iter().map(|record| record.amount).sum();
        let total_expense: MoneyCents = expenses.iter().map(|record| record.amount).sum();

        tracing::debug!(
            user_id = %user_id,
            %start,
            %end,
            incomes = incomes.len(),
            expenses = expenses.len(),
            "collected export report"
        );

        Ok(ExportReport {
            user,
            start,
            end,
            total_income,
            total_expense,
            balance: total_income - total_expense,
            incomes,
            expenses,
        })
    }

    async fn records_in_period(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        filter: &RecordFilter,
    ) -> ResultEngine<Vec<Record>> {
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
}
