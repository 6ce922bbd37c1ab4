//! Dashboard aggregation.
//!
//! Every figure is computed fresh from the records table on each call. The
//! queries of one dashboard are not wrapped in a transaction, so a write that
//! lands between two of them can show up in one figure and not the other.

use std::collections::HashMap;

use chrono::{Datelike, Days, Months, NaiveDate};
use sea_orm::{JoinType, QueryFilter, QuerySelect, RelationTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, RecordFilter, RecordKind, ResultEngine, categories, records,
};

use super::{Engine, records::ApplyRecordFilter};

/// Length of the dashboard trend series, in days.
pub const DAILY_SERIES_DAYS: u32 = 30;

/// Income and expense totals of a single calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub income: MoneyCents,
    pub expense: MoneyCents,
}

/// Sum of a user's records against one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category_id: Uuid,
    pub category: String,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub balance: MoneyCents,
    pub today_income: MoneyCents,
    pub today_expense: MoneyCents,
    pub monthly_income: MoneyCents,
    pub monthly_expense: MoneyCents,
    pub daily: Vec<DailyTotals>,
    pub income_by_category: Vec<CategoryTotal>,
    pub expense_by_category: Vec<CategoryTotal>,
}

fn sum_amount() -> sea_orm::sea_query::SimpleExpr {
    Expr::col((records::Entity, records::Column::AmountMinor)).sum()
}

/// First and last day of the month containing `day`.
fn month_bounds(day: NaiveDate) -> ResultEngine<(NaiveDate, NaiveDate)> {
    let invalid = || EngineError::InvalidDate(format!("no month bounds for {day}"));
    let first = NaiveDate::from_ymd_opt(day.year(), day.month(), 1).ok_or_else(invalid)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    Ok((first, last))
}

impl Engine {
    /// Sum of every record of `kind` owned by the user. Zero when there are none.
    pub async fn total(&self, kind: RecordKind, user_id: Uuid) -> ResultEngine<MoneyCents> {
        self.sum_records(kind, user_id, &RecordFilter::default())
            .await
    }

    /// Sum of the user's records of `kind` dated `day`.
    pub async fn total_on(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        day: NaiveDate,
    ) -> ResultEngine<MoneyCents> {
        let filter = RecordFilter {
            date: Some(day),
            ..RecordFilter::default()
        };
        self.sum_records(kind, user_id, &filter).await
    }

    /// Sum of the user's records of `kind` dated in the calendar month of `day`.
    pub async fn total_in_month(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        day: NaiveDate,
    ) -> ResultEngine<MoneyCents> {
        let (first, last) = month_bounds(day)?;
        let filter = RecordFilter {
            start_date: Some(first),
            end_date: Some(last),
            ..RecordFilter::default()
        };
        self.sum_records(kind, user_id, &filter).await
    }

    /// Per-day income and expense totals for the `days` days ending on `today`.
    ///
    /// Always returns exactly `days` entries in ascending date order; days
    /// without records are zero-filled.
    pub async fn daily_series(
        &self,
        user_id: Uuid,
        days: u32,
        today: NaiveDate,
    ) -> ResultEngine<Vec<DailyTotals>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .ok_or_else(|| EngineError::InvalidDate(format!("{days} days before {today}")))?;

        let rows: Vec<(NaiveDate, String, Option<i64>)> = records::Entity::find()
            .select_only()
            .column(records::Column::OccurredOn)
            .column(records::Column::Kind)
            .column_as(sum_amount(), "total")
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::OccurredOn.between(start, today))
            .group_by(records::Column::OccurredOn)
            .group_by(records::Column::Kind)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut by_day: HashMap<NaiveDate, DailyTotals> = HashMap::new();
        for (date, kind, total) in rows {
            let total = MoneyCents::new(total.unwrap_or(0));
            let entry = by_day.entry(date).or_insert(DailyTotals {
                date,
                income: MoneyCents::ZERO,
                expense: MoneyCents::ZERO,
            });
            match RecordKind::try_from(kind.as_str())? {
                RecordKind::Income => entry.income += total,
                RecordKind::Expense => entry.expense += total,
            }
        }

        Ok(start
            .iter_days()
            .take(days as usize)
            .map(|date| {
                by_day.get(&date).copied().unwrap_or(DailyTotals {
                    date,
                    income: MoneyCents::ZERO,
                    expense: MoneyCents::ZERO,
                })
            })
            .collect())
    }

    /// Totals per category of `kind`, largest first.
    ///
    /// Categories the user has no records against are left out rather than
    /// reported as zero. Ties are ordered by category name.
    pub async fn category_breakdown(
        &self,
        kind: RecordKind,
        user_id: Uuid,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let rows: Vec<(Uuid, String, Option<i64>)> = records::Entity::find()
            .select_only()
            .column(categories::Column::Id)
            .column(categories::Column::Name)
            .column_as(sum_amount(), "total")
            .join(JoinType::InnerJoin, records::Relation::Category.def())
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .group_by(categories::Column::Id)
            .group_by(categories::Column::Name)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut totals: Vec<CategoryTotal> = rows
            .into_iter()
            .map(|(category_id, category, total)| CategoryTotal {
                category_id,
                category,
                total: MoneyCents::new(total.unwrap_or(0)),
            })
            .filter(|row| row.total.is_positive())
            .collect();
        totals.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });
        Ok(totals)
    }

    /// Assemble the full dashboard for `today`.
    ///
    /// Any failing query aborts the whole summary.
    pub async fn dashboard(&self, user_id: Uuid, today: NaiveDate) -> ResultEngine<Dashboard> {
        let total_income = self.total(RecordKind::Income, user_id).await?;
        let total_expense = self.total(RecordKind::Expense, user_id).await?;
        let today_income = self.total_on(RecordKind::Income, user_id, today).await?;
        let today_expense = self.total_on(RecordKind::Expense, user_id, today).await?;
        let monthly_income = self
            .total_in_month(RecordKind::Income, user_id, today)
            .await?;
        let monthly_expense = self
            .total_in_month(RecordKind::Expense, user_id, today)
            .await?;
        let daily = self
            .daily_series(user_id, DAILY_SERIES_DAYS, today)
            .await?;
        let income_by_category = self
            .category_breakdown(RecordKind::Income, user_id)
            .await?;
        let expense_by_category = self
            .category_breakdown(RecordKind::Expense, user_id)
            .await?;

        Ok(Dashboard {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            today_income,
            today_expense,
            monthly_income,
            monthly_expense,
            daily,
            income_by_category,
            expense_by_category,
        })
    }

    async fn sum_records(
        &self,
        kind: RecordKind,
        user_id: Uuid,
        filter: &RecordFilter,
    ) -> ResultEngine<MoneyCents> {
        let total: Option<Option<i64>> = records::Entity::find()
            .select_only()
            .column_as(sum_amount(), "total")
            .filter(records::Column::UserId.eq(user_id))
            .filter(records::Column::Kind.eq(kind.as_str()))
            .apply_record_filter(filter)
            .into_tuple()
            .one(&self.database)
            .await?;

        Ok(MoneyCents::new(total.flatten().unwrap_or(0)))
    }
}
