use api_types::dashboard::{CategoryBreakdown, CategoryTotal, DailyTotals, DashboardSummary};
use axum::{Extension, Json, extract::State};

use crate::{ServerError, auth::Identity, server::ServerState};

fn map_category_total(total: engine::CategoryTotal) -> CategoryTotal {
    CategoryTotal {
        category_id: total.category_id,
        category: total.category,
        total: total.total.to_major(),
    }
}

fn map_daily(day: engine::DailyTotals) -> DailyTotals {
    DailyTotals {
        date: day.date,
        income: day.income.to_major(),
        expense: day.expense.to_major(),
    }
}

/// `GET /dashboard`, evaluated against the server's local date.
pub async fn summary(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<DashboardSummary>, ServerError> {
    let today = chrono::Local::now().date_naive();
    let dashboard = state.engine.dashboard(identity.user_id, today).await?;

    Ok(Json(DashboardSummary {
        total_income: dashboard.total_income.to_major(),
        total_expense: dashboard.total_expense.to_major(),
        balance: dashboard.balance.to_major(),
        today_income: dashboard.today_income.to_major(),
        today_expense: dashboard.today_expense.to_major(),
        monthly_income: dashboard.monthly_income.to_major(),
        monthly_expense: dashboard.monthly_expense.to_major(),
        daily_data: dashboard.daily.into_iter().map(map_daily).collect(),
        category_breakdown: CategoryBreakdown {
            income_by_category: dashboard
                .income_by_category
                .into_iter()
                .map(map_category_total)
                .collect(),
            expense_by_category: dashboard
                .expense_by_category
                .into_iter()
                .map(map_category_total)
                .collect(),
        },
    }))
}
