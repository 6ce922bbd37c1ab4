use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned, de::IntoDeserializer};
use uuid::Uuid;

/// Query-string field where a blank value (`?date=`) means the filter is absent.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => T::deserialize(value.to_string().into_deserializer()).map(Some),
    }
}

/// Generic acknowledgement body (`{"message": "..."}`).
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub email: String,
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Login {
        /// Treated as an email when it contains `@`, otherwise as a username.
        pub email_or_username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub token: String,
        pub user: super::user::UserProfile,
        pub message: String,
    }
}

pub mod user {
    use super::*;

    /// Public view of a user. The password hash never leaves the server.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct UserProfile {
        pub id: Uuid,
        pub email: String,
        pub username: String,
        pub currency: String,
        pub theme: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Partial settings update; absent or blank fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SettingsUpdate {
        pub currency: Option<String>,
        pub theme: Option<String>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Income,
        Expense,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryQuery {
        #[serde(rename = "type", default, deserialize_with = "crate::blank_as_none")]
        pub kind: Option<CategoryKind>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        #[serde(rename = "type")]
        pub kind: CategoryKind,
        pub created_at: DateTime<Utc>,
    }
}

pub mod record {
    use super::*;

    /// Body for creating or replacing an income/expense record.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecordNew {
        pub category_id: Uuid,
        /// Decimal amount in major units (e.g. `12.50`).
        pub amount: f64,
        pub description: Option<String>,
        #[serde(alias = "income_date", alias = "expense_date")]
        pub date: NaiveDate,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct RecordView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub category_id: Uuid,
        pub category_name: String,
        pub amount: f64,
        pub description: Option<String>,
        pub date: NaiveDate,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Optional list filters. Every present field narrows the result.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecordQuery {
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub category_id: Option<Uuid>,
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub end_date: Option<NaiveDate>,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct DailyTotals {
        pub date: NaiveDate,
        pub income: f64,
        pub expense: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category_id: Uuid,
        pub category: String,
        pub total: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryBreakdown {
        pub income_by_category: Vec<CategoryTotal>,
        pub expense_by_category: Vec<CategoryTotal>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct DashboardSummary {
        pub total_income: f64,
        pub total_expense: f64,
        pub balance: f64,
        pub today_income: f64,
        pub today_expense: f64,
        pub monthly_income: f64,
        pub monthly_expense: f64,
        pub daily_data: Vec<DailyTotals>,
        pub category_breakdown: CategoryBreakdown,
    }
}

pub mod export {
    use super::*;

    /// Inclusive export range; missing bounds default to one month ago / today.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExportQuery {
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub start_date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "crate::blank_as_none")]
        pub end_date: Option<NaiveDate>,
    }
}
