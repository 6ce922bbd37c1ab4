//! Domain core of the expense tracker.
//!
//! [`Engine`] owns the database connection and exposes every operation the
//! HTTP layer needs: user registration and settings, category lookups,
//! owner-scoped income/expense CRUD, dashboard aggregation and the data for
//! the export report. Callers identify the acting user by id; the engine never
//! trusts a user id carried inside a request body.

pub use categories::Category;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    CategoryTotal, DAILY_SERIES_DAYS, DailyTotals, Dashboard, Engine, EngineBuilder, ExportReport,
    NewUser, SettingsChange,
};
pub use records::{Record, RecordFilter, RecordInput, RecordKind};
pub use users::{User, UserCredentials};

mod categories;
mod error;
mod money;
mod ops;
mod records;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
