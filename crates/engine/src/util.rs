//! Internal helpers for input normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every entry point enforces the same invariants.

use chrono::NaiveDate;
use sea_orm::{DbErr, SqlErr};

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim a required text field, rejecting blank values.
pub(crate) fn normalize_required(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank values to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Record amounts must be strictly positive.
pub(crate) fn ensure_positive_amount(amount: MoneyCents) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount("amount must be > 0".to_string()));
    }
    Ok(())
}

/// Reject inclusive ranges whose start falls after their end.
pub(crate) fn ensure_ordered_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> ResultEngine<()> {
    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(EngineError::InvalidDate(format!(
            "start_date {start} is after end_date {end}"
        )));
    }
    Ok(())
}

/// Map a unique-constraint violation to `ExistingKey`, passing other errors through.
pub(crate) fn map_unique_violation(err: DbErr, key: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(key.to_string()),
        _ => EngineError::Database(err),
    }
}
