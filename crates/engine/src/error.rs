//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidAmount`] thrown when a record amount is not strictly positive.
//! - [`InvalidCategory`] thrown when a record references a missing category
//!   or one of the wrong kind.
//! - [`NotFoundOrUnauthorized`] thrown when an owner-scoped update/delete
//!   matches no row. It deliberately does not say whether the record exists
//!   under another user.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InvalidCategory`]: EngineError::InvalidCategory
//!  [`NotFoundOrUnauthorized`]: EngineError::NotFoundOrUnauthorized
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid category: {0}")]
    InvalidCategory(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("{0} not found or unauthorized")]
    NotFoundOrUnauthorized(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidCategory(a), Self::InvalidCategory(b)) => a == b,
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::InvalidDate(a), Self::InvalidDate(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::NotFoundOrUnauthorized(a), Self::NotFoundOrUnauthorized(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
