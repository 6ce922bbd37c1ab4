use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

use serde::Serialize;
pub use auth::{CredentialError, Credentials, CredentialsConfig, Identity};
pub use server::{ServerState, router, run_with_listener, spawn_with_listener};

mod auth;
mod categories;
mod dashboard;
mod export;
mod pdf;
mod records;
mod server;
mod user;

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
    Unauthorized(String),
    Internal(String),
}

impl ServerError {
    fn unauthorized() -> Self {
        Self::Unauthorized("unauthorized".to_string())
    }
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) | EngineError::NotFoundOrUnauthorized(_) => {
            StatusCode::NOT_FOUND
        }
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidCategory(_)
        | EngineError::InvalidInput(_)
        | EngineError::InvalidDate(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::ExistingKey(key) => format!("{key} already exists"),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
            ServerError::Unauthorized(err) => (StatusCode::UNAUTHORIZED, err),
            ServerError::Internal(err) => {
                tracing::error!("internal error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<CredentialError> for ServerError {
    fn from(value: CredentialError) -> Self {
        match value {
            CredentialError::Invalid | CredentialError::Expired | CredentialError::Malformed => {
                Self::unauthorized()
            }
            CredentialError::Hashing(_) | CredentialError::Signing(_) => {
                Self::Internal(value.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn not_found_or_unauthorized_maps_to_404() {
        let res = ServerError::from(EngineError::NotFoundOrUnauthorized("income".to_string()))
            .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_409() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn engine_validation_maps_to_422() {
        for err in [
            EngineError::InvalidAmount("x".to_string()),
            EngineError::InvalidCategory("x".to_string()),
            EngineError::InvalidInput("x".to_string()),
            EngineError::InvalidDate("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn database_error_maps_to_500() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn token_failures_map_to_401() {
        for err in [
            CredentialError::Invalid,
            CredentialError::Expired,
            CredentialError::Malformed,
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
