//! Account endpoints: registration, login, profile and settings.

use api_types::{
    auth::{AuthResponse, Login, Register},
    user::{SettingsUpdate, UserProfile},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use engine::{EngineError, NewUser, SettingsChange, User};

use crate::{ServerError, auth::Identity, server::ServerState};

const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn to_profile(user: User) -> UserProfile {
    UserProfile {
        id: user.id,
        email: user.email,
        username: user.username,
        currency: user.currency,
        theme: user.theme,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

fn identity_of(user: &User) -> Identity {
    Identity {
        user_id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
    }
}

fn invalid_credentials() -> ServerError {
    ServerError::Unauthorized("invalid credentials".to_string())
}

/// Run a bcrypt operation off the async executor.
async fn blocking<T, F>(job: F) -> Result<T, ServerError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| ServerError::Internal(format!("blocking task failed: {err}")))
}

pub async fn register(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<Register>, ServerError>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    let credentials = state.credentials.clone();
    let password = payload.password;
    let password_hash = blocking(move || credentials.hash_password(&password)).await??;

    let user = state
        .engine
        .register_user(NewUser {
            email: payload.email,
            username: payload.username,
            password_hash,
        })
        .await?;
    let token = state.credentials.issue_token(&identity_of(&user))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: to_profile(user),
            message: "user registered successfully".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<Login>, ServerError>,
) -> Result<Json<AuthResponse>, ServerError> {
    if payload.email_or_username.trim().is_empty() || payload.password.is_empty() {
        return Err(EngineError::InvalidInput(
            "email/username and password are required".to_string(),
        )
        .into());
    }

    let found = state
        .engine
        .user_credentials(&payload.email_or_username)
        .await?;

    let credentials = state.credentials.clone();
    let password = payload.password;
    let (user, verified) = match found {
        Some(found) => {
            let hash = found.password_hash;
            let verified =
                blocking(move || credentials.verify_password(&hash, &password)).await?;
            (Some(found.user), verified)
        }
        None => {
            blocking(move || credentials.verify_dummy(&password)).await?;
            (None, false)
        }
    };

    let Some(user) = user.filter(|_| verified) else {
        tracing::warn!("failed login attempt");
        return Err(invalid_credentials());
    };

    let token = state.credentials.issue_token(&identity_of(&user))?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        token,
        user: to_profile(user),
        message: "login successful".to_string(),
    }))
}

pub async fn profile(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
) -> Result<Json<UserProfile>, ServerError> {
    let user = state.engine.user(identity.user_id).await?;
    Ok(Json(to_profile(user)))
}

pub async fn update_settings(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): WithRejection<Json<SettingsUpdate>, ServerError>,
) -> Result<Json<UserProfile>, ServerError> {
    let user = state
        .engine
        .update_settings(
            identity.user_id,
            SettingsChange {
                currency: payload.currency,
                theme: payload.theme,
            },
        )
        .await?;
    Ok(Json(to_profile(user)))
}
