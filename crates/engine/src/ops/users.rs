use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, User, UserCredentials, users,
    util::{map_unique_violation, normalize_optional_text, normalize_required},
};

use super::{Engine, with_tx};

const THEMES: [&str; 2] = ["light", "dark"];

/// Registration input. The password is already hashed by the caller.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
}

/// Settings update; `None` (or blank) leaves the stored value as is.
#[derive(Clone, Debug, Default)]
pub struct SettingsChange {
    pub currency: Option<String>,
    pub theme: Option<String>,
}

fn normalize_email(value: &str) -> ResultEngine<String> {
    let email = normalize_required(value, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(EngineError::InvalidInput(
            "email must contain '@'".to_string(),
        ));
    }
    Ok(email)
}

fn normalize_username(value: &str) -> ResultEngine<String> {
    let username = normalize_required(value, "username")?;
    // Login treats any identifier with '@' as an email.
    if username.contains('@') {
        return Err(EngineError::InvalidInput(
            "username must not contain '@'".to_string(),
        ));
    }
    Ok(username)
}

fn normalize_currency(value: &str) -> ResultEngine<String> {
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(EngineError::InvalidInput(format!(
            "invalid currency code: {value}"
        )));
    }
    Ok(value.to_ascii_uppercase())
}

fn normalize_theme(value: &str) -> ResultEngine<String> {
    let theme = value.to_ascii_lowercase();
    if !THEMES.contains(&theme.as_str()) {
        return Err(EngineError::InvalidInput(format!("invalid theme: {value}")));
    }
    Ok(theme)
}

impl Engine {
    /// Register a new user with the default currency and theme.
    ///
    /// Email is case-folded before the uniqueness check, so `Alice@x.io` and
    /// `alice@x.io` collide. Fails with `ExistingKey` naming the taken field
    /// (`email` or `username`); no row is written in that case.
    pub async fn register_user(&self, new_user: NewUser) -> ResultEngine<User> {
        let email = normalize_email(&new_user.email)?;
        let username = normalize_username(&new_user.username)?;
        if new_user.password_hash.is_empty() {
            return Err(EngineError::InvalidInput(
                "password hash must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let email_taken = users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if email_taken {
                return Err(EngineError::ExistingKey("email".to_string()));
            }

            let username_taken = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if username_taken {
                return Err(EngineError::ExistingKey("username".to_string()));
            }

            let now = Utc::now();
            let model = users::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                email: ActiveValue::Set(email),
                username: ActiveValue::Set(username),
                password_hash: ActiveValue::Set(new_user.password_hash),
                currency: ActiveValue::Set(users::DEFAULT_CURRENCY.to_string()),
                theme: ActiveValue::Set(users::DEFAULT_THEME.to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| map_unique_violation(err, "email or username"))?;

            tracing::info!(user_id = %model.id, "registered user");
            Ok(User::from(model))
        })
    }

    /// Find a user by email (when the identifier contains `@`) or username.
    ///
    /// Returns `None` when no user matches; the caller decides how to report it.
    pub async fn user_credentials(
        &self,
        email_or_username: &str,
    ) -> ResultEngine<Option<UserCredentials>> {
        let identifier = email_or_username.trim();
        let query = if identifier.contains('@') {
            users::Entity::find().filter(users::Column::Email.eq(identifier.to_lowercase()))
        } else {
            users::Entity::find().filter(users::Column::Username.eq(identifier))
        };

        Ok(query
            .one(&self.database)
            .await?
            .map(UserCredentials::from))
    }

    /// Return the user with the given id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))
    }

    /// Update the currency and/or theme of a user.
    pub async fn update_settings(&self, user_id: Uuid, change: SettingsChange) -> ResultEngine<User> {
        let currency = normalize_optional_text(change.currency.as_deref())
            .map(|value| normalize_currency(&value))
            .transpose()?;
        let theme = normalize_optional_text(change.theme.as_deref())
            .map(|value| normalize_theme(&value))
            .transpose()?;
        if currency.is_none() && theme.is_none() {
            return self.user(user_id).await;
        }

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user".to_string()))?;

            let mut active: users::ActiveModel = model.into();
            if let Some(currency) = currency {
                active.currency = ActiveValue::Set(currency);
            }
            if let Some(theme) = theme {
                active.theme = ActiveValue::Set(theme);
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }
}
