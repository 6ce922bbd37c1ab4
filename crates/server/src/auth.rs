//! Credential service and identity propagation.
//!
//! Passwords are stored as bcrypt hashes. Sessions are stateless HS256 JWTs
//! carrying the user id, email and username; the middleware trusts those
//! claims for the lifetime of the token and never looks the user up.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

const DUMMY_PASSWORD: &str = "not-a-real-password";

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Signing key and lifetimes, loaded once at startup.
#[derive(Clone)]
pub struct CredentialsConfig {
    pub secret: String,
    pub token_ttl: Duration,
    pub hash_cost: u32,
}

/// The authenticated caller, attached to the request by [`require_identity`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    email: String,
    username: String,
    iat: i64,
    exp: i64,
}

pub struct Credentials {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
    hash_cost: u32,
    dummy_hash: String,
}

impl Credentials {
    pub fn new(config: CredentialsConfig) -> Result<Self, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        // Compared against when the login identifier matches no user.
        let dummy_hash = bcrypt::hash(DUMMY_PASSWORD, config.hash_cost)?;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            token_ttl: config.token_ttl,
            hash_cost: config.hash_cost,
            dummy_hash,
        })
    }

    pub fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(password, self.hash_cost)?)
    }

    /// Check `password` against a stored hash.
    ///
    /// A hash that cannot be parsed is reported as a plain mismatch, after
    /// paying for a full bcrypt comparison so it takes as long as one.
    pub fn verify_password(&self, hash: &str, password: &str) -> bool {
        match bcrypt::verify(password, hash) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::error!("stored password hash is unusable: {err}");
                self.verify_dummy(password);
                false
            }
        }
    }

    /// Burn one bcrypt comparison. Used when there is no user to check against.
    pub fn verify_dummy(&self, password: &str) {
        let _ = bcrypt::verify(password, &self.dummy_hash);
    }

    pub fn issue_token(&self, identity: &Identity) -> Result<String, CredentialError> {
        self.issue_token_with_expiry(identity, Utc::now() + self.token_ttl)
    }

    pub fn issue_token_with_expiry(
        &self,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<String, CredentialError> {
        let claims = Claims {
            sub: identity.user_id,
            email: identity.email.clone(),
            username: identity.username.clone(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(CredentialError::Signing)
    }

    pub fn verify_token(&self, token: &str) -> Result<Identity, CredentialError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => CredentialError::Malformed,
                _ => CredentialError::Invalid,
            }
        })?;

        Ok(Identity {
            user_id: data.claims.sub,
            email: data.claims.email,
            username: data.claims.username,
        })
    }
}

/// Resolve the bearer token into an [`Identity`] or reject the request.
///
/// Missing header, wrong scheme and every token failure produce the same 401.
pub async fn require_identity(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(header) = request.headers().typed_get::<Authorization<Bearer>>() else {
        tracing::warn!(path = %request.uri().path(), "missing bearer token");
        return Err(ServerError::unauthorized());
    };

    let identity = state.credentials.verify_token(header.token()).map_err(|err| {
        tracing::warn!(path = %request.uri().path(), "rejected bearer token: {err}");
        ServerError::unauthorized()
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn credentials(secret: &str) -> Credentials {
        Credentials::new(CredentialsConfig {
            secret: secret.to_string(),
            token_ttl: Duration::hours(24),
            hash_cost: TEST_COST,
        })
        .unwrap()
    }

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn password_hash_verifies() {
        let creds = credentials("secret");
        let hash = creds.hash_password("hunter22").unwrap();
        assert!(creds.verify_password(&hash, "hunter22"));
        assert!(!creds.verify_password(&hash, "hunter23"));
    }

    #[test]
    fn malformed_hash_is_a_mismatch() {
        let creds = credentials("secret");
        assert!(!creds.verify_password("not-a-bcrypt-hash", "hunter22"));
    }

    #[test]
    fn token_carries_identity() {
        let creds = credentials("secret");
        let who = identity();
        let token = creds.issue_token(&who).unwrap();
        assert_eq!(creds.verify_token(&token).unwrap(), who);
    }

    #[test]
    fn token_from_other_key_is_invalid() {
        let token = credentials("one").issue_token(&identity()).unwrap();
        let err = credentials("two").verify_token(&token).unwrap_err();
        assert!(matches!(err, CredentialError::Invalid));
    }

    #[test]
    fn expired_token_is_rejected() {
        let creds = credentials("secret");
        let token = creds
            .issue_token_with_expiry(&identity(), Utc::now() - Duration::minutes(5))
            .unwrap();
        let err = creds.verify_token(&token).unwrap_err();
        assert!(matches!(err, CredentialError::Expired));
    }

    #[test]
    fn garbage_token_is_malformed() {
        let creds = credentials("secret");
        let err = creds.verify_token("definitely-not-a-jwt").unwrap_err();
        assert!(matches!(err, CredentialError::Malformed));
    }
}
