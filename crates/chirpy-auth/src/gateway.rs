//! End-to-end request authorization

use chrono::{DateTime, Duration, Utc};
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::header::{extract_api_key, extract_bearer_token, HeaderError};
use crate::password::{PasswordError, PasswordHasher};
use crate::store::{CredentialStore, StoreError};
use crate::token::{TokenClaims, TokenCodec, TokenError};

/// Authorization failure
///
/// User authorization keeps the failing stage visible (`Header` or `Token`).
/// Service authorization collapses every failure into `Unauthorized`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginGrant {
    pub subject: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Composes header extraction, token validation and password checks
///
/// Holds no mutable state; one instance is shared by every request handler.
#[derive(Clone)]
pub struct AuthGateway {
    codec: TokenCodec,
    hasher: PasswordHasher,
    api_key: SecretString,
}

impl AuthGateway {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            codec: TokenCodec::from_config(config),
            hasher: PasswordHasher::default(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Authorize a user request from its `Authorization: Bearer` header
    pub fn authorize(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer_token(headers)?;
        let subject = self.codec.validate(&token)?;
        Ok(subject)
    }

    /// Authorize a server-to-server call carrying `Authorization: ApiKey`
    ///
    /// Missing header, malformed header and wrong key are indistinguishable
    /// to the caller.
    pub fn authorize_service_call(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let key = extract_api_key(headers).map_err(|e| {
            debug!(error = %e, "Service auth: key extraction failed");
            AuthError::Unauthorized
        })?;

        let expected = self.api_key.expose_secret().as_bytes();
        if expected.is_empty() || !bool::from(key.as_bytes().ct_eq(expected)) {
            debug!("Service auth: key mismatch");
            return Err(AuthError::Unauthorized);
        }

        Ok(())
    }

    /// Check an email/password pair and issue a token for `ttl`
    ///
    /// `ttl` must already be clamped by the caller
    /// (see [`AuthConfig::clamp_ttl`]).
    pub async fn login(
        &self,
        store: &dyn CredentialStore,
        email: &str,
        password: &str,
        ttl: Duration,
    ) -> Result<LoginGrant, AuthError> {
        let credential = match store.find_credential(email).await? {
            Some(credential) => credential,
            None => {
                debug!("Login rejected: unknown account");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let matches = self
            .hasher
            .verify(password, &credential.password_hash)
            .map_err(|e| {
                warn!(subject = %credential.subject, error = %e, "Stored password hash is unusable");
                e
            })?;

        if !matches {
            debug!(subject = %credential.subject, "Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let claims = TokenClaims::new(credential.subject, Utc::now(), ttl);
        let token = self.codec.encode(&claims)?;

        Ok(LoginGrant {
            subject: credential.subject,
            token,
            expires_at: claims.expires_at(),
        })
    }
}
