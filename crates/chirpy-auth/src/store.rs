//! Credential lookup consumed by the login flow

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// A stored credential: who it belongs to and their password hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Opaque identity of the account
    pub subject: Uuid,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// Failure of the backing store (database unreachable, query error, ...)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Credential store error: {0}")]
pub struct StoreError(pub String);

/// Source of credentials, keyed by login email
///
/// Implemented by the persistence layer; the auth core never talks to a
/// database directly.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the credential for `email`, or `None` if no account exists
    async fn find_credential(&self, email: &str) -> Result<Option<Credential>, StoreError>;
}
