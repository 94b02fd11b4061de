//! Authentication for the chirpy service
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`header`]: `Authorization: Bearer` / `Authorization: ApiKey` parsing
//! - [`token`]: HS256 session tokens with exclusive expiry
//! - [`gateway`]: request authorization and the login flow
//!
//! Every component is stateless; configuration is read once into
//! [`AuthConfig`] and shared by reference.

pub mod config;
pub mod gateway;
pub mod header;
pub mod password;
pub mod store;
pub mod token;

pub use config::AuthConfig;
pub use gateway::{AuthError, AuthGateway, LoginGrant};
pub use header::{extract_api_key, extract_bearer_token, HeaderError};
pub use password::{hash_password, verify_password, PasswordError, PasswordHasher};
pub use store::{Credential, CredentialStore, StoreError};
pub use token::{issue_token, validate_token, TokenClaims, TokenCodec, TokenError};

// Re-export useful types
pub use async_trait::async_trait;
