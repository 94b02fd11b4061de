//! Password hashing and verification using Argon2id
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`)
//! so the salt and cost parameters travel with the hash and no separate salt
//! column is needed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, Version,
};
use thiserror::Error;
use tracing::debug;

/// Error types for password operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    /// Stored hash is not a well-formed Argon2 PHC string
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

/// Argon2id hasher with a tunable work factor
///
/// Cost parameters only affect newly created hashes. Verification always uses
/// the parameters embedded in the stored hash, so raising the cost does not
/// invalidate existing credentials.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    /// Create a hasher with explicit cost parameters
    ///
    /// # Arguments
    /// * `memory_kib` - Memory cost in KiB
    /// * `iterations` - Time cost (number of passes)
    /// * `parallelism` - Degree of parallelism (lanes)
    pub fn with_params(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a password, producing a self-contained PHC string
    ///
    /// A fresh 16-byte salt is drawn from the OS RNG for every call.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    /// Verify a password against a stored hash
    ///
    /// # Returns
    /// * `Ok(true)` - Password matches hash
    /// * `Ok(false)` - Password does not match hash
    /// * `Err(PasswordError::InvalidHash)` - Stored hash is malformed or not Argon2
    ///
    /// The final digest comparison is constant-time.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Algorithm::try_from(parsed_hash.algorithm)
            .map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        if parsed_hash.hash.is_none() {
            return Err(PasswordError::InvalidHash("missing hash output".to_string()));
        }

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification: mismatch");
                Ok(false)
            }
            Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
        }
    }
}

impl Default for PasswordHasher {
    /// OWASP-recommended Argon2id defaults: 19 MiB memory, 2 iterations, 1 lane
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

/// Hash a password using Argon2id with default parameters
///
/// # Example
/// ```
/// use chirpy_auth::password::hash_password;
///
/// let hash = hash_password("MySecurePassword123!").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    PasswordHasher::default().hash(password)
}

/// Verify a password against a PHC hash string
///
/// # Example
/// ```
/// use chirpy_auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("MyPassword123!").unwrap();
/// assert!(verify_password("MyPassword123!", &hash).unwrap());
/// assert!(!verify_password("WrongPassword", &hash).unwrap());
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    PasswordHasher::default().verify(password, hash)
}
