//! Process-wide authentication configuration

use chrono::Duration;
use secrecy::{ExposeSecret, SecretString};

/// Default session token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Upper bound callers apply to a requested token lifetime
pub const MAX_TOKEN_TTL_SECS: i64 = 60 * 60;

/// Authentication settings, loaded once at start-up and shared read-only
///
/// Secrets are wrapped in [`SecretString`] so they are redacted from `Debug`
/// output and zeroed on drop.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify session tokens
    pub signing_secret: SecretString,
    /// Shared key expected from the payment provider's webhook
    pub api_key: SecretString,
    /// Lifetime used when the caller does not request one
    pub default_ttl: Duration,
    /// Longest lifetime a caller may request
    pub max_ttl: Duration,
}

impl AuthConfig {
    pub fn new(signing_secret: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            signing_secret: SecretString::from(signing_secret.into()),
            api_key: SecretString::from(api_key.into()),
            default_ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
            max_ttl: Duration::seconds(MAX_TOKEN_TTL_SECS),
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_max_ttl(mut self, ttl: Duration) -> Self {
        self.max_ttl = ttl;
        self
    }

    /// Resolve a client-requested lifetime into the TTL passed to the codec
    ///
    /// Missing, zero or negative requests fall back to the default; anything
    /// longer than `max_ttl` is cut down to it. This is caller-side policy:
    /// the codec signs whatever TTL it is handed.
    pub fn clamp_ttl(&self, requested_secs: Option<i64>) -> Duration {
        match requested_secs {
            // Requests too large for a Duration are simply over the cap
            Some(secs) if secs > 0 => Duration::try_seconds(secs)
                .map_or(self.max_ttl, |ttl| ttl.min(self.max_ttl)),
            _ => self.default_ttl.min(self.max_ttl),
        }
    }

    pub(crate) fn signing_secret_bytes(&self) -> &[u8] {
        self.signing_secret.expose_secret().as_bytes()
    }
}
