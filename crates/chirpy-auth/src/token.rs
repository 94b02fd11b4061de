//! Signed session tokens (HS256 JWT)
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)`.
//! The signature covers both the subject and the expiry, so altering either
//! invalidates the token. Nothing is stored server-side: validity is derived
//! from the token and the signing secret alone.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;

/// Issuer written into every token
pub const TOKEN_ISSUER: &str = "chirpy";

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration time (unix seconds, exclusive)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

impl TokenClaims {
    pub fn new(subject: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        // `exp` is an unsigned NumericDate on the wire; anything before the
        // epoch is stored as 0, which is always expired
        let exp = match issued_at.checked_add_signed(ttl) {
            Some(exp) => exp.timestamp().max(0),
            None if ttl < Duration::zero() => 0,
            None => i64::MAX,
        };

        Self {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp,
            iss: TOKEN_ISSUER.to_string(),
        }
    }

    /// A token is valid strictly before `exp`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Token errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Failed to sign token: {0}")]
    SigningFailed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Issues and validates session tokens with a shared HMAC secret
///
/// The codec only checks signature, structure and expiry. How long a token
/// should live is decided by the caller before calling [`TokenCodec::issue`].
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked by the codec against a single clock sample
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.set_issuer(&[TOKEN_ISSUER]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.signing_secret_bytes())
    }

    /// Sign a token for `subject` that expires `ttl` from now
    pub fn issue(&self, subject: Uuid, ttl: Duration) -> Result<String, TokenError> {
        self.issue_at(subject, ttl, Utc::now())
    }

    /// Sign a token with an explicit issue instant
    pub fn issue_at(
        &self,
        subject: Uuid,
        ttl: Duration,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(subject, issued_at, ttl);
        self.encode(&claims)
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::SigningFailed(e.to_string()))
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<Uuid, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token against the given instant
    ///
    /// Checks run in order: structure, signature, claims, expiry.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
        let claims = self.decode_claims(token)?;

        if claims.is_expired_at(now) {
            debug!(exp = claims.exp, "Token rejected: expired");
            return Err(TokenError::Expired);
        }

        Uuid::parse_str(&claims.sub)
            .map_err(|_| TokenError::Malformed("subject is not a valid user id".to_string()))
    }

    /// Verify the signature and decode claims without checking expiry
    pub fn decode_claims(&self, token: &str) -> Result<TokenClaims, TokenError> {
        if token.split('.').count() != 3 {
            return Err(TokenError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        }

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                let err = TokenError::from(e);
                debug!(error = %err, "Token rejected");
                err
            })?;

        Ok(token_data.claims)
    }
}

/// Sign a token with a raw secret
pub fn issue_token(subject: Uuid, secret: &[u8], ttl: Duration) -> Result<String, TokenError> {
    TokenCodec::new(secret).issue(subject, ttl)
}

/// Validate a token with a raw secret
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Uuid, TokenError> {
    TokenCodec::new(secret).validate(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    const TEST_SECRET: &[u8] = b"test_secret_key_1234567890";

    fn replace_segment(token: &str, index: usize, segment: &str) -> String {
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[index] = segment;
        parts.join(".")
    }

    #[test]
    fn test_issue_validate_round_trip() {
        let codec = TokenCodec::new(TEST_SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, Duration::hours(1)).unwrap();
        assert_eq!(token.split('.').count(), 3);

        assert_eq!(codec.validate(&token).unwrap(), user_id);
    }

    #[test]
    fn test_free_functions_round_trip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, b"secret", Duration::hours(1)).unwrap();

        assert_eq!(validate_token(&token, b"secret").unwrap(), user_id);
        assert_eq!(
            validate_token(&token, b"wrong_secret"),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_claims_contents() {
        let codec = TokenCodec::new(TEST_SECRET);
        let user_id = Uuid::new_v4();
        let issued_at = Utc::now();

        let token = codec
            .issue_at(user_id, Duration::minutes(30), issued_at)
            .unwrap();
        let claims = codec.decode_claims(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, TOKEN_ISSUER);
        assert_eq!(claims.iat, issued_at.timestamp());
        assert_eq!(claims.exp, issued_at.timestamp() + 30 * 60);
    }

    #[test]
    fn test_wrong_secret_is_bad_signature() {
        let user_id = Uuid::new_v4();
        let token = TokenCodec::new(b"secret")
            .issue(user_id, Duration::hours(1))
            .unwrap();

        let result = TokenCodec::new(b"wrong_secret").validate(&token);
        assert_eq!(result, Err(TokenError::BadSignature));
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let codec = TokenCodec::new(TEST_SECRET);
        let token = codec.issue(Uuid::new_v4(), -Duration::hours(1)).unwrap();

        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_ttl_reaching_before_epoch_is_expired() {
        let codec = TokenCodec::new(TEST_SECRET);
        let subject = Uuid::new_v4();

        let token = codec.issue(subject, -Duration::days(365 * 80)).unwrap();
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));

        let claims = TokenClaims::new(subject, Utc::now(), Duration::MIN);
        assert_eq!(claims.exp, 0);
        let token = codec.encode(&claims).unwrap();
        assert_eq!(codec.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let codec = TokenCodec::new(TEST_SECRET);
        let user_id = Uuid::new_v4();
        let issued_at = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();

        let token = codec
            .issue_at(user_id, Duration::seconds(60), issued_at)
            .unwrap();

        let just_before = issued_at + Duration::seconds(59);
        let at_expiry = issued_at + Duration::seconds(60);
        let after = issued_at + Duration::seconds(61);

        assert_eq!(codec.validate_at(&token, just_before).unwrap(), user_id);
        assert_eq!(
            codec.validate_at(&token, at_expiry),
            Err(TokenError::Expired)
        );
        assert_eq!(codec.validate_at(&token, after), Err(TokenError::Expired));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let codec = TokenCodec::new(TEST_SECRET);
        let now = Utc::now();
        let token = codec.issue_at(Uuid::new_v4(), Duration::zero(), now).unwrap();

        assert_eq!(codec.validate_at(&token, now), Err(TokenError::Expired));
    }

    #[test]
    fn test_tampered_subject_is_bad_signature() {
        let codec = TokenCodec::new(TEST_SECRET);
        let token = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        let mut claims = codec.decode_claims(&token).unwrap();
        claims.sub = Uuid::new_v4().to_string();
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        let tampered = replace_segment(&token, 1, &forged);
        assert_eq!(codec.validate(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_expiry_is_bad_signature() {
        let codec = TokenCodec::new(TEST_SECRET);
        let token = codec.issue(Uuid::new_v4(), -Duration::minutes(5)).unwrap();

        let mut claims = codec.decode_claims(&token).unwrap();
        claims.exp += 3600;
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        let tampered = replace_segment(&token, 1, &forged);
        assert_eq!(codec.validate(&tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_algorithm_is_bad_signature() {
        let claims = TokenClaims::new(Uuid::new_v4(), Utc::now(), Duration::hours(1));
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let codec = TokenCodec::new(TEST_SECRET);
        assert_eq!(codec.validate(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let codec = TokenCodec::new(TEST_SECRET);

        for token in ["", "abc", "abc.def", "abc.def.ghi", "a.b.c.d", "..."] {
            assert!(
                matches!(codec.validate(token), Err(TokenError::Malformed(_))),
                "token {:?} should be malformed",
                token
            );
        }
    }

    #[test]
    fn test_non_uuid_subject_is_malformed() {
        let codec = TokenCodec::new(TEST_SECRET);
        let mut claims = TokenClaims::new(Uuid::new_v4(), Utc::now(), Duration::hours(1));
        claims.sub = "not-a-uuid".to_string();

        let token = codec.encode(&claims).unwrap();
        assert!(matches!(
            codec.validate(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let codec = TokenCodec::new(TEST_SECRET);
        let mut claims = TokenClaims::new(Uuid::new_v4(), Utc::now(), Duration::hours(1));
        claims.iss = "someone-else".to_string();

        let token = codec.encode(&claims).unwrap();
        assert!(codec.validate(&token).is_err());
    }

    #[test]
    fn test_from_config_uses_signing_secret() {
        let config = AuthConfig::new("config-secret", "key");
        let codec = TokenCodec::from_config(&config);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, config.default_ttl).unwrap();
        assert_eq!(
            TokenCodec::new(b"config-secret").validate(&token).unwrap(),
            user_id
        );
    }
}
