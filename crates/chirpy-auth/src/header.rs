//! Authorization header parsing
//!
//! Two schemes share the same wire shape:
//!
//! ```text
//! Authorization: Bearer <token>     (user session tokens)
//! Authorization: ApiKey <key>       (server-to-server webhooks)
//! ```
//!
//! The scheme name is matched case-sensitively and must be followed by
//! whitespace. Any run of whitespace between scheme and credential is
//! accepted; the credential itself may not contain whitespace.

use http::{header::AUTHORIZATION, HeaderMap};
use thiserror::Error;
use tracing::debug;

/// Scheme used for user session tokens
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme used for the webhook shared key
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Header extraction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Authorization header is missing")]
    MissingHeader,

    #[error("Malformed Authorization header: {0}")]
    MalformedHeader(String),
}

/// Extract a bearer token from the `Authorization` header
///
/// # Example
/// ```
/// use chirpy_auth::header::extract_bearer_token;
/// use http::HeaderMap;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("Authorization", "Bearer    abc.def.ghi".parse().unwrap());
/// assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
/// ```
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, BEARER_SCHEME)
}

/// Extract the webhook API key from the `Authorization` header
pub fn extract_api_key(headers: &HeaderMap) -> Result<String, HeaderError> {
    extract_credential(headers, API_KEY_SCHEME)
}

fn extract_credential(headers: &HeaderMap, scheme: &str) -> Result<String, HeaderError> {
    // Only the first value counts; repeated headers are not merged
    let value = match headers.get(AUTHORIZATION) {
        Some(value) => value,
        None => return Err(HeaderError::MissingHeader),
    };

    let value = value.to_str().map_err(|_| {
        debug!("{} auth: header is not visible ASCII", scheme);
        HeaderError::MalformedHeader("header value is not valid ASCII".to_string())
    })?;

    if value.trim().is_empty() {
        return Err(HeaderError::MissingHeader);
    }

    parse_credential(value, scheme)
}

/// Split `<scheme><whitespace><credential>` and return the credential
fn parse_credential(value: &str, scheme: &str) -> Result<String, HeaderError> {
    let rest = value.strip_prefix(scheme).ok_or_else(|| {
        debug!("{} auth: wrong scheme", scheme);
        HeaderError::MalformedHeader(format!("expected '{} <credential>'", scheme))
    })?;

    if !rest.starts_with(char::is_whitespace) {
        debug!("{} auth: no separator after scheme", scheme);
        return Err(HeaderError::MalformedHeader(format!(
            "expected '{} <credential>'",
            scheme
        )));
    }

    let credential = rest.trim();
    if credential.is_empty() {
        return Err(HeaderError::MalformedHeader(format!(
            "no credential after '{}'",
            scheme
        )));
    }

    if credential.contains(char::is_whitespace) {
        return Err(HeaderError::MalformedHeader(
            "credential contains whitespace".to_string(),
        ));
    }

    Ok(credential.to_string())
}
