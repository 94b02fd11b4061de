//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use chirpy_db::entities::{chirp, user};

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
        }
    }

    pub fn with_code(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: Some(code.to_string()),
        }
    }
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// User ID
    pub id: Uuid,
    /// Email address
    pub email: String,
    /// Whether the user has a Chirpy Red membership
    pub is_chirpy_red: bool,
    /// Account creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for User {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            is_chirpy_red: model.is_chirpy_red,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// User registration request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// User email address
    pub email: String,
    /// User password
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email address
    pub email: String,
    /// User password
    pub password: String,
    /// Requested token lifetime; capped at one hour
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

/// User login response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Logged in user
    #[serde(flatten)]
    pub user: User,
    /// Bearer token for authenticated endpoints
    pub token: String,
    /// Token expiration
    pub expires_at: DateTime<Utc>,
}

/// A single chirp
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Chirp {
    /// Chirp ID
    pub id: Uuid,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Cleaned chirp text
    pub body: String,
    /// Author
    pub user_id: Uuid,
}

impl From<chirp::Model> for Chirp {
    fn from(model: chirp::Model) -> Self {
        Self {
            id: model.id,
            created_at: model.created_at,
            updated_at: model.updated_at,
            body: model.body,
            user_id: model.user_id,
        }
    }
}

/// Create chirp request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateChirpRequest {
    /// Chirp text, at most 140 characters
    pub body: String,
}

/// Query parameters for listing chirps
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChirpListQuery {
    /// Only return chirps written by this user
    pub author_id: Option<String>,
    /// `asc` (default) or `desc` by creation time
    pub sort: Option<String>,
}

/// Chirp validation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateChirpRequest {
    pub body: String,
}

/// Chirp validation response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateChirpResponse {
    pub cleaned_body: String,
}

/// Payment provider webhook event
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhook {
    /// Event name; only `user.upgraded` is acted on
    pub event: String,
    pub data: PolkaWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PolkaWebhookData {
    pub user_id: Uuid,
}
