//! API Middleware
//!
//! Request authentication and file server hit counting.

pub mod auth;
pub mod metrics;

pub use auth::{auth_error_response, require_auth, require_service_key, AuthUser};
pub use metrics::count_file_server_hits;
