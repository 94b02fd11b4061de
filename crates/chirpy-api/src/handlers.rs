use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Extension, Json,
};
use chirpy_auth::AuthError;
use chirpy_db::SortOrder;
use sea_orm::{DbErr, SqlErr};
use std::sync::{atomic::Ordering, Arc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::chirp_body::validate_chirp;
use crate::middleware::{auth_error_response, AuthUser};
use crate::models::*;
use crate::AppState;

/// Event that upgrades a user to Chirpy Red
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

fn internal_error(context: &str, err: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    error!("{}: {}", context, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_code(
            "Internal server error",
            "INTERNAL_ERROR",
        )),
    )
}

/// Unwrap a JSON body, turning every rejection into a 400
fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, (StatusCode, Json<ErrorResponse>)> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        bad_request(format!("Invalid request body: {}", rejection.body_text()))
    })
}

fn parse_chirp_id(raw: &str) -> Result<Uuid, (StatusCode, Json<ErrorResponse>)> {
    Uuid::parse_str(raw).map_err(|_| bad_request("Invalid chirp ID"))
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/healthz",
    responses(
        (status = 200, description = "Service is healthy", body = String, content_type = "text/plain")
    ),
    tag = "system"
)]
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "OK",
    )
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), (StatusCode, Json<ErrorResponse>)> {
    let req = parse_body(payload)?;

    if req.email.trim().is_empty() || !req.email.contains('@') {
        return Err(bad_request("Invalid email address"));
    }
    if req.password.is_empty() {
        return Err(bad_request("Password is required"));
    }

    let hashed = state.gateway.hasher().hash(&req.password).map_err(|e| {
        error!("Failed to hash password: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_code(
                "Failed to process password",
                "INTERNAL_ERROR",
            )),
        )
    })?;

    let created = state
        .users
        .create_user(&req.email, &hashed)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => (
                StatusCode::CONFLICT,
                Json(ErrorResponse::with_code(
                    "Email already registered",
                    "EMAIL_EXISTS",
                )),
            ),
            _ => internal_error("Failed to create user", e),
        })?;

    info!("Registered user {}", created.id);

    Ok((StatusCode::CREATED, Json(User::from(created))))
}

/// Log in and receive a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let req = parse_body(payload)?;
    let ttl = state.auth_config.clamp_ttl(req.expires_in_seconds);

    let grant = state
        .gateway
        .login(&state.users, &req.email, &req.password, ttl)
        .await
        .map_err(|e| match e {
            // An unusable stored hash must not reveal that the account exists
            AuthError::Password(_) => auth_error_response(&AuthError::InvalidCredentials),
            other => auth_error_response(&other),
        })?;

    let user = state
        .users
        .find_by_id(grant.subject)
        .await
        .map_err(|e| internal_error("Failed to load user", e))?
        .ok_or_else(|| {
            warn!("User {} vanished during login", grant.subject);
            auth_error_response(&AuthError::InvalidCredentials)
        })?;

    debug!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        user: User::from(user),
        token: grant.token,
        expires_at: grant.expires_at,
    }))
}

/// Post a chirp
#[utoipa::path(
    post,
    path = "/api/chirps",
    request_body = CreateChirpRequest,
    responses(
        (status = 201, description = "Chirp created", body = Chirp),
        (status = 400, description = "Chirp is too long or body is invalid", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "chirps"
)]
pub async fn create_chirp(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    payload: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Chirp>), (StatusCode, Json<ErrorResponse>)> {
    let req = parse_body(payload)?;
    let cleaned = validate_chirp(&req.body).map_err(|e| bad_request(e.to_string()))?;

    let created = state
        .chirps
        .create(&cleaned, auth_user.user_id)
        .await
        .map_err(|e| internal_error("Failed to create chirp", e))?;

    debug!("User {} posted chirp {}", auth_user.user_id, created.id);

    Ok((StatusCode::CREATED, Json(Chirp::from(created))))
}

/// List chirps
#[utoipa::path(
    get,
    path = "/api/chirps",
    params(ChirpListQuery),
    responses(
        (status = 200, description = "Chirps ordered by creation time", body = Vec<Chirp>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "chirps"
)]
pub async fn list_chirps(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChirpListQuery>,
) -> Result<Json<Vec<Chirp>>, (StatusCode, Json<ErrorResponse>)> {
    let author_id = match query.author_id.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(Uuid::parse_str(raw).map_err(|_| bad_request("Invalid author ID"))?),
    };

    let sort = match query.sort.as_deref() {
        None | Some("") | Some("asc") => SortOrder::Asc,
        Some("desc") => SortOrder::Desc,
        Some(other) => {
            return Err(bad_request(format!(
                "Invalid sort '{}'. Expected 'asc' or 'desc'",
                other
            )))
        }
    };

    let chirps = state
        .chirps
        .list(author_id, sort)
        .await
        .map_err(|e| internal_error("Failed to list chirps", e))?;

    Ok(Json(chirps.into_iter().map(Chirp::from).collect()))
}

/// Get a chirp by ID
#[utoipa::path(
    get,
    path = "/api/chirps/{chirp_id}",
    params(
        ("chirp_id" = String, Path, description = "Chirp ID")
    ),
    responses(
        (status = 200, description = "Chirp", body = Chirp),
        (status = 400, description = "Invalid chirp ID", body = ErrorResponse),
        (status = 404, description = "Chirp not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "chirps"
)]
pub async fn get_chirp(
    State(state): State<Arc<AppState>>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>, (StatusCode, Json<ErrorResponse>)> {
    let id = parse_chirp_id(&chirp_id)?;

    let chirp = state
        .chirps
        .get(id)
        .await
        .map_err(|e| internal_error("Failed to load chirp", e))?
        .ok_or_else(|| chirp_not_found(id))?;

    Ok(Json(Chirp::from(chirp)))
}

fn chirp_not_found(id: Uuid) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::with_code(
            format!("Chirp '{}' not found", id),
            "CHIRP_NOT_FOUND",
        )),
    )
}

/// Delete one of your own chirps
#[utoipa::path(
    delete,
    path = "/api/chirps/{chirp_id}",
    params(
        ("chirp_id" = String, Path, description = "Chirp ID")
    ),
    responses(
        (status = 204, description = "Chirp deleted"),
        (status = 400, description = "Invalid chirp ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Chirp belongs to another user", body = ErrorResponse),
        (status = 404, description = "Chirp not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "chirps"
)]
pub async fn delete_chirp(
    State(state): State<Arc<AppState>>,
    Extension(auth_user): Extension<AuthUser>,
    Path(chirp_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let id = parse_chirp_id(&chirp_id)?;

    let chirp = state
        .chirps
        .get(id)
        .await
        .map_err(|e| internal_error("Failed to load chirp", e))?
        .ok_or_else(|| chirp_not_found(id))?;

    if chirp.user_id != auth_user.user_id {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_code(
                "You can only delete your own chirps",
                "FORBIDDEN",
            )),
        ));
    }

    let deleted = state
        .chirps
        .delete(id)
        .await
        .map_err(|e| internal_error("Failed to delete chirp", e))?;

    if !deleted {
        return Err(chirp_not_found(id));
    }

    info!("User {} deleted chirp {}", auth_user.user_id, id);

    Ok(StatusCode::NO_CONTENT)
}

/// Check a chirp body without storing it
#[utoipa::path(
    post,
    path = "/api/validate_chirp",
    request_body = ValidateChirpRequest,
    responses(
        (status = 200, description = "Chirp is valid", body = ValidateChirpResponse),
        (status = 400, description = "Chirp is too long or body is invalid", body = ErrorResponse)
    ),
    tag = "chirps"
)]
pub async fn validate_chirp_body(
    payload: Result<Json<ValidateChirpRequest>, JsonRejection>,
) -> Result<Json<ValidateChirpResponse>, (StatusCode, Json<ErrorResponse>)> {
    let req = parse_body(payload)?;
    let cleaned_body = validate_chirp(&req.body).map_err(|e| bad_request(e.to_string()))?;

    Ok(Json(ValidateChirpResponse { cleaned_body }))
}

/// Payment provider webhook
///
/// Authenticated with `Authorization: ApiKey <key>` by the router.
#[utoipa::path(
    post,
    path = "/api/polka/webhooks",
    request_body = PolkaWebhook,
    responses(
        (status = 204, description = "Event processed or ignored"),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 401, description = "Missing or wrong API key", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "webhooks"
)]
pub async fn polka_webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PolkaWebhook>, JsonRejection>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let webhook = parse_body(payload)?;

    if webhook.event != USER_UPGRADED_EVENT {
        debug!("Ignoring webhook event '{}'", webhook.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = webhook.data.user_id;
    let upgraded = state
        .users
        .upgrade_to_chirpy_red(user_id)
        .await
        .map_err(|e| internal_error("Failed to upgrade user", e))?;

    if !upgraded {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::with_code(
                format!("User '{}' not found", user_id),
                "USER_NOT_FOUND",
            )),
        ));
    }

    info!("User {} upgraded to Chirpy Red", user_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Admin page showing file server hits
#[utoipa::path(
    get,
    path = "/admin/metrics",
    responses(
        (status = 200, description = "Metrics page", body = String, content_type = "text/html")
    ),
    tag = "admin"
)]
pub async fn metrics(State(state): State<Arc<AppState>>) -> Html<String> {
    let hits = state.file_server_hits.load(Ordering::Relaxed);

    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>\n",
        hits
    ))
}

/// Reset hit counter and delete all users (dev platform only)
#[utoipa::path(
    post,
    path = "/admin/reset",
    responses(
        (status = 200, description = "State reset", body = String, content_type = "text/plain"),
        (status = 403, description = "Not running on the dev platform", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if state.platform != crate::DEV_PLATFORM {
        warn!("Reset refused on platform '{}'", state.platform);
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::with_code(
                "Reset is only allowed in dev environment",
                "FORBIDDEN",
            )),
        ));
    }

    state.file_server_hits.store(0, Ordering::Relaxed);
    let removed = state
        .users
        .delete_all()
        .await
        .map_err(|e| internal_error("Failed to delete users", e))?;

    info!("Reset: hit counter cleared, {} users deleted", removed);

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "Hits reset to 0",
    ))
}
