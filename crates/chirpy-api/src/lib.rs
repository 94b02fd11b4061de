pub mod chirp_body;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::{atomic::AtomicU64, Arc},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use chirpy_auth::{AuthConfig, AuthGateway};
use chirpy_db::{ChirpRepository, UserRepository};
use sea_orm::DatabaseConnection;

/// Platform name that unlocks `/admin/reset`
pub const DEV_PLATFORM: &str = "dev";

/// Application state shared across handlers
pub struct AppState {
    pub users: UserRepository,
    pub chirps: ChirpRepository,
    pub gateway: Arc<AuthGateway>,
    pub auth_config: AuthConfig,
    pub platform: String,
    /// Requests served under `/app`
    pub file_server_hits: AtomicU64,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chirpy API",
        version = "0.1.0",
        description = "REST API for posting and reading chirps",
        contact(
            name = "Chirpy Team",
            email = "team@chirpy.dev"
        )
    ),
    paths(
        handlers::health_check,
        handlers::create_user,
        handlers::login,
        handlers::create_chirp,
        handlers::list_chirps,
        handlers::get_chirp,
        handlers::delete_chirp,
        handlers::validate_chirp_body,
        handlers::polka_webhook,
        handlers::metrics,
        handlers::reset,
    ),
    components(
        schemas(
            models::ErrorResponse,
            models::User,
            models::CreateUserRequest,
            models::LoginRequest,
            models::LoginResponse,
            models::Chirp,
            models::CreateChirpRequest,
            models::ValidateChirpRequest,
            models::ValidateChirpResponse,
            models::PolkaWebhook,
            models::PolkaWebhookData,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "users", description = "Registration and login"),
        (name = "chirps", description = "Chirp endpoints"),
        (name = "webhooks", description = "Payment provider callbacks"),
        (name = "admin", description = "Operator endpoints"),
        (name = "system", description = "System health endpoints")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            // Sent as `Authorization: ApiKey <key>`
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("Authorization"))),
            );
        }
    }
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
    /// Directory served under `/app`
    pub filepath_root: PathBuf,
    /// Deployment platform; `dev` enables `/admin/reset`
    pub platform: String,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            filepath_root: PathBuf::from("."),
            platform: "prod".to_string(),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, auth_config: AuthConfig) -> Self {
        let gateway = AuthGateway::new(&auth_config);
        Self::with_gateway(config, db, auth_config, gateway)
    }

    /// Create a server around a pre-built gateway (e.g. one with cheaper hashing parameters)
    pub fn with_gateway(
        config: ApiServerConfig,
        db: DatabaseConnection,
        auth_config: AuthConfig,
        gateway: AuthGateway,
    ) -> Self {
        let state = Arc::new(AppState {
            users: UserRepository::new(db.clone()),
            chirps: ChirpRepository::new(db),
            gateway: Arc::new(gateway),
            auth_config,
            platform: config.platform.clone(),
            file_server_hits: AtomicU64::new(0),
        });

        Self { config, state }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();
        let gateway = self.state.gateway.clone();

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/healthz", get(handlers::health_check))
            .route("/api/users", post(handlers::create_user))
            .route("/api/login", post(handlers::login))
            .route("/api/chirps", get(handlers::list_chirps))
            .route("/api/chirps/{chirp_id}", get(handlers::get_chirp))
            .route("/api/validate_chirp", post(handlers::validate_chirp_body))
            .route("/admin/metrics", get(handlers::metrics))
            .route("/admin/reset", post(handlers::reset))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a bearer token)
        let protected_router = Router::new()
            .route("/api/chirps", post(handlers::create_chirp))
            .route("/api/chirps/{chirp_id}", delete(handlers::delete_chirp))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                gateway.clone(),
                middleware::require_auth,
            ));

        // Webhook routes (require the provider's API key)
        let webhook_router = Router::new()
            .route("/api/polka/webhooks", post(handlers::polka_webhook))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                gateway,
                middleware::require_service_key,
            ));

        // Static files, counted for /admin/metrics
        let file_router = Router::new()
            .nest_service("/app", ServeDir::new(&self.config.filepath_root))
            .layer(axum_middleware::from_fn_with_state(
                self.state.clone(),
                middleware::count_file_server_hits,
            ));

        let api_router = public_router
            .merge(protected_router)
            .merge(webhook_router);

        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router)
            .merge(file_router);

        let cors = if self.config.enable_cors {
            use tower_http::cors::AllowOrigin;

            let cors_layer = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    // Allow common development origins
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                        || origin_str.starts_with("https://localhost:")
                        || origin_str.starts_with("https://127.0.0.1:")
                }));

            Some(cors_layer)
        } else {
            None
        };

        // Build middleware stack
        let mut router = router.layer(TraceLayer::new_for_http());

        if let Some(cors) = cors {
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server and run until Ctrl+C
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "Serving files from {} under /app",
            self.config.filepath_root.display()
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();

        assert!(json.contains("/api/chirps/{chirp_id}"));
        assert!(json.contains("bearer_auth"));
    }

    #[test]
    fn test_default_config() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_ne!(config.platform, DEV_PLATFORM);
    }
}
