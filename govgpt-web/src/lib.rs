//! GovGPT Web Server
//!
//! axum routes for the mobile configuration, the WOG catalogue, the custom
//! document QA proxy, remote function loading and file storage.

pub mod auth;
pub mod config_validator;
pub mod file_store;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::GovGptServer;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Json, Response},
    Router,
};
use govgpt_core::{ErrorKind, GovGptError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost:3000"))
        .allow_origin(HeaderValue::from_static("http://127.0.0.1:3000"))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static(auth::USER_ID_HEADER),
            HeaderName::from_static(auth::USER_NAME_HEADER),
            HeaderName::from_static(auth::USER_ROLE_HEADER),
        ]);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024)) // 10MB max body size
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable development mode
    pub dev_mode: bool,
    /// SQLite URL for the file store; in-memory when unset
    pub database_url: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            database_url: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("GOVGPT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("GOVGPT_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            dev_mode: std::env::var("GOVGPT_DEV_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] GovGptError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::Core(e) => match e.kind() {
                ErrorKind::InvalidInput | ErrorKind::UrlNotAllowed => StatusCode::BAD_REQUEST,
                ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::UpstreamGateway => StatusCode::BAD_GATEWAY,
                ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                ErrorKind::SizeLimitExceeded => StatusCode::PAYLOAD_TOO_LARGE,
                ErrorKind::Config | ErrorKind::Storage | ErrorKind::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            WebError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Server(_)
            | WebError::Serialization(_)
            | WebError::Database(_)
            | WebError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message returned to the caller under `detail`
    pub fn detail(&self) -> String {
        match self {
            WebError::Core(e) => match e.kind() {
                ErrorKind::Config => "Internal server error".to_string(),
                _ => e.detail(),
            },
            WebError::Unauthorized(message)
            | WebError::Forbidden(message)
            | WebError::NotFound(message)
            | WebError::BadRequest(message) => message.clone(),
            WebError::Server(_)
            | WebError::Serialization(_)
            | WebError::Database(_)
            | WebError::Config(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            WebError::Core(e) => e.log(),
            _ if status.is_server_error() => tracing::error!("{}", self),
            _ => tracing::debug!("Request rejected: {}", self),
        }
        (status, Json(serde_json::json!({ "detail": self.detail() }))).into_response()
    }
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "govgpt_web=debug,govgpt_core=info,tower_http=debug".into()),
        )
        .init();
}
