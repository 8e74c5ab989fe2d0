//! GovGPT Core - customization layer for a web chat deployment
//!
//! Holds the domain logic behind the GovGPT HTTP surface: URL allow-listing,
//! remote function loading, the document QA proxy and the static mobile and
//! WOG payloads.

pub mod config;
pub mod error;
pub mod function_loader;
pub mod logging;
pub mod mobile;
pub mod qa;
pub mod rate_limit;
pub mod traits;
pub mod types;
pub mod url_security;
pub mod wog;

pub use config::*;
pub use error::*;
pub use function_loader::{FunctionLoader, LoadedFunction, SourceKind};
pub use logging::*;
pub use qa::{DocumentQaService, QaClient, QaRequest, QaResponse};
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
pub use traits::*;
pub use types::*;
pub use url_security::UrlSecurityValidator;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
