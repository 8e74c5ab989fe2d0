//! Unified error handling system
//!
//! Every failure surfaced by the QA proxy and the function loader carries a
//! stable [`ErrorKind`] so callers (and the HTTP layer) can react to it
//! without string matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};

pub type GovGptResult<T> = Result<T, GovGptError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            metadata: HashMap::new(),
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Stable classification of a [`GovGptError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AccessDenied,
    NotFound,
    UpstreamGateway,
    UpstreamUnavailable,
    RateLimited,
    SizeLimitExceeded,
    UrlNotAllowed,
    Config,
    Storage,
    Internal,
}

/// Main error type for the GovGPT customization layer
#[derive(Error, Debug)]
pub enum GovGptError {
    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Access denied: {message}")]
    AccessDenied {
        message: String,
        context: ErrorContext,
    },

    #[error("Resource not found: {resource}")]
    NotFound {
        resource: String,
        context: ErrorContext,
    },

    /// The upstream answered, but not with something we can use.
    #[error("Upstream gateway error: {message}")]
    UpstreamGateway {
        message: String,
        status: Option<u16>,
        context: ErrorContext,
    },

    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
        context: ErrorContext,
    },

    #[error("Size limit exceeded: {message}")]
    SizeLimitExceeded {
        message: String,
        limit_bytes: u64,
        context: ErrorContext,
    },

    #[error("URL not allowed: {message}")]
    UrlNotAllowed {
        message: String,
        url: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GovGptError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GovGptError::InvalidInput { context, .. } => Some(context),
            GovGptError::AccessDenied { context, .. } => Some(context),
            GovGptError::NotFound { context, .. } => Some(context),
            GovGptError::UpstreamGateway { context, .. } => Some(context),
            GovGptError::UpstreamUnavailable { context, .. } => Some(context),
            GovGptError::RateLimited { context, .. } => Some(context),
            GovGptError::SizeLimitExceeded { context, .. } => Some(context),
            GovGptError::UrlNotAllowed { context, .. } => Some(context),
            GovGptError::Config { context, .. } => Some(context),
            GovGptError::Storage { context, .. } => Some(context),
            GovGptError::Internal { context, .. } => Some(context),
            GovGptError::Io(_) | GovGptError::Serialization(_) => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GovGptError::InvalidInput { .. } => ErrorKind::InvalidInput,
            GovGptError::AccessDenied { .. } => ErrorKind::AccessDenied,
            GovGptError::NotFound { .. } => ErrorKind::NotFound,
            GovGptError::UpstreamGateway { .. } => ErrorKind::UpstreamGateway,
            GovGptError::UpstreamUnavailable { .. } => ErrorKind::UpstreamUnavailable,
            GovGptError::RateLimited { .. } => ErrorKind::RateLimited,
            GovGptError::SizeLimitExceeded { .. } => ErrorKind::SizeLimitExceeded,
            GovGptError::UrlNotAllowed { .. } => ErrorKind::UrlNotAllowed,
            GovGptError::Config { .. } => ErrorKind::Config,
            GovGptError::Storage { .. } => ErrorKind::Storage,
            GovGptError::Internal { .. } | GovGptError::Io(_) | GovGptError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to hand back to an API caller.
    ///
    /// Internal failures collapse to a generic message so storage or IO
    /// details never leak into responses.
    pub fn detail(&self) -> String {
        match self {
            GovGptError::InvalidInput { message, .. }
            | GovGptError::AccessDenied { message, .. }
            | GovGptError::UpstreamGateway { message, .. }
            | GovGptError::UpstreamUnavailable { message, .. }
            | GovGptError::RateLimited { message, .. }
            | GovGptError::SizeLimitExceeded { message, .. }
            | GovGptError::UrlNotAllowed { message, .. }
            | GovGptError::Config { message, .. } => message.clone(),
            GovGptError::NotFound { resource, .. } => resource.clone(),
            GovGptError::Storage { .. }
            | GovGptError::Internal { .. }
            | GovGptError::Io(_)
            | GovGptError::Serialization(_) => "Internal server error".to_string(),
        }
    }

    /// Upstream HTTP status, when the error came from a non-200 response
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            GovGptError::UpstreamGateway { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GovGptError::UpstreamUnavailable { .. } | GovGptError::RateLimited { .. }
        )
    }

    /// Log the error with appropriate level
    pub fn log(&self) {
        let error_id = self.context().map(|c| c.error_id.as_str());
        match self.kind() {
            ErrorKind::Internal | ErrorKind::Storage => {
                error!(error_id = ?error_id, error = %self, "Internal error occurred");
            }
            ErrorKind::Config | ErrorKind::InvalidInput => {
                error!(error_id = ?error_id, error = %self, "Configuration or validation error");
            }
            ErrorKind::UpstreamGateway | ErrorKind::UpstreamUnavailable => {
                warn!(error_id = ?error_id, error = %self, "Upstream error (may be recoverable)");
            }
            ErrorKind::RateLimited | ErrorKind::UrlNotAllowed | ErrorKind::AccessDenied => {
                warn!(error_id = ?error_id, error = %self, "Request rejected");
            }
            _ => {
                error!(error_id = ?error_id, error = %self, "Error occurred");
            }
        }
    }
}

/// Convenience macros for creating errors with context
#[macro_export]
macro_rules! config_error {
    ($msg:expr, $component:expr) => {
        $crate::GovGptError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Run 'govgpt config --init' to create default config"),
        }
    };
}

#[macro_export]
macro_rules! invalid_input_error {
    ($msg:expr, $field:expr, $component:expr) => {
        $crate::GovGptError::InvalidInput {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new($component)
                .with_suggestion("Check the field value and format"),
        }
    };
}

#[macro_export]
macro_rules! not_found_error {
    ($resource:expr, $component:expr) => {
        $crate::GovGptError::NotFound {
            resource: $resource.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[macro_export]
macro_rules! access_denied_error {
    ($msg:expr, $component:expr) => {
        $crate::GovGptError::AccessDenied {
            message: $msg.to_string(),
            context: $crate::ErrorContext::new($component),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_and_detail() {
        let error = GovGptError::UpstreamGateway {
            message: "upstream error: 500".to_string(),
            status: Some(500),
            context: ErrorContext::new("test"),
        };
        assert_eq!(error.kind(), ErrorKind::UpstreamGateway);
        assert_eq!(error.upstream_status(), Some(500));
        assert_eq!(error.detail(), "upstream error: 500");
        assert!(!error.is_recoverable());
    }

    #[test]
    fn test_internal_detail_is_generic() {
        let error = GovGptError::Storage {
            message: "database is locked".to_string(),
            source: None,
            context: ErrorContext::new("file_store"),
        };
        assert_eq!(error.kind(), ErrorKind::Storage);
        assert_eq!(error.detail(), "Internal server error");
    }

    #[test]
    fn test_macros_attach_context() {
        let error = not_found_error!("No accessible files found", "custom_qa");
        assert_eq!(error.kind(), ErrorKind::NotFound);
        assert_eq!(error.context().unwrap().component, "custom_qa");

        let error = invalid_input_error!("User query is required", "user_query", "custom_qa");
        match error {
            GovGptError::InvalidInput { field, .. } => {
                assert_eq!(field.as_deref(), Some("user_query"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
