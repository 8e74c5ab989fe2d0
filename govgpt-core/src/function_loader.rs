//! Fetching function and tool source code from approved remote URLs

use crate::error::{ErrorContext, GovGptError, GovGptResult};
use crate::traits::RateLimiter;
use crate::types::{LoaderConfig, UserIdentity};
use crate::url_security::{github_url_to_raw_url, UrlSecurityValidator};

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const ACCEPTED_CONTENT_TYPES: &[&str] = &["text/plain", "text/x-python", "application/x-python"];
const PYTHON_PREFIXES: &[&str] = &["#", "\"\"\"", "'''", "import ", "from ", "def ", "class "];
const ENTRY_FILES: &[&str] = &["main.py", "index.py", "__init__.py"];
const MAX_REDIRECTS: usize = 5;

/// What a loader fetches; only changes wording in logs and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Function,
    Tool,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Function => "function",
            SourceKind::Tool => "tool",
        }
    }
}

/// Source code fetched from a remote URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LoadedFunction {
    pub name: String,
    pub content: String,
}

pub struct FunctionLoader {
    kind: SourceKind,
    validator: UrlSecurityValidator,
    limiter: Arc<dyn RateLimiter>,
    client: reqwest::Client,
    permits: Semaphore,
    max_content_bytes: u64,
}

impl FunctionLoader {
    pub fn new(
        kind: SourceKind,
        validator: UrlSecurityValidator,
        limiter: Arc<dyn RateLimiter>,
        config: &LoaderConfig,
    ) -> GovGptResult<Self> {
        let client = create_http_client(config, validator.clone())?;
        Ok(Self {
            kind,
            validator,
            limiter,
            client,
            permits: Semaphore::new(1),
            max_content_bytes: config.max_content_bytes,
        })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn validator(&self) -> &UrlSecurityValidator {
        &self.validator
    }

    /// Sorted copy of the allow-list
    pub fn allowed_domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.validator.allowed_domains().into_iter().collect();
        domains.sort();
        domains
    }

    /// Fetch source code from `url` on behalf of an administrator.
    ///
    /// The request is counted against the caller's quota as soon as it
    /// passes the rate check, even if validation rejects it afterwards.
    pub async fn load_from_url(
        &self,
        user: &UserIdentity,
        url: &str,
    ) -> GovGptResult<LoadedFunction> {
        let kind = self.kind.as_str();
        info!("{} load request from user {} for URL: {}", kind, user.id, url);

        if !user.is_admin() {
            return Err(GovGptError::AccessDenied {
                message: "Access prohibited".to_string(),
                context: self.context("authorize").with_metadata("user_id", &user.id),
            });
        }

        if !self.limiter.check_and_record(&user.id, Utc::now()) {
            let (max_requests, window_secs) = self.limiter.limits();
            return Err(GovGptError::RateLimited {
                message: format!(
                    "Rate limit exceeded. Maximum {} {} load requests per {}.",
                    max_requests,
                    kind,
                    describe_window(window_secs)
                ),
                retry_after_secs: Some(window_secs),
                context: self.context("rate_limit").with_metadata("user_id", &user.id),
            });
        }

        let url = url.trim();
        if url.is_empty() {
            return Err(GovGptError::InvalidInput {
                message: "Please enter a valid URL".to_string(),
                field: Some("url".to_string()),
                context: self.context("validate_url"),
            });
        }

        if !self.validator.is_url_allowed(url) {
            return Err(GovGptError::UrlNotAllowed {
                message: "URL not allowed. Only approved domains are permitted for security reasons."
                    .to_string(),
                url: url.to_string(),
                context: self.context("validate_url"),
            });
        }

        let url = github_url_to_raw_url(url);
        if !self.validator.is_url_allowed(&url) {
            return Err(GovGptError::UrlNotAllowed {
                message: "Transformed URL not allowed. Only approved domains are permitted for security reasons."
                    .to_string(),
                url,
                context: self.context("validate_transformed_url"),
            });
        }

        let name = derive_function_name(&url);
        let content = self.fetch(&url).await?;

        info!(
            "Successfully loaded {} '{}' from {} (size: {} bytes)",
            kind,
            name,
            url,
            content.len()
        );

        Ok(LoadedFunction { name, content })
    }

    async fn fetch(&self, url: &str) -> GovGptResult<String> {
        let kind = self.kind.as_str();
        let _permit = self.permits.acquire().await.map_err(|e| GovGptError::Internal {
            message: "Loader connection slot closed".to_string(),
            source: Some(Box::new(e)),
            context: self.context("fetch"),
        })?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.network_error(url, e))?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            warn!("Fetching {} from {} returned status {}", kind, url, status);
            return Err(GovGptError::UpstreamGateway {
                message: format!("Failed to fetch the {}", kind),
                status: Some(status),
                context: self.context("fetch").with_metadata("url", url),
            });
        }

        if let Some(length) = response.content_length() {
            if length > self.max_content_bytes {
                return Err(self.too_large("File", url));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| self.network_error(url, e))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_content_bytes {
                return Err(self.too_large("Content", url));
            }
            body.extend_from_slice(&chunk);
        }

        let data = String::from_utf8_lossy(&body).into_owned();
        if data.is_empty() {
            return Err(GovGptError::InvalidInput {
                message: "No data received from the URL".to_string(),
                field: Some("url".to_string()),
                context: self.context("fetch").with_metadata("url", url),
            });
        }

        if !looks_like_python(&content_type, &data) {
            warn!("Content from {} doesn't appear to be Python code", url);
        }

        Ok(data)
    }

    fn context(&self, operation: &str) -> ErrorContext {
        ErrorContext::new("function_loader")
            .with_operation(operation)
            .with_metadata("kind", self.kind.as_str())
    }

    fn network_error(&self, url: &str, error: reqwest::Error) -> GovGptError {
        warn!(
            "Network error when loading {} from {}: {}",
            self.kind.as_str(),
            url,
            error
        );
        GovGptError::UpstreamUnavailable {
            message: format!(
                "Network error when fetching the {}. Please check the URL and try again.",
                self.kind.as_str()
            ),
            source: Some(Box::new(error)),
            context: self.context("fetch").with_metadata("url", url),
        }
    }

    fn too_large(&self, what: &str, url: &str) -> GovGptError {
        GovGptError::SizeLimitExceeded {
            message: format!(
                "{} too large. Maximum size allowed is {}.",
                what,
                describe_size(self.max_content_bytes)
            ),
            limit_bytes: self.max_content_bytes,
            context: self.context("fetch").with_metadata("url", url),
        }
    }
}

/// Redirects are followed only while every hop stays on the allow-list.
/// A refused hop stops the chain and its 3xx response is returned as is.
fn redirect_policy(validator: UrlSecurityValidator) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.stop()
        } else if validator.is_url_allowed(attempt.url().as_str()) {
            attempt.follow()
        } else {
            warn!("Refusing redirect to non-approved URL: {}", attempt.url());
            attempt.stop()
        }
    })
}

fn create_http_client(
    config: &LoaderConfig,
    validator: UrlSecurityValidator,
) -> GovGptResult<reqwest::Client> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| GovGptError::Config {
        message: format!("Invalid loader user agent: {}", e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("function_loader").with_operation("create_http_client"),
    })?;
    headers.insert(USER_AGENT, user_agent);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/plain,text/x-python,application/x-python"),
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.total_timeout_secs))
        .pool_max_idle_per_host(1)
        .redirect(redirect_policy(validator))
        .build()
        .map_err(|e| GovGptError::Internal {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("function_loader").with_operation("create_http_client"),
        })
}

/// Name for the loaded source, derived from the final URL.
///
/// `https://host/a/b/summarize.py` gives `summarize`; entry files such as
/// `main.py` take the name of their folder instead.
pub fn derive_function_name(url: &str) -> String {
    let parts: Vec<&str> = url.trim_end_matches('/').split('/').collect();
    let file_name = parts.last().copied().unwrap_or_default();

    if let Some(stem) = file_name.strip_suffix(".py") {
        if !ENTRY_FILES.contains(&file_name) {
            return stem.to_string();
        }
    }

    if parts.len() > 1 {
        parts[parts.len() - 2].to_string()
    } else {
        "function".to_string()
    }
}

fn looks_like_python(content_type: &str, data: &str) -> bool {
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|t| content_type.contains(t))
        || PYTHON_PREFIXES
            .iter()
            .any(|p| data.trim().starts_with(p))
}

fn describe_size(bytes: u64) -> String {
    const MB: u64 = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

fn describe_window(secs: u64) -> String {
    match secs {
        3600 => "hour".to_string(),
        60 => "minute".to_string(),
        _ => format!("{} seconds", secs),
    }
}
