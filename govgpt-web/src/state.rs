//! Shared application state

use crate::{file_store::SqliteFileStore, WebConfig, WebResult};
use govgpt_core::{
    mobile::MobileSettings,
    qa::QaClient,
    url_security::{FUNCTION_DOMAINS_ENV, TOOL_DOMAINS_ENV},
    DocumentQaService, FunctionLoader, GovGptConfig, InMemoryRateLimiter, RateLimitConfig,
    SourceKind, UrlSecurityValidator,
};
use std::sync::Arc;
use tracing::{debug, info};

const IN_MEMORY_DATABASE: &str = "sqlite::memory:";

#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: WebConfig,
    /// Customization settings loaded at startup
    pub settings: Arc<GovGptConfig>,
    pub file_store: Arc<SqliteFileStore>,
    pub qa_service: Arc<DocumentQaService>,
    pub function_loader: Arc<FunctionLoader>,
    pub tool_loader: Arc<FunctionLoader>,
    function_limiter: Arc<InMemoryRateLimiter>,
    tool_limiter: Arc<InMemoryRateLimiter>,
    pub mobile: Arc<MobileSettings>,
}

impl AppState {
    pub async fn new(config: WebConfig, settings: GovGptConfig) -> WebResult<Self> {
        let database_url = config
            .database_url
            .clone()
            .unwrap_or_else(|| IN_MEMORY_DATABASE.to_string());
        let file_store = Arc::new(SqliteFileStore::new(&database_url).await?);

        Self::with_file_store(config, settings, file_store)
    }

    pub fn with_file_store(
        config: WebConfig,
        settings: GovGptConfig,
        file_store: Arc<SqliteFileStore>,
    ) -> WebResult<Self> {
        settings.validate()?;

        let limits = RateLimitConfig::from(&settings.loader);
        let function_limiter = Arc::new(InMemoryRateLimiter::new(limits.clone()));
        let tool_limiter = Arc::new(InMemoryRateLimiter::new(limits));

        let function_loader = FunctionLoader::new(
            SourceKind::Function,
            UrlSecurityValidator::from_env(&settings.security.function_domains, FUNCTION_DOMAINS_ENV),
            function_limiter.clone(),
            &settings.loader,
        )?;
        let tool_loader = FunctionLoader::new(
            SourceKind::Tool,
            UrlSecurityValidator::from_env(&settings.security.tool_domains, TOOL_DOMAINS_ENV),
            tool_limiter.clone(),
            &settings.loader,
        )?;

        let qa_service = DocumentQaService::new(
            QaClient::new(&settings.qa)?,
            file_store.clone(),
            file_store.clone(),
            settings.qa.enabled,
        );

        info!(
            qa_enabled = settings.qa.enabled,
            function_domains = function_loader.allowed_domains().len(),
            tool_domains = tool_loader.allowed_domains().len(),
            "Application state initialized"
        );

        Ok(Self {
            mobile: Arc::new(MobileSettings::from_config(&settings)),
            config,
            settings: Arc::new(settings),
            file_store,
            qa_service: Arc::new(qa_service),
            function_loader: Arc::new(function_loader),
            tool_loader: Arc::new(tool_loader),
            function_limiter,
            tool_limiter,
        })
    }

    pub fn loader(&self, kind: SourceKind) -> &FunctionLoader {
        match kind {
            SourceKind::Function => &self.function_loader,
            SourceKind::Tool => &self.tool_loader,
        }
    }

    /// Drop rate-limit history that no longer counts against anyone
    pub async fn cleanup_old_data(&self) {
        let now = chrono::Utc::now();
        let pruned = self.function_limiter.prune_idle(now) + self.tool_limiter.prune_idle(now);
        if pruned > 0 {
            debug!("Pruned rate-limit history for {} idle users", pruned);
        }
    }
}
