//! Configuration management

use crate::error::{GovGptError, GovGptResult};
use crate::types::{
    FeatureConfig, GovGptConfig, LoaderConfig, QaConfig, SecurityConfig, UploadConfig,
};

use std::path::{Path, PathBuf};
use tracing::warn;

pub const ENV_QA_API_URL: &str = "GOVGPT_FILE_SEARCH_API_URL";
pub const ENV_QA_API_KEY: &str = "GOVGPT_API_KEY";
pub const ENV_QA_ENABLED: &str = "USE_CUSTOM_QA_API";
pub const ENV_QA_TIMEOUT: &str = "CUSTOM_QA_TIMEOUT";

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "http://localhost:8001/api/v1/file-search".to_string(),
            api_key: String::new(),
            timeout_secs: 900,
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 10,
            window_secs: 3600,
            max_content_bytes: 1024 * 1024,
            connect_timeout_secs: 10,
            total_timeout_secs: 30,
            user_agent: "GovGPT-Function-Loader/1.0".to_string(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            file_max_count: 5,
            file_max_size: 10 * 1024 * 1024,
            allowed_file_extensions: vec!["pdf".to_string()],
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_web_search: false,
            enable_rag_hybrid_search: false,
            default_models: None,
            rag_wog_model_name: "govgpt_rag_wog".to_string(),
            prompt_suggestions: Vec::new(),
        }
    }
}

impl Default for GovGptConfig {
    fn default() -> Self {
        Self {
            qa: QaConfig::default(),
            loader: LoaderConfig::default(),
            uploads: UploadConfig::default(),
            features: FeatureConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl GovGptConfig {
    /// Default location: `~/.govgpt/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".govgpt")
            .join("config.toml")
    }

    /// Load from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> GovGptResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| GovGptError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: GovGptConfig = toml::from_str(&content).map_err(|e| GovGptError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// Load from `path` when it exists, defaults otherwise, then apply the environment
    pub fn load(path: Option<&Path>) -> GovGptResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> GovGptResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| GovGptError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| GovGptError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Overlay the QA settings read from the process environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_QA_API_URL) {
            if !url.trim().is_empty() {
                self.qa.endpoint = url.trim().to_string();
            }
        }
        if let Ok(key) = std::env::var(ENV_QA_API_KEY) {
            self.qa.api_key = key;
        }
        if let Ok(enabled) = std::env::var(ENV_QA_ENABLED) {
            self.qa.enabled = matches!(
                enabled.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes"
            );
        }
        if let Ok(timeout) = std::env::var(ENV_QA_TIMEOUT) {
            match timeout.trim().parse() {
                Ok(secs) => self.qa.timeout_secs = secs,
                Err(_) => warn!("Ignoring invalid {}: {}", ENV_QA_TIMEOUT, timeout),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> GovGptResult<()> {
        if self.qa.timeout_secs == 0 {
            return Err(GovGptError::Config {
                message: "QA timeout_secs must be greater than 0".to_string(),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set qa.timeout_secs to a positive value"),
            });
        }

        if self.qa.enabled && url::Url::parse(&self.qa.endpoint).is_err() {
            return Err(GovGptError::Config {
                message: format!("QA endpoint is not a valid URL: {}", self.qa.endpoint),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set qa.endpoint or GOVGPT_FILE_SEARCH_API_URL"),
            });
        }

        if self.loader.max_requests_per_window == 0 || self.loader.window_secs == 0 {
            return Err(GovGptError::Config {
                message: "Loader rate limit must allow at least one request per window"
                    .to_string(),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set loader.max_requests_per_window and loader.window_secs"),
            });
        }

        if self.loader.max_content_bytes == 0 {
            return Err(GovGptError::Config {
                message: "Loader max_content_bytes must be greater than 0".to_string(),
                source: None,
                context: crate::ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set loader.max_content_bytes to a positive value"),
            });
        }

        if self.loader.connect_timeout_secs > self.loader.total_timeout_secs {
            return Err(GovGptError::Config {
                message: "Loader connect timeout cannot exceed the total timeout".to_string(),
                source: None,
                context: crate::ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_service_limits() {
        let config = GovGptConfig::default();
        assert_eq!(config.qa.timeout_secs, 900);
        assert_eq!(config.loader.max_requests_per_window, 10);
        assert_eq!(config.loader.window_secs, 3600);
        assert_eq!(config.loader.max_content_bytes, 1_048_576);
        assert_eq!(config.uploads.file_max_size, 10_485_760);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = GovGptConfig::default();
        config.security.function_domains = vec!["github.com".to_string()];
        config.qa.enabled = true;
        config.save_to_file(&path).unwrap();

        let loaded = GovGptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.security.function_domains, vec!["github.com"]);
        assert!(loaded.qa.enabled);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "qa = [not toml").unwrap();

        let err = GovGptConfig::from_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Config);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = GovGptConfig::default();
        config.loader.window_secs = 0;
        assert!(config.validate().is_err());

        let mut config = GovGptConfig::default();
        config.qa.enabled = true;
        config.qa.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
