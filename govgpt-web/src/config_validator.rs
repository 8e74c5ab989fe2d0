//! Startup validation of the server and customization settings

use crate::{WebConfig, WebError, WebResult};
use govgpt_core::{
    url_security::{FUNCTION_DOMAINS_ENV, TOOL_DOMAINS_ENV},
    GovGptConfig, ENV_QA_API_KEY, ENV_QA_API_URL, ENV_QA_ENABLED, ENV_QA_TIMEOUT,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: ErrorSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Default)]
struct Findings {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
    recommendations: Vec<String>,
}

impl Findings {
    fn error(&mut self, field: &str, message: impl Into<String>, severity: ErrorSeverity) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
            severity,
        });
    }

    fn warning(&mut self, field: &str, message: impl Into<String>, recommendation: &str) {
        self.warnings.push(ValidationWarning {
            field: field.to_string(),
            message: message.into(),
            recommendation: recommendation.to_string(),
        });
    }

    fn finish(self) -> ValidationResult {
        let is_valid = self
            .errors
            .iter()
            .all(|e| e.severity != ErrorSeverity::Critical);

        ValidationResult {
            is_valid,
            errors: self.errors,
            warnings: self.warnings,
            recommendations: self.recommendations,
        }
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_config(config: &WebConfig, settings: &GovGptConfig) -> ValidationResult {
        let mut findings = Findings::default();

        Self::validate_network_config(config, &mut findings);
        Self::validate_database_config(config, &mut findings);
        Self::validate_settings(settings, &mut findings);
        Self::validate_qa_config(settings, &mut findings);
        Self::validate_allow_lists(settings, &mut findings);

        if config.dev_mode {
            findings.warning(
                "dev_mode",
                "Development mode is enabled",
                "Disable development mode for production deployment",
            );
        }
        if config.host == "0.0.0.0" {
            findings
                .recommendations
                .push("Put a gateway in front of the server; it trusts the X-User-* headers".to_string());
        }

        findings.finish()
    }

    fn validate_network_config(config: &WebConfig, findings: &mut Findings) {
        if config.host.is_empty() {
            findings.error("host", "Host cannot be empty", ErrorSeverity::Critical);
        } else if config.host.parse::<IpAddr>().is_err() && config.host != "localhost" {
            findings.error(
                "host",
                format!("Invalid host format: {}", config.host),
                ErrorSeverity::High,
            );
        }

        if config.port == 0 {
            findings.error("port", "Port cannot be 0", ErrorSeverity::Critical);
        } else if config.port < 1024 && !config.dev_mode {
            findings.warning(
                "port",
                format!("Using privileged port {} in production", config.port),
                "Consider using a port >= 1024 for production deployment",
            );
        }
    }

    fn validate_database_config(config: &WebConfig, findings: &mut Findings) {
        match &config.database_url {
            Some(url) if url.is_empty() => findings.error(
                "database_url",
                "Database URL cannot be empty if provided",
                ErrorSeverity::High,
            ),
            Some(url) if !url.starts_with("sqlite:") => findings.error(
                "database_url",
                format!("Only sqlite URLs are supported: {}", url),
                ErrorSeverity::Critical,
            ),
            Some(url) if url.contains(":memory:") && !config.dev_mode => findings.warning(
                "database_url",
                "Using in-memory database in production",
                "Use a persistent database file so uploaded files survive restarts",
            ),
            Some(_) => {}
            None if !config.dev_mode => findings.warning(
                "database_url",
                "No database configured; files are kept in memory",
                "Set DATABASE_URL to a sqlite file",
            ),
            None => {}
        }
    }

    fn validate_settings(settings: &GovGptConfig, findings: &mut Findings) {
        if let Err(e) = settings.validate() {
            findings.error("settings", e.to_string(), ErrorSeverity::Critical);
        }
    }

    fn validate_qa_config(settings: &GovGptConfig, findings: &mut Findings) {
        let qa = &settings.qa;
        if !qa.enabled {
            findings
                .recommendations
                .push(format!("Document QA inlet is disabled; set {}=true to enable it", ENV_QA_ENABLED));
            return;
        }

        if qa.api_key.is_empty() {
            findings.warning(
                "qa.api_key",
                "QA service API key is empty",
                "Set GOVGPT_API_KEY to the key issued for the file search service",
            );
        }

        if let Ok(endpoint) = url::Url::parse(&qa.endpoint) {
            let local = matches!(endpoint.host_str(), Some("localhost") | Some("127.0.0.1"));
            if endpoint.scheme() == "http" && !local {
                findings.warning(
                    "qa.endpoint",
                    format!("QA endpoint {} is not using HTTPS", qa.endpoint),
                    "Use HTTPS for QA services outside the host",
                );
            }
        }
    }

    fn validate_allow_lists(settings: &GovGptConfig, findings: &mut Findings) {
        let lists = [
            ("security.function_domains", FUNCTION_DOMAINS_ENV, &settings.security.function_domains),
            ("security.tool_domains", TOOL_DOMAINS_ENV, &settings.security.tool_domains),
        ];

        for (field, env_var, seeds) in lists {
            let from_env = std::env::var(env_var)
                .map(|v| v.split(',').any(|d| !d.trim().is_empty()))
                .unwrap_or(false);
            if seeds.is_empty() && !from_env {
                findings.warning(
                    field,
                    "Allow-list is empty; every load request will be refused",
                    "Add approved domains to the config file or the environment",
                );
            }
        }
    }

    /// Check the environment variables the server reads
    pub fn validate_environment() -> ValidationResult {
        let mut findings = Findings::default();

        let env_vars = [
            "GOVGPT_HOST",
            "GOVGPT_PORT",
            "GOVGPT_DEV_MODE",
            "DATABASE_URL",
            ENV_QA_API_URL,
            ENV_QA_API_KEY,
            ENV_QA_ENABLED,
            ENV_QA_TIMEOUT,
            FUNCTION_DOMAINS_ENV,
            TOOL_DOMAINS_ENV,
        ];

        for var_name in env_vars {
            if let Ok(value) = std::env::var(var_name) {
                if value.trim().is_empty() {
                    findings.warning(
                        var_name,
                        format!("Environment variable {} is empty", var_name),
                        "Unset it or give it a value",
                    );
                }
            }
        }

        if let Ok(port) = std::env::var("GOVGPT_PORT") {
            if port.parse::<u16>().is_err() {
                findings.error(
                    "GOVGPT_PORT",
                    format!("GOVGPT_PORT is not a valid port: {}", port),
                    ErrorSeverity::High,
                );
            }
        }

        if let Ok(timeout) = std::env::var(ENV_QA_TIMEOUT) {
            if timeout.parse::<u64>().is_err() {
                findings.error(
                    ENV_QA_TIMEOUT,
                    format!("{} must be a number of seconds: {}", ENV_QA_TIMEOUT, timeout),
                    ErrorSeverity::Medium,
                );
            }
        }

        if std::env::var("RUST_LOG").is_err() {
            findings
                .recommendations
                .push("Set RUST_LOG (e.g. 'govgpt_web=info') to control logging".to_string());
        }

        findings.finish()
    }

    pub fn print_validation_results(result: &ValidationResult) {
        if result.is_valid {
            info!("Configuration validation passed");
        } else {
            warn!("Configuration validation failed");
        }

        for error in &result.errors {
            let label = match error.severity {
                ErrorSeverity::Critical => "CRITICAL",
                ErrorSeverity::High => "ERROR",
                ErrorSeverity::Medium => "WARN",
                ErrorSeverity::Low => "INFO",
            };
            eprintln!("[{}] {}: {}", label, error.field, error.message);
        }

        for warning in &result.warnings {
            println!(
                "[WARN] {}: {} (Recommendation: {})",
                warning.field, warning.message, warning.recommendation
            );
        }

        if !result.recommendations.is_empty() {
            println!("\nRecommendations:");
            for recommendation in &result.recommendations {
                println!("   - {}", recommendation);
            }
        }
    }
}

/// Validate and fail on any critical finding
pub fn validate_config(config: &WebConfig, settings: &GovGptConfig) -> WebResult<ValidationResult> {
    let result = ConfigValidator::validate_config(config, settings);

    if !result.is_valid {
        return Err(WebError::Config("Configuration validation failed".to_string()));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_domains() -> GovGptConfig {
        let mut settings = GovGptConfig::default();
        settings.security.function_domains = vec!["github.com".to_string()];
        settings.security.tool_domains = vec!["github.com".to_string()];
        settings
    }

    #[test]
    fn test_default_config_is_valid() {
        let result = ConfigValidator::validate_config(&WebConfig::default(), &settings_with_domains());
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_zero_port_is_critical() {
        let config = WebConfig {
            port: 0,
            ..WebConfig::default()
        };
        let result = ConfigValidator::validate_config(&config, &settings_with_domains());
        assert!(!result.is_valid);
        assert!(validate_config(&config, &settings_with_domains()).is_err());
    }

    #[test]
    fn test_invalid_settings_are_critical() {
        let mut settings = settings_with_domains();
        settings.loader.max_requests_per_window = 0;

        let result = ConfigValidator::validate_config(&WebConfig::default(), &settings);
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].field, "settings");
    }

    #[test]
    fn test_non_sqlite_database_rejected() {
        let config = WebConfig {
            database_url: Some("postgres://localhost/govgpt".to_string()),
            ..WebConfig::default()
        };
        let result = ConfigValidator::validate_config(&config, &settings_with_domains());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_enabled_qa_without_key_warns() {
        let mut settings = settings_with_domains();
        settings.qa.enabled = true;
        settings.qa.api_key = String::new();

        let result = ConfigValidator::validate_config(&WebConfig::default(), &settings);
        assert!(result.warnings.iter().any(|w| w.field == "qa.api_key"));
    }
}
