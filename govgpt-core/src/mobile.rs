//! Configuration payload for the mobile app

use crate::error::GovGptResult;
use crate::types::GovGptConfig;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const PROMPT_SUGGESTIONS: &str = include_str!("../data/prompt_suggestions.json");
const FEEDBACK_OPTIONS: &str = include_str!("../data/feedback_options.json");
const LOCALE_EN: &str = include_str!("../data/locales/en.json");
const LOCALE_AR: &str = include_str!("../data/locales/ar.json");

/// A bilingual prompt shortcut shown on the home screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PromptSuggestion {
    pub id: String,
    pub title: String,
    pub title_ar: String,
    pub content: String,
    pub content_ar: String,
    pub icon_name: String,
    pub icon_color: String,
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackOption {
    pub id: String,
    pub title_en: String,
    pub title_ar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackOptions {
    pub positive: Vec<FeedbackOption>,
    pub negative: Vec<FeedbackOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    #[serde(rename = "currentProd")]
    pub current_prod: String,
    #[serde(rename = "forceUpdateProd")]
    pub force_update_prod: String,
}

impl Default for AppVersion {
    fn default() -> Self {
        Self {
            current_prod: "2.0.0".to_string(),
            force_update_prod: "2.0.0".to_string(),
        }
    }
}

/// Values the mobile payload is built from
#[derive(Debug, Clone)]
pub struct MobileSettings {
    pub suggestions: Vec<PromptSuggestion>,
    pub file_max_count: u32,
    pub file_max_size: u64,
    pub allowed_file_extensions: Vec<String>,
    pub rag_wog_model_name: String,
    pub default_models: Option<String>,
    pub enable_web_search: bool,
    pub enable_rag_hybrid_search: bool,
    pub maintenance_enabled: bool,
    pub maintenance_start: String,
    pub maintenance_end: String,
    pub ios: AppVersion,
    pub android: AppVersion,
}

impl Default for MobileSettings {
    fn default() -> Self {
        Self::from_config(&GovGptConfig::default())
    }
}

impl MobileSettings {
    pub fn from_config(config: &GovGptConfig) -> Self {
        Self {
            suggestions: config.features.prompt_suggestions.clone(),
            file_max_count: config.uploads.file_max_count,
            file_max_size: config.uploads.file_max_size,
            allowed_file_extensions: config.uploads.allowed_file_extensions.clone(),
            rag_wog_model_name: config.features.rag_wog_model_name.clone(),
            default_models: config.features.default_models.clone(),
            enable_web_search: config.features.enable_web_search,
            enable_rag_hybrid_search: config.features.enable_rag_hybrid_search,
            maintenance_enabled: false,
            maintenance_start: "2025-10-01T00:00:00Z".to_string(),
            maintenance_end: "2025-10-01T02:00:00Z".to_string(),
            ios: AppVersion::default(),
            android: AppVersion::default(),
        }
    }
}

/// The eight prompts shipped with the app
pub fn builtin_suggestions() -> GovGptResult<Vec<PromptSuggestion>> {
    Ok(serde_json::from_str(PROMPT_SUGGESTIONS)?)
}

/// Configured suggestions, or the built-in set when none are configured
pub fn suggestions(settings: &MobileSettings) -> GovGptResult<Vec<PromptSuggestion>> {
    if settings.suggestions.is_empty() {
        builtin_suggestions()
    } else {
        Ok(settings.suggestions.clone())
    }
}

pub fn feedback_options() -> GovGptResult<FeedbackOptions> {
    Ok(serde_json::from_str(FEEDBACK_OPTIONS)?)
}

/// UI string tables keyed by language code
pub fn locales() -> GovGptResult<Value> {
    let en: Value = serde_json::from_str(LOCALE_EN)?;
    let ar: Value = serde_json::from_str(LOCALE_AR)?;
    Ok(json!({
        "default": "en",
        "en": en,
        "ar": ar,
    }))
}

pub fn mobile_config(settings: &MobileSettings) -> GovGptResult<Value> {
    Ok(json!({
        "suggestions": suggestions(settings)?,
        "fileUploadCountAllowed": settings.file_max_count,
        "maxFileSizeAllowed": settings.file_max_size,
        "fileTypesAllowed": settings.allowed_file_extensions,
        "privacyPolicyURL": "/privacy",
        "termsConditionsURL": "/terms",
        "govgpt": {
            "rag_wog_model_name": settings.rag_wog_model_name,
        },
        "default_models": settings.default_models,
        "allowCredentialsLogin": true,
        "allowWebSearch": settings.enable_web_search,
        "allowRagSearch": settings.enable_rag_hybrid_search,
        "inputLinesNum": 8,
        "editLinesNum": 20,
        "maintenance": {
            "enabled": settings.maintenance_enabled,
            "scheduled": {
                "start": settings.maintenance_start,
                "end": settings.maintenance_end,
            }
        },
        "appVersions": {
            "ios": settings.ios,
            "android": settings.android,
        },
        "feedback": feedback_options()?,
        "locales": locales()?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_suggestions() {
        let suggestions = builtin_suggestions().unwrap();
        assert_eq!(suggestions.len(), 8);
        assert_eq!(suggestions[0].id, "find_document");
        assert!(suggestions.iter().all(|s| !s.title_ar.is_empty()));
    }

    #[test]
    fn test_default_payload() {
        let config = mobile_config(&MobileSettings::default()).unwrap();

        assert_eq!(config["fileUploadCountAllowed"], 5);
        assert_eq!(config["maxFileSizeAllowed"], 10_485_760);
        assert_eq!(config["fileTypesAllowed"], json!(["pdf"]));
        assert_eq!(config["govgpt"]["rag_wog_model_name"], "govgpt_rag_wog");
        assert_eq!(config["default_models"], Value::Null);
        assert_eq!(config["allowCredentialsLogin"], true);
        assert_eq!(config["inputLinesNum"], 8);
        assert_eq!(config["editLinesNum"], 20);
        assert_eq!(config["appVersions"]["ios"]["currentProd"], "2.0.0");
        assert_eq!(config["suggestions"].as_array().unwrap().len(), 8);
        assert_eq!(config["feedback"]["positive"].as_array().unwrap().len(), 6);
        assert_eq!(config["locales"]["default"], "en");
        assert!(config["locales"]["ar"].is_object());
    }

    #[test]
    fn test_configured_suggestions_win() {
        let mut settings = MobileSettings::default();
        settings.suggestions = vec![PromptSuggestion {
            id: "custom".to_string(),
            title: "Custom".to_string(),
            title_ar: "مخصص".to_string(),
            content: "Do the thing ".to_string(),
            content_ar: "افعل ذلك".to_string(),
            icon_name: "custom".to_string(),
            icon_color: "#000000".to_string(),
            category: "misc".to_string(),
            keywords: vec![],
        }];

        let config = mobile_config(&settings).unwrap();
        let suggestions = config["suggestions"].as_array().unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["id"], "custom");
    }
}
