//! Core data types shared by the QA proxy, the function loader and the web layer

use crate::mobile::PromptSuggestion;
use serde::{Deserialize, Serialize};

/// Role of the verified user making a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
    Pending,
}

impl UserRole {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => UserRole::Admin,
            "pending" => UserRole::Pending,
            _ => UserRole::User,
        }
    }
}

/// Identity of the caller, as verified by the gateway in front of us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// A row of the `file` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub hash: Option<String>,
    pub filename: String,
    pub path: Option<String>,
    /// Extracted data; the document text lives under `content`
    pub data: Option<serde_json::Value>,
    pub meta: Option<serde_json::Value>,
    pub access_control: Option<serde_json::Value>,
    /// Epoch seconds
    pub created_at: Option<i64>,
    /// Epoch seconds
    pub updated_at: Option<i64>,
}

impl FileRecord {
    /// Owners and administrators may read a file
    pub fn is_accessible_by(&self, user: &UserIdentity) -> bool {
        self.user_id == user.id || user.is_admin()
    }

    /// Extracted document text, if any
    pub fn content(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.get("content"))
            .and_then(|content| content.as_str())
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            id: self.id.clone(),
            filename: self.filename.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// File metadata correlated by position with the document texts sent upstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub filename: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// One prior chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovGptConfig {
    pub qa: QaConfig,
    pub loader: LoaderConfig,
    pub uploads: UploadConfig,
    pub features: FeatureConfig,
    pub security: SecurityConfig,
}

/// External document QA service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaConfig {
    /// Whether the chat inlet hook forwards to the QA service
    pub enabled: bool,
    /// Full URL of the QA endpoint
    pub endpoint: String,
    /// Sent as `X-API-Key`
    pub api_key: String,
    /// Total request timeout
    pub timeout_secs: u64,
}

/// Remote function/tool source loading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub max_requests_per_window: usize,
    pub window_secs: u64,
    pub max_content_bytes: u64,
    pub connect_timeout_secs: u64,
    pub total_timeout_secs: u64,
    pub user_agent: String,
}

/// Upload limits advertised to the mobile app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub file_max_count: u32,
    pub file_max_size: u64,
    pub allowed_file_extensions: Vec<String>,
}

/// Feature switches advertised to the mobile app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub enable_web_search: bool,
    pub enable_rag_hybrid_search: bool,
    pub default_models: Option<String>,
    pub rag_wog_model_name: String,
    /// Overrides the built-in suggestions when non-empty
    #[serde(default)]
    pub prompt_suggestions: Vec<PromptSuggestion>,
}

/// Allow-list seeds; the environment variables are merged on top
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    #[serde(default)]
    pub function_domains: Vec<String>,
    #[serde(default)]
    pub tool_domains: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(owner: &str) -> FileRecord {
        FileRecord {
            id: "file-1".to_string(),
            user_id: owner.to_string(),
            hash: None,
            filename: "policy.pdf".to_string(),
            path: None,
            data: Some(json!({ "content": "Policy text" })),
            meta: None,
            access_control: None,
            created_at: Some(1_700_000_000),
            updated_at: Some(1_700_000_100),
        }
    }

    #[test]
    fn test_file_access_rules() {
        let file = record("alice");
        let alice = UserIdentity::new("alice", "Alice", UserRole::User);
        let bob = UserIdentity::new("bob", "Bob", UserRole::User);
        let admin = UserIdentity::new("root", "Root", UserRole::Admin);

        assert!(file.is_accessible_by(&alice));
        assert!(!file.is_accessible_by(&bob));
        assert!(file.is_accessible_by(&admin));
    }

    #[test]
    fn test_file_content_lookup() {
        let mut file = record("alice");
        assert_eq!(file.content(), Some("Policy text"));

        file.data = Some(json!({ "status": "processing" }));
        assert_eq!(file.content(), None);

        file.data = None;
        assert_eq!(file.content(), None);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(UserRole::parse("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::parse("pending"), UserRole::Pending);
        assert_eq!(UserRole::parse("anything"), UserRole::User);
    }
}
