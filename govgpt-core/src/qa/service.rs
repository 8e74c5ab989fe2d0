//! Document QA on top of stored files and knowledge collections

use super::client::{AnswerRequest, QaApiResponse, QaClient, SERVICE_NAME};
use crate::error::{ErrorContext, GovGptError, GovGptResult};
use crate::logging::performance::measure_async;
use crate::traits::{CollectionStore, FileStore};
use crate::types::{ChatTurn, FileInfo, UserIdentity};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A question about uploaded files and/or knowledge collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QaRequest {
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub file_ids: Option<Vec<String>>,
    #[serde(default)]
    pub collection_names: Option<Vec<String>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<ChatTurn>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QaResponse {
    pub response: String,
    pub sources: Option<Vec<Value>>,
    pub metadata: Option<HashMap<String, Value>>,
}

pub struct DocumentQaService {
    client: QaClient,
    files: Arc<dyn FileStore>,
    collections: Arc<dyn CollectionStore>,
    enabled: AtomicBool,
}

impl DocumentQaService {
    pub fn new(
        client: QaClient,
        files: Arc<dyn FileStore>,
        collections: Arc<dyn CollectionStore>,
        enabled: bool,
    ) -> Self {
        Self {
            client,
            files,
            collections,
            enabled: AtomicBool::new(enabled),
        }
    }

    /// Whether the chat inlet hook forwards to the QA service
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Texts and metadata of the files `user` may read.
    ///
    /// Missing and foreign files are skipped. The returned lists have the
    /// same length and order.
    pub async fn documents_from_files(
        &self,
        file_ids: &[String],
        user: &UserIdentity,
    ) -> GovGptResult<(Vec<String>, Vec<FileInfo>)> {
        debug!(
            "{} retrieving {} files for user {}",
            SERVICE_NAME,
            file_ids.len(),
            user.id
        );

        let mut accessible = Vec::new();
        for file_id in file_ids {
            match self.files.get_file_by_id(file_id).await? {
                Some(file) if file.is_accessible_by(user) => accessible.push(file),
                Some(file) => warn!(
                    "{} access denied for file {} - user {} cannot access file owned by {}",
                    SERVICE_NAME, file_id, user.id, file.user_id
                ),
                None => warn!("{} file {} not found", SERVICE_NAME, file_id),
            }
        }

        if accessible.is_empty() {
            warn!("{} no accessible files found for user {}", SERVICE_NAME, user.id);
            return Err(GovGptError::NotFound {
                resource: "No accessible files found".to_string(),
                context: ErrorContext::new("custom_qa")
                    .with_operation("documents_from_files")
                    .with_metadata("user_id", &user.id),
            });
        }

        let mut texts = Vec::new();
        let mut info = Vec::new();
        for file in &accessible {
            match file.content() {
                Some(content) if !content.trim().is_empty() => {
                    texts.push(content.to_string());
                    info.push(file.info());
                }
                Some(_) => warn!("{} file {} has empty content", SERVICE_NAME, file.id),
                None => warn!("{} file {} has no content", SERVICE_NAME, file.id),
            }
        }

        info!(
            "{} extracted content from {} of {} accessible files",
            SERVICE_NAME,
            texts.len(),
            accessible.len()
        );
        Ok((texts, info))
    }

    /// All documents of the named collections joined into one text
    pub async fn documents_from_collections(
        &self,
        collection_names: &[String],
        user: &UserIdentity,
    ) -> GovGptResult<String> {
        let documents = self
            .collections
            .get_collection_documents(collection_names)
            .await?;

        if documents.is_empty() {
            return Err(GovGptError::NotFound {
                resource: "No documents found in specified collections".to_string(),
                context: ErrorContext::new("custom_qa")
                    .with_operation("documents_from_collections"),
            });
        }

        info!(
            "Retrieved {} documents from collections for user {}",
            documents.len(),
            user.id
        );
        Ok(documents.join("\n\n"))
    }

    pub async fn query(&self, user: &UserIdentity, request: QaRequest) -> GovGptResult<QaResponse> {
        if request.user_query.trim().is_empty() {
            return Err(GovGptError::InvalidInput {
                message: "User query is required".to_string(),
                field: Some("user_query".to_string()),
                context: ErrorContext::new("custom_qa").with_operation("query"),
            });
        }

        let file_ids = request.file_ids.clone().unwrap_or_default();
        let collection_names = request.collection_names.clone().unwrap_or_default();
        if file_ids.is_empty() && collection_names.is_empty() {
            return Err(GovGptError::InvalidInput {
                message: "Either file_ids or collection_names must be provided".to_string(),
                field: None,
                context: ErrorContext::new("custom_qa").with_operation("query"),
            });
        }

        let mut texts = Vec::new();
        let mut file_info = None;

        if !file_ids.is_empty() {
            let (file_texts, info) = self.documents_from_files(&file_ids, user).await?;
            texts.extend(file_texts);
            file_info = Some(info);
        }

        if !collection_names.is_empty() {
            texts.push(self.documents_from_collections(&collection_names, user).await?);
        }

        if texts.iter().all(|t| t.trim().is_empty()) {
            return Err(GovGptError::NotFound {
                resource: "No document content found".to_string(),
                context: ErrorContext::new("custom_qa").with_operation("query"),
            });
        }

        info!(
            "Processing {} query for user {} with {} documents",
            SERVICE_NAME,
            user.id,
            texts.len()
        );

        let api_response = measure_async(
            "custom_qa.answer",
            self.client.answer(AnswerRequest {
                query: &request.user_query,
                document_texts: &texts,
                user_id: &user.id,
                user_name: &user.name,
                session_id: request.session_id.as_deref(),
                chat_history: request.chat_history.as_deref(),
                file_info: file_info.as_deref(),
            }),
        )
        .await?;

        Ok(build_response(&request, api_response, texts.len()))
    }

    /// [`query`](Self::query) restricted to one file
    pub async fn query_single_file(
        &self,
        user: &UserIdentity,
        file_id: &str,
        mut request: QaRequest,
    ) -> GovGptResult<QaResponse> {
        request.file_ids = Some(vec![file_id.to_string()]);
        self.query(user, request).await
    }

    /// [`query`](Self::query) restricted to one collection
    pub async fn query_single_collection(
        &self,
        user: &UserIdentity,
        collection_name: &str,
        mut request: QaRequest,
    ) -> GovGptResult<QaResponse> {
        request.collection_names = Some(vec![collection_name.to_string()]);
        self.query(user, request).await
    }

    /// Chat pipeline hook.
    ///
    /// When the service is enabled and the chat carries files, the last
    /// user message gets the QA answer appended as context. This never
    /// fails: on any error the body is returned unchanged.
    pub async fn inlet(&self, body: Value, user: &UserIdentity) -> Value {
        if !self.is_enabled() {
            return body;
        }

        match self.enrich(&body, user).await {
            Ok(Some(enriched)) => {
                info!("{} response integrated for user {}", SERVICE_NAME, user.id);
                enriched
            }
            Ok(None) => body,
            Err(e) => {
                error!("Error in {} filter: {}", SERVICE_NAME, e);
                body
            }
        }
    }

    async fn enrich(&self, body: &Value, user: &UserIdentity) -> GovGptResult<Option<Value>> {
        let metadata = body.get("metadata");
        let files = metadata
            .and_then(|m| m.get("files"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if files.is_empty() {
            return Ok(None);
        }

        let messages = body
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let user_message = last_user_message(messages);
        if user_message.trim().is_empty() {
            return Ok(None);
        }

        let file_ids: Vec<String> = files.iter().filter_map(file_id_of).collect();
        if file_ids.is_empty() {
            return Ok(None);
        }

        let (texts, file_info) = self.documents_from_files(&file_ids, user).await?;
        if texts.iter().all(|t| t.trim().is_empty()) {
            return Ok(None);
        }

        let chat_history = history_pairs(messages);
        let session_id = metadata
            .and_then(|m| m.get("session_id"))
            .and_then(Value::as_str);

        let api_response = self
            .client
            .answer(AnswerRequest {
                query: user_message,
                document_texts: &texts,
                user_id: &user.id,
                user_name: &user.name,
                session_id,
                chat_history: Some(&chat_history),
                file_info: Some(&file_info),
            })
            .await?;

        let answer = api_response.answer();
        if answer.trim().is_empty() {
            return Ok(None);
        }

        let enhanced = format!("{}\n\nContext from documents:\n{}", user_message, answer);
        let mut enriched = body.clone();
        if let Some(messages) = enriched.get_mut("messages").and_then(Value::as_array_mut) {
            if let Some(last_user) = messages.iter_mut().rev().find(|m| is_user_message(m)) {
                last_user["content"] = Value::String(enhanced);
            }
        }

        Ok(Some(enriched))
    }
}

fn build_response(request: &QaRequest, api_response: QaApiResponse, content_length: usize) -> QaResponse {
    let metadata = HashMap::from([
        ("query".to_string(), Value::from(request.user_query.clone())),
        ("file_ids".to_string(), serde_json::json!(request.file_ids)),
        (
            "collection_names".to_string(),
            serde_json::json!(request.collection_names),
        ),
        ("session_id".to_string(), serde_json::json!(request.session_id)),
        ("content_length".to_string(), Value::from(content_length)),
    ]);

    QaResponse {
        response: api_response.response.unwrap_or_default(),
        sources: api_response.sources,
        metadata: Some(metadata),
    }
}

fn is_user_message(message: &Value) -> bool {
    message.get("role").and_then(Value::as_str) == Some("user")
}

fn message_content(message: &Value) -> &str {
    message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn last_user_message(messages: &[Value]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| is_user_message(m))
        .map(message_content)
        .unwrap_or_default()
}

/// `{"id": ..}`, `{"file_id": ..}` or a bare string
fn file_id_of(item: &Value) -> Option<String> {
    match item {
        Value::String(id) => Some(id.clone()),
        Value::Object(map) => map
            .get("id")
            .or_else(|| map.get("file_id"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Messages before the last one, read as user/assistant pairs
fn history_pairs(messages: &[Value]) -> Vec<ChatTurn> {
    let mut history = Vec::new();
    for i in (0..messages.len().saturating_sub(1)).step_by(2) {
        if i + 1 < messages.len() {
            history.push(ChatTurn::user(message_content(&messages[i])));
            history.push(ChatTurn::assistant(message_content(&messages[i + 1])));
        }
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_ids_from_mixed_entries() {
        let files = json!([
            {"id": "a", "name": "a.pdf"},
            {"file_id": "b"},
            "c",
            42,
            {"name": "no id"}
        ]);
        let ids: Vec<String> = files
            .as_array()
            .unwrap()
            .iter()
            .filter_map(file_id_of)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_history_pairs_skip_last_message() {
        let messages = json!([
            {"role": "user", "content": "q1"},
            {"role": "assistant", "content": "a1"},
            {"role": "user", "content": "q2"},
            {"role": "assistant", "content": "a2"},
            {"role": "user", "content": "q3"}
        ]);
        let history = history_pairs(messages.as_array().unwrap());
        assert_eq!(
            history,
            vec![
                ChatTurn::user("q1"),
                ChatTurn::assistant("a1"),
                ChatTurn::user("q2"),
                ChatTurn::assistant("a2"),
            ]
        );

        let single = json!([{"role": "user", "content": "only"}]);
        assert!(history_pairs(single.as_array().unwrap()).is_empty());
    }

    #[test]
    fn test_last_user_message() {
        let messages = json!([
            {"role": "user", "content": "first"},
            {"role": "assistant", "content": "reply"},
            {"role": "user", "content": "second"},
            {"role": "assistant", "content": "trailing"}
        ]);
        assert_eq!(last_user_message(messages.as_array().unwrap()), "second");
        assert_eq!(last_user_message(&[]), "");
    }

    #[test]
    fn test_response_metadata() {
        let request = QaRequest {
            user_query: "What changed?".to_string(),
            file_ids: Some(vec!["f1".to_string()]),
            ..QaRequest::default()
        };
        let api = QaApiResponse {
            response: Some("Everything".to_string()),
            sources: Some(vec![json!({"file": "f1"})]),
            metadata: None,
        };

        let response = build_response(&request, api, 1);
        let metadata = response.metadata.unwrap();
        assert_eq!(response.response, "Everything");
        assert_eq!(metadata["query"], json!("What changed?"));
        assert_eq!(metadata["file_ids"], json!(["f1"]));
        assert_eq!(metadata["collection_names"], Value::Null);
        assert_eq!(metadata["content_length"], json!(1));
    }
}
