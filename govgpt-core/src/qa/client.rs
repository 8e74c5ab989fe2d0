//! Wire client for the external document QA service

use crate::error::{ErrorContext, GovGptError, GovGptResult};
use crate::types::{ChatTurn, FileInfo, QaConfig};

use chrono::{DateTime, Local, TimeZone};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const SERVICE_NAME: &str = "govGpt-file-search-service";

const UPLOADED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One document record sent upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaDocument {
    pub id: String,
    pub name: String,
    pub text: String,
    pub uploaded_at: String,
}

#[derive(Debug, Serialize)]
struct QaPayload<'a> {
    user_query: &'a str,
    user_id: &'a str,
    user_name: &'a str,
    session_id: String,
    chat_history: &'a [ChatTurn],
    documents: Vec<QaDocument>,
}

/// Parsed body of a successful upstream answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaApiResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl QaApiResponse {
    pub fn answer(&self) -> &str {
        self.response.as_deref().unwrap_or_default()
    }
}

/// Everything needed for one upstream call
#[derive(Debug, Clone, Copy)]
pub struct AnswerRequest<'a> {
    pub query: &'a str,
    pub document_texts: &'a [String],
    pub user_id: &'a str,
    pub user_name: &'a str,
    pub session_id: Option<&'a str>,
    pub chat_history: Option<&'a [ChatTurn]>,
    /// Metadata correlated by position with `document_texts`
    pub file_info: Option<&'a [FileInfo]>,
}

#[derive(Debug, Clone)]
pub struct QaClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl QaClient {
    pub fn new(config: &QaConfig) -> GovGptResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GovGptError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("qa_client").with_operation("new"),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the QA service about the given documents.
    ///
    /// Blank texts are dropped; if nothing is left the call fails with
    /// `NotFound` and no request is sent.
    pub async fn answer(&self, request: AnswerRequest<'_>) -> GovGptResult<QaApiResponse> {
        let documents = build_documents(request.document_texts, request.file_info, Local::now());
        info!(
            "{} converted {} document texts into {} documents",
            SERVICE_NAME,
            request.document_texts.len(),
            documents.len()
        );

        if documents.is_empty() {
            return Err(GovGptError::NotFound {
                resource: "No document content found".to_string(),
                context: ErrorContext::new("qa_client").with_operation("answer"),
            });
        }

        let payload = QaPayload {
            user_query: request.query,
            user_id: request.user_id,
            user_name: request.user_name,
            session_id: request
                .session_id
                .map(str::to_string)
                .unwrap_or_else(|| format!("session_{}", request.user_id)),
            chat_history: request.chat_history.unwrap_or_default(),
            documents,
        };

        info!(
            "{} request to {} ({} documents, {} history messages)",
            SERVICE_NAME,
            self.endpoint,
            payload.documents.len(),
            payload.chat_history.len()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.unavailable(e))?;
        debug!(
            "{} response status {} with {} characters",
            SERVICE_NAME,
            status,
            body.len()
        );

        if status != StatusCode::OK {
            error!("{} response error: {} - {}", SERVICE_NAME, status, body);
            return Err(GovGptError::UpstreamGateway {
                message: format!("{} error: {}", SERVICE_NAME, status.as_u16()),
                status: Some(status.as_u16()),
                context: ErrorContext::new("qa_client").with_operation("answer"),
            });
        }

        let result: QaApiResponse = serde_json::from_str(&body).map_err(|e| {
            error!("{} response JSON decode error: {}", SERVICE_NAME, e);
            GovGptError::UpstreamGateway {
                message: format!("{} invalid JSON response", SERVICE_NAME),
                status: None,
                context: ErrorContext::new("qa_client").with_operation("parse_response"),
            }
        })?;

        info!(
            "{} request completed in {:.3} seconds for user {}",
            SERVICE_NAME,
            start.elapsed().as_secs_f64(),
            request.user_id
        );

        Ok(result)
    }

    fn headers(&self) -> GovGptResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let key = HeaderValue::from_str(&self.api_key).map_err(|e| GovGptError::Config {
            message: "QA API key is not a valid header value".to_string(),
            source: Some(Box::new(e)),
            context: ErrorContext::new("qa_client")
                .with_operation("headers")
                .with_suggestion("Check GOVGPT_API_KEY"),
        })?;
        headers.insert("X-API-Key", key);
        Ok(headers)
    }

    fn unavailable(&self, error: reqwest::Error) -> GovGptError {
        error!("{} connection error: {}", SERVICE_NAME, error);
        GovGptError::UpstreamUnavailable {
            message: format!("{} unavailable", SERVICE_NAME),
            source: Some(Box::new(error)),
            context: ErrorContext::new("qa_client").with_operation("answer"),
        }
    }
}

/// Turn raw texts into upstream document records, skipping blank ones.
///
/// Positions are taken from the original list, so `file_info[i]` and the
/// `document_{i+1}.txt` default always refer to `texts[i]`.
pub fn build_documents(
    texts: &[String],
    file_info: Option<&[FileInfo]>,
    now: DateTime<Local>,
) -> Vec<QaDocument> {
    texts
        .iter()
        .enumerate()
        .filter_map(|(i, text)| {
            if text.trim().is_empty() {
                warn!("{} skipping document {} - empty content", SERVICE_NAME, i + 1);
                return None;
            }

            let document = match file_info.and_then(|info| info.get(i)) {
                Some(info) => QaDocument {
                    id: info.id.clone(),
                    name: info.filename.clone(),
                    text: text.clone(),
                    uploaded_at: format_uploaded_at(info.created_at, now),
                },
                None => QaDocument {
                    id: (i + 1).to_string(),
                    name: format!("document_{}.txt", i + 1),
                    text: text.clone(),
                    uploaded_at: now.format(UPLOADED_AT_FORMAT).to_string(),
                },
            };
            Some(document)
        })
        .collect()
}

fn format_uploaded_at(created_at: Option<i64>, now: DateTime<Local>) -> String {
    created_at
        .and_then(|secs| Local.timestamp_opt(secs, 0).single())
        .unwrap_or(now)
        .format(UPLOADED_AT_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(id: &str, created_at: Option<i64>) -> FileInfo {
        FileInfo {
            id: id.to_string(),
            filename: format!("{id}.pdf"),
            created_at,
            updated_at: None,
        }
    }

    #[test]
    fn test_blank_documents_dropped_in_order() {
        let texts = vec![
            "A".to_string(),
            "   ".to_string(),
            "B".to_string(),
            "".to_string(),
        ];
        let docs = build_documents(&texts, None, Local::now());

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].text, "A");
        assert_eq!(docs[0].id, "1");
        assert_eq!(docs[0].name, "document_1.txt");
        assert_eq!(docs[1].text, "B");
        assert_eq!(docs[1].id, "3");
        assert_eq!(docs[1].name, "document_3.txt");
    }

    #[test]
    fn test_file_info_used_positionally() {
        let texts = vec!["first".to_string(), "second".to_string()];
        let file_info = vec![info("f1", Some(1_700_000_000))];
        let now = Local::now();
        let docs = build_documents(&texts, Some(&file_info), now);

        assert_eq!(docs[0].id, "f1");
        assert_eq!(docs[0].name, "f1.pdf");
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .unwrap()
            .format(UPLOADED_AT_FORMAT)
            .to_string();
        assert_eq!(docs[0].uploaded_at, expected);
        assert!(docs[0].uploaded_at.ends_with(".000"));

        assert_eq!(docs[1].id, "2");
        assert_eq!(docs[1].name, "document_2.txt");
    }

    #[test]
    fn test_missing_created_at_uses_now() {
        let texts = vec!["only".to_string()];
        let file_info = vec![info("f1", None)];
        let now = Local::now();
        let docs = build_documents(&texts, Some(&file_info), now);
        assert_eq!(docs[0].uploaded_at, now.format(UPLOADED_AT_FORMAT).to_string());
    }

    #[tokio::test]
    async fn test_all_blank_fails_without_calling_out() {
        let client = QaClient::new(&QaConfig {
            endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            ..QaConfig::default()
        })
        .unwrap();
        let texts = vec![" ".to_string(), "\n".to_string()];

        let err = client
            .answer(AnswerRequest {
                query: "What is the policy?",
                document_texts: &texts,
                user_id: "u1",
                user_name: "User",
                session_id: None,
                chat_history: None,
                file_info: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }
}
