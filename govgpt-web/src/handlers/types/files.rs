//! File storage request and response types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Upload of an already-extracted document
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UploadFileRequest {
    #[schema(example = "annual-report.pdf")]
    pub filename: String,
    /// Extracted document text
    pub content: String,
    pub meta: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponse {
    pub id: String,
    pub deleted: bool,
}
