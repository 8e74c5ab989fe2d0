//! File storage handlers
//!
//! Files are private to their owner; administrators may read and delete any
//! file. A file the caller may not read is reported as missing.

use super::types::{DeleteFileResponse, ErrorResponse, UploadFileRequest};
use crate::{auth::VerifiedUser, AppState, WebError, WebResult};
use axum::{
    extract::{Path, State},
    response::Json,
};
use govgpt_core::{FileRecord, UserIdentity};
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/v1/files",
    tag = "Files",
    summary = "Store an extracted document",
    request_body = UploadFileRequest,
    responses(
        (status = 200, description = "Stored file", body = FileRecord),
        (status = 400, description = "Invalid upload", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(request): Json<UploadFileRequest>,
) -> WebResult<Json<FileRecord>> {
    let filename = request.filename.trim();
    if filename.is_empty() {
        return Err(WebError::BadRequest("Filename is required".to_string()));
    }

    let uploads = &state.settings.uploads;
    if !has_allowed_extension(filename, &uploads.allowed_file_extensions) {
        return Err(WebError::BadRequest(format!(
            "File type not allowed. Allowed types: {}",
            uploads.allowed_file_extensions.join(", ")
        )));
    }
    if request.content.len() as u64 > uploads.file_max_size {
        return Err(WebError::BadRequest(format!(
            "File too large. Maximum size allowed is {} bytes.",
            uploads.file_max_size
        )));
    }

    let now = chrono::Utc::now().timestamp();
    let file = FileRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        hash: None,
        filename: filename.to_string(),
        path: None,
        data: Some(serde_json::json!({ "content": request.content })),
        meta: request.meta,
        access_control: None,
        created_at: Some(now),
        updated_at: Some(now),
    };
    state.file_store.insert_file(&file).await?;

    info!(file_id = %file.id, user_id = %user.id, filename = %file.filename, "File uploaded");
    Ok(Json(file))
}

#[utoipa::path(
    get,
    path = "/api/v1/files",
    tag = "Files",
    summary = "List the caller's files",
    responses(
        (status = 200, description = "Files owned by the caller, newest first", body = [FileRecord])
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
) -> WebResult<Json<Vec<FileRecord>>> {
    Ok(Json(state.file_store.files_by_user(&user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/files/{id}",
    tag = "Files",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File", body = FileRecord),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> WebResult<Json<FileRecord>> {
    Ok(Json(accessible_file(&state, &user, &id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/files/{id}",
    tag = "Files",
    params(("id" = String, Path, description = "File identifier")),
    responses(
        (status = 200, description = "File deleted", body = DeleteFileResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(id): Path<String>,
) -> WebResult<Json<DeleteFileResponse>> {
    let file = accessible_file(&state, &user, &id).await?;
    let deleted = state.file_store.delete_file(&file.id).await?;

    info!(file_id = %file.id, user_id = %user.id, "File deleted");
    Ok(Json(DeleteFileResponse { id: file.id, deleted }))
}

async fn accessible_file(state: &AppState, user: &UserIdentity, id: &str) -> WebResult<FileRecord> {
    state
        .file_store
        .find_file(id)
        .await?
        .filter(|file| file.is_accessible_by(user))
        .ok_or_else(|| WebError::NotFound("File not found".to_string()))
}

fn has_allowed_extension(filename: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_check() {
        let allowed = vec!["pdf".to_string(), ".txt".to_string()];
        assert!(has_allowed_extension("Report.PDF", &allowed));
        assert!(has_allowed_extension("notes.txt", &allowed));
        assert!(!has_allowed_extension("script.py", &allowed));
        assert!(!has_allowed_extension("README", &allowed));
        assert!(has_allowed_extension("anything.bin", &[]));
    }
}
