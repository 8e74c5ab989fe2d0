//! Document QA proxy handlers

use super::types::{ErrorResponse, QaConfigForm};
use crate::{
    auth::{AdminUser, VerifiedUser},
    AppState, WebResult,
};
use axum::{
    extract::{Path, State},
    response::Json,
};
use govgpt_core::{QaRequest, QaResponse};
use serde_json::Value;
use tracing::info;

#[utoipa::path(
    get,
    path = "/api/v1/custom-qa/config",
    tag = "Custom QA",
    summary = "Read the QA toggle",
    responses(
        (status = 200, description = "Current toggle", body = QaConfigForm),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    )
)]
pub async fn get_qa_config(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<QaConfigForm> {
    Json(QaConfigForm {
        enabled: state.qa_service.is_enabled(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-qa/config",
    tag = "Custom QA",
    summary = "Switch the QA inlet on or off",
    request_body = QaConfigForm,
    responses(
        (status = 200, description = "Toggle after the update", body = QaConfigForm),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse)
    )
)]
pub async fn update_qa_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(form): Json<QaConfigForm>,
) -> Json<QaConfigForm> {
    state.qa_service.set_enabled(form.enabled);
    info!(user_id = %admin.id, enabled = form.enabled, "Custom QA toggled");

    Json(QaConfigForm {
        enabled: state.qa_service.is_enabled(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-qa/query",
    tag = "Custom QA",
    summary = "Ask a question about files and collections",
    request_body = QaRequest,
    responses(
        (status = 200, description = "Answer from the QA service", body = QaResponse),
        (status = 400, description = "Missing query or sources", body = ErrorResponse),
        (status = 404, description = "No readable document content", body = ErrorResponse),
        (status = 502, description = "QA service returned an error", body = ErrorResponse),
        (status = 503, description = "QA service unreachable", body = ErrorResponse)
    )
)]
pub async fn query_documents(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(request): Json<QaRequest>,
) -> WebResult<Json<QaResponse>> {
    Ok(Json(state.qa_service.query(&user, request).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-qa/query/files/{file_id}",
    tag = "Custom QA",
    summary = "Ask a question about one file",
    params(("file_id" = String, Path, description = "File identifier")),
    request_body = QaRequest,
    responses(
        (status = 200, description = "Answer from the QA service", body = QaResponse),
        (status = 404, description = "File missing or not accessible", body = ErrorResponse)
    )
)]
pub async fn query_file(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(file_id): Path<String>,
    Json(request): Json<QaRequest>,
) -> WebResult<Json<QaResponse>> {
    Ok(Json(
        state
            .qa_service
            .query_single_file(&user, &file_id, request)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/custom-qa/query/collection/{collection_name}",
    tag = "Custom QA",
    summary = "Ask a question about one knowledge collection",
    params(("collection_name" = String, Path, description = "Collection name")),
    request_body = QaRequest,
    responses(
        (status = 200, description = "Answer from the QA service", body = QaResponse),
        (status = 404, description = "Collection has no documents", body = ErrorResponse)
    )
)]
pub async fn query_collection(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Path(collection_name): Path<String>,
    Json(request): Json<QaRequest>,
) -> WebResult<Json<QaResponse>> {
    Ok(Json(
        state
            .qa_service
            .query_single_collection(&user, &collection_name, request)
            .await?,
    ))
}

/// Chat pipeline hook. Always answers 200 with the (possibly enriched) body.
#[utoipa::path(
    post,
    path = "/api/v1/custom-qa/inlet",
    tag = "Custom QA",
    summary = "Enrich a chat request with document context",
    responses(
        (status = 200, description = "Chat body, with context appended to the last user message when available")
    )
)]
pub async fn chat_inlet(
    State(state): State<AppState>,
    VerifiedUser(user): VerifiedUser,
    Json(body): Json<Value>,
) -> Json<Value> {
    Json(state.qa_service.inlet(body, &user).await)
}
