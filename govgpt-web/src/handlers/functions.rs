//! Remote function and tool loading handlers

use super::types::{AllowedDomainsResponse, ErrorResponse, LoadUrlForm};
use crate::{auth::AdminUser, AppState, WebResult};
use axum::{extract::State, response::Json};
use govgpt_core::{LoadedFunction, SourceKind};

async fn load(
    state: &AppState,
    kind: SourceKind,
    admin: &govgpt_core::UserIdentity,
    form: LoadUrlForm,
) -> WebResult<Json<LoadedFunction>> {
    let loaded = state.loader(kind).load_from_url(admin, &form.url).await?;
    Ok(Json(loaded))
}

fn allowed_domains(state: &AppState, kind: SourceKind) -> Json<AllowedDomainsResponse> {
    let domains = state.loader(kind).allowed_domains();
    Json(AllowedDomainsResponse {
        count: domains.len(),
        domains,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/functions/load/url",
    tag = "Functions",
    summary = "Fetch function source from an approved URL",
    request_body = LoadUrlForm,
    responses(
        (status = 200, description = "Function name and source", body = LoadedFunction),
        (status = 400, description = "Empty or unapproved URL", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 413, description = "Source exceeds the size limit", body = ErrorResponse),
        (status = 429, description = "Too many load requests", body = ErrorResponse),
        (status = 502, description = "Remote host returned an error", body = ErrorResponse),
        (status = 503, description = "Remote host unreachable", body = ErrorResponse)
    )
)]
pub async fn load_function_from_url(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(form): Json<LoadUrlForm>,
) -> WebResult<Json<LoadedFunction>> {
    load(&state, SourceKind::Function, &admin, form).await
}

#[utoipa::path(
    post,
    path = "/api/v1/tools/load/url",
    tag = "Functions",
    summary = "Fetch tool source from an approved URL",
    request_body = LoadUrlForm,
    responses(
        (status = 200, description = "Tool name and source", body = LoadedFunction),
        (status = 400, description = "Empty or unapproved URL", body = ErrorResponse),
        (status = 429, description = "Too many load requests", body = ErrorResponse)
    )
)]
pub async fn load_tool_from_url(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(form): Json<LoadUrlForm>,
) -> WebResult<Json<LoadedFunction>> {
    load(&state, SourceKind::Tool, &admin, form).await
}

#[utoipa::path(
    get,
    path = "/api/v1/functions/allowed-domains",
    tag = "Functions",
    summary = "Domains functions may be loaded from",
    responses(
        (status = 200, description = "Sorted allow-list", body = AllowedDomainsResponse)
    )
)]
pub async fn function_allowed_domains(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<AllowedDomainsResponse> {
    allowed_domains(&state, SourceKind::Function)
}

#[utoipa::path(
    get,
    path = "/api/v1/tools/allowed-domains",
    tag = "Functions",
    summary = "Domains tools may be loaded from",
    responses(
        (status = 200, description = "Sorted allow-list", body = AllowedDomainsResponse)
    )
)]
pub async fn tool_allowed_domains(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Json<AllowedDomainsResponse> {
    allowed_domains(&state, SourceKind::Tool)
}
