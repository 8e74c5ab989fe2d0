//! OpenAPI document for the GovGPT HTTP surface

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{
    auth::{USER_ID_HEADER, USER_ROLE_HEADER},
    handlers::{
        AllowedDomainsResponse, DeleteFileResponse, ErrorResponse, HealthResponse, LoadUrlForm,
        QaConfigForm, UploadFileRequest,
    },
    WebError, WebResult,
};
use govgpt_core::{
    mobile::PromptSuggestion,
    wog::{Department, WogDocument},
    ChatTurn, FileRecord, LoadedFunction, QaRequest, QaResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GovGPT API",
        version = "0.1.0",
        description = "Customization layer for the GovGPT chat deployment: mobile configuration, WOG catalogue, document QA proxy, remote function loading and file storage",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        crate::handlers::health_check,

        crate::handlers::get_mobile_config,
        crate::handlers::get_wog_documents,

        crate::handlers::get_qa_config,
        crate::handlers::update_qa_config,
        crate::handlers::query_documents,
        crate::handlers::query_file,
        crate::handlers::query_collection,
        crate::handlers::chat_inlet,

        crate::handlers::load_function_from_url,
        crate::handlers::load_tool_from_url,
        crate::handlers::function_allowed_domains,
        crate::handlers::tool_allowed_domains,

        crate::handlers::upload_file,
        crate::handlers::list_files,
        crate::handlers::get_file,
        crate::handlers::delete_file,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorResponse,
            QaConfigForm,
            QaRequest,
            QaResponse,
            ChatTurn,
            LoadUrlForm,
            LoadedFunction,
            AllowedDomainsResponse,
            UploadFileRequest,
            DeleteFileResponse,
            FileRecord,
            Department,
            WogDocument,
            PromptSuggestion,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Mobile", description = "Mobile app configuration and WOG catalogue"),
        (name = "Custom QA", description = "Questions over uploaded files and collections"),
        (name = "Functions", description = "Loading function and tool source from approved URLs"),
        (name = "Files", description = "Per-user document storage"),
    ),
    modifiers(&IdentityAddon)
)]
pub struct ApiDoc;

/// Identity headers forwarded by the gateway
pub struct IdentityAddon;

impl Modify for IdentityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ID_HEADER))),
            );
            components.add_security_scheme(
                "user_role",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(USER_ROLE_HEADER))),
            );
        }
    }
}

pub fn get_openapi_json() -> WebResult<String> {
    Ok(ApiDoc::openapi().to_pretty_json()?)
}

pub fn get_openapi_yaml() -> WebResult<String> {
    serde_yaml::to_string(&ApiDoc::openapi())
        .map_err(|e| WebError::Config(format!("Failed to render OpenAPI YAML: {}", e)))
}

/// Serve the OpenAPI document
pub async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
