//! Route definitions for the GovGPT web server

use crate::{handlers, openapi, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(openapi::openapi_json))
        // Mobile app
        .route("/v1/mobile/config", get(handlers::get_mobile_config))
        .route("/v1/wog/documents", get(handlers::get_wog_documents))
        // Document QA
        .route(
            "/v1/custom-qa/config",
            get(handlers::get_qa_config).post(handlers::update_qa_config),
        )
        .route("/v1/custom-qa/query", post(handlers::query_documents))
        .route(
            "/v1/custom-qa/query/files/{file_id}",
            post(handlers::query_file),
        )
        .route(
            "/v1/custom-qa/query/collection/{collection_name}",
            post(handlers::query_collection),
        )
        .route("/v1/custom-qa/inlet", post(handlers::chat_inlet))
        // Function and tool loading
        .route(
            "/v1/functions/load/url",
            post(handlers::load_function_from_url),
        )
        .route(
            "/v1/functions/allowed-domains",
            get(handlers::function_allowed_domains),
        )
        .route("/v1/tools/load/url", post(handlers::load_tool_from_url))
        .route(
            "/v1/tools/allowed-domains",
            get(handlers::tool_allowed_domains),
        )
        // Files
        .route(
            "/v1/files",
            get(handlers::list_files).post(handlers::upload_file),
        )
        .route(
            "/v1/files/{id}",
            get(handlers::get_file).delete(handlers::delete_file),
        )
}
