//! Static payloads for the mobile app and the WOG catalogue

use crate::{auth::VerifiedUser, AppState, WebResult};
use axum::{extract::State, response::Json};
use govgpt_core::{mobile, wog, wog::Department};
use serde_json::Value;
use tracing::debug;

/// Everything the mobile app needs at launch
#[utoipa::path(
    get,
    path = "/api/v1/mobile/config",
    tag = "Mobile",
    summary = "Mobile app configuration",
    description = "Prompt suggestions, upload limits, feature switches, maintenance window, app versions, feedback options and locale tables",
    responses(
        (status = 200, description = "Mobile configuration object")
    )
)]
pub async fn get_mobile_config(State(state): State<AppState>) -> WebResult<Json<Value>> {
    Ok(Json(mobile::mobile_config(&state.mobile)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/wog/documents",
    tag = "Mobile",
    summary = "WOG documents by department",
    responses(
        (status = 200, description = "Departments with their documents", body = [Department]),
        (status = 401, description = "Not authenticated", body = super::types::ErrorResponse)
    )
)]
pub async fn get_wog_documents(VerifiedUser(user): VerifiedUser) -> WebResult<Json<Vec<Department>>> {
    debug!(user_id = %user.id, "Listing WOG documents");
    Ok(Json(wog::wog_documents_by_department()?))
}
