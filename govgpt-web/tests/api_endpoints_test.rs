//! End-to-end tests against a running server

mod helpers;

use helpers::{spawn_app, spawn_app_with, test_settings, ADMIN, ALICE, BOB};
use httpmock::prelude::*;
use serde_json::{json, Value};

async fn json_body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_health_and_mobile_config_are_public() {
    let app = spawn_app().await;

    let health = app.get("/health").await;
    assert_eq!(health.status().as_u16(), 200);
    assert_eq!(json_body(health).await["status"], "healthy");

    let config = json_body(app.get("/v1/mobile/config").await).await;
    assert_eq!(config["maxFileSizeAllowed"], 10 * 1024 * 1024);
    assert_eq!(config["govgpt"]["rag_wog_model_name"], "govgpt_rag_wog");
    assert_eq!(config["suggestions"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_file_lifecycle_and_isolation() {
    let app = spawn_app().await;
    let file_id = app.upload(ALICE, "budget.pdf", "The budget is 10M.").await;

    let listed = json_body(app.get_as(ALICE, "/v1/files").await).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["data"]["content"], "The budget is 10M.");
    assert!(json_body(app.get_as(BOB, "/v1/files").await)
        .await
        .as_array()
        .unwrap()
        .is_empty());

    let foreign = app.get_as(BOB, &format!("/v1/files/{}", file_id)).await;
    assert_eq!(foreign.status().as_u16(), 404);
    assert_eq!(json_body(foreign).await["detail"], "File not found");

    let as_admin = app.get_as(ADMIN, &format!("/v1/files/{}", file_id)).await;
    assert_eq!(as_admin.status().as_u16(), 200);

    let deleted = app.delete_as(ALICE, &format!("/v1/files/{}", file_id)).await;
    assert_eq!(json_body(deleted).await["deleted"], true);
    assert_eq!(
        app.get_as(ALICE, &format!("/v1/files/{}", file_id))
            .await
            .status()
            .as_u16(),
        404
    );
}

#[tokio::test]
async fn test_upload_validation() {
    let app = spawn_app().await;

    let wrong_type = app
        .post_as(ALICE, "/v1/files", &json!({ "filename": "run.sh", "content": "echo" }))
        .await;
    assert_eq!(wrong_type.status().as_u16(), 400);
    assert!(json_body(wrong_type)
        .await["detail"]
        .as_str()
        .unwrap()
        .starts_with("File type not allowed"));

    let anonymous = app
        .api_client
        .post(format!("{}/api/v1/files", app.address))
        .json(&json!({ "filename": "a.pdf", "content": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

fn qa_settings(server: &MockServer) -> govgpt_core::GovGptConfig {
    let mut settings = test_settings();
    settings.qa.enabled = true;
    settings.qa.endpoint = server.url("/api/v1/file-search");
    settings.qa.api_key = "test-key".to_string();
    settings
}

#[tokio::test]
async fn test_query_files_through_qa_service() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/file-search")
                .header("X-API-Key", "test-key");
            then.status(200).json_body(json!({
                "response": "The budget is 10M.",
                "sources": [{ "document": "budget.pdf" }],
                "metadata": { "model": "qa" }
            }));
        })
        .await;

    let app = spawn_app_with(qa_settings(&server)).await;
    let file_id = app.upload(ALICE, "budget.pdf", "The budget is 10M.").await;

    let response = app
        .post_as(
            ALICE,
            "/v1/custom-qa/query",
            &json!({ "user_query": "What is the budget?", "file_ids": [file_id] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body = json_body(response).await;
    assert_eq!(body["response"], "The budget is 10M.");
    assert_eq!(body["metadata"]["file_ids"], json!([file_id]));
    mock.assert_async().await;

    let single = app
        .post_as(
            ALICE,
            &format!("/v1/custom-qa/query/files/{}", file_id),
            &json!({ "user_query": "And again?" }),
        )
        .await;
    assert_eq!(single.status().as_u16(), 200);
}

#[tokio::test]
async fn test_query_validation_and_access() {
    let server = MockServer::start_async().await;
    let app = spawn_app_with(qa_settings(&server)).await;
    let file_id = app.upload(ALICE, "private.pdf", "secret").await;

    let no_sources = app
        .post_as(ALICE, "/v1/custom-qa/query", &json!({ "user_query": "hi" }))
        .await;
    assert_eq!(no_sources.status().as_u16(), 400);
    assert_eq!(
        json_body(no_sources).await["detail"],
        "Either file_ids or collection_names must be provided"
    );

    let foreign = app
        .post_as(
            BOB,
            &format!("/v1/custom-qa/query/files/{}", file_id),
            &json!({ "user_query": "leak it" }),
        )
        .await;
    assert_eq!(foreign.status().as_u16(), 404);
    assert_eq!(json_body(foreign).await["detail"], "No accessible files found");
}

#[tokio::test]
async fn test_query_collection_and_upstream_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/file-search");
            then.status(500).body("boom");
        })
        .await;

    let app = spawn_app_with(qa_settings(&server)).await;
    app.state
        .file_store
        .add_collection_document("policies", "Leave policy text")
        .await
        .unwrap();

    let response = app
        .post_as(
            ALICE,
            "/v1/custom-qa/query/collection/policies",
            &json!({ "user_query": "How many leave days?" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 502);
    assert!(json_body(response)
        .await["detail"]
        .as_str()
        .unwrap()
        .contains("500"));

    let empty = app
        .post_as(
            ALICE,
            "/v1/custom-qa/query/collection/unknown",
            &json!({ "user_query": "anything" }),
        )
        .await;
    assert_eq!(empty.status().as_u16(), 404);
}

#[tokio::test]
async fn test_inlet_appends_document_context() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/v1/file-search");
            then.status(200).json_body(json!({ "response": "Ten million." }));
        })
        .await;

    let app = spawn_app_with(qa_settings(&server)).await;
    let file_id = app.upload(ALICE, "budget.pdf", "The budget is 10M.").await;

    let body = json!({
        "messages": [{ "role": "user", "content": "What is the budget?" }],
        "metadata": { "files": [{ "id": file_id }] }
    });
    let enriched = json_body(app.post_as(ALICE, "/v1/custom-qa/inlet", &body).await).await;
    assert_eq!(
        enriched["messages"][0]["content"],
        "What is the budget?\n\nContext from documents:\nTen million."
    );

    app.post_as(ADMIN, "/v1/custom-qa/config", &json!({ "enabled": false }))
        .await;
    let untouched = json_body(app.post_as(ALICE, "/v1/custom-qa/inlet", &body).await).await;
    assert_eq!(untouched, body);
}

#[tokio::test]
async fn test_function_loading() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/filters/summarize.py");
            then.status(200)
                .header("content-type", "text/x-python")
                .body("def summarize(text):\n    return text[:100]\n");
        })
        .await;

    let app = spawn_app().await;
    let url = server.url("/filters/summarize.py");

    let refused = app
        .post_as(ALICE, "/v1/functions/load/url", &json!({ "url": url }))
        .await;
    assert_eq!(refused.status().as_u16(), 403);

    let loaded = app
        .post_as(ADMIN, "/v1/functions/load/url", &json!({ "url": url }))
        .await;
    assert_eq!(loaded.status().as_u16(), 200);
    let loaded = json_body(loaded).await;
    assert_eq!(loaded["name"], "summarize");
    assert!(loaded["content"].as_str().unwrap().starts_with("def summarize"));

    let unapproved = app
        .post_as(
            ADMIN,
            "/v1/tools/load/url",
            &json!({ "url": "https://evil.example.com/tool.py" }),
        )
        .await;
    assert_eq!(unapproved.status().as_u16(), 400);
    assert!(json_body(unapproved)
        .await["detail"]
        .as_str()
        .unwrap()
        .starts_with("URL not allowed"));

    let domains = json_body(app.get_as(ADMIN, "/v1/tools/allowed-domains").await).await;
    assert_eq!(domains["domains"], json!(["127.0.0.1"]));
    assert_eq!(domains["count"], 1);
}

#[tokio::test]
async fn test_function_loading_rate_limit() {
    let mut settings = test_settings();
    settings.loader.max_requests_per_window = 2;
    let app = spawn_app_with(settings).await;
    let body = json!({ "url": "https://unapproved.example.org/f.py" });

    for _ in 0..2 {
        let response = app.post_as(ADMIN, "/v1/functions/load/url", &body).await;
        assert_eq!(response.status().as_u16(), 400);
    }

    let limited = app.post_as(ADMIN, "/v1/functions/load/url", &body).await;
    assert_eq!(limited.status().as_u16(), 429);
    assert!(json_body(limited)
        .await["detail"]
        .as_str()
        .unwrap()
        .starts_with("Rate limit exceeded"));

    // Tools have their own quota
    let tool = app.post_as(ADMIN, "/v1/tools/load/url", &body).await;
    assert_eq!(tool.status().as_u16(), 400);
}
