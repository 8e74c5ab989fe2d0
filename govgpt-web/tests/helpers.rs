//! Test harness: a real server on an ephemeral port plus a reqwest client

#![allow(dead_code)]

use govgpt_core::GovGptConfig;
use govgpt_web::{AppState, WebConfig};
use std::sync::LazyLock;
use tokio::net::TcpListener;

static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Identity forwarded in the gateway headers
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub id: &'static str,
    pub role: &'static str,
}

pub const ALICE: Caller = Caller {
    id: "alice",
    role: "user",
};
pub const BOB: Caller = Caller {
    id: "bob",
    role: "user",
};
pub const ADMIN: Caller = Caller {
    id: "root",
    role: "admin",
};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub state: AppState,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_as(&self, caller: Caller, path: &str) -> reqwest::Response {
        self.api_client
            .get(self.url(path))
            .header("X-User-Id", caller.id)
            .header("X-User-Role", caller.role)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_as<Body>(&self, caller: Caller, path: &str, body: &Body) -> reqwest::Response
    where
        Body: serde::Serialize,
    {
        self.api_client
            .post(self.url(path))
            .header("X-User-Id", caller.id)
            .header("X-User-Role", caller.role)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn delete_as(&self, caller: Caller, path: &str) -> reqwest::Response {
        self.api_client
            .delete(self.url(path))
            .header("X-User-Id", caller.id)
            .header("X-User-Role", caller.role)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Upload a document and return its id
    pub async fn upload(&self, caller: Caller, filename: &str, content: &str) -> String {
        let response = self
            .post_as(
                caller,
                "/v1/files",
                &serde_json::json!({ "filename": filename, "content": content }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().to_string()
    }
}

/// Settings with the loopback mock server on the allow-lists
pub fn test_settings() -> GovGptConfig {
    let mut settings = GovGptConfig::default();
    settings.security.function_domains = vec!["127.0.0.1".to_string()];
    settings.security.tool_domains = vec!["127.0.0.1".to_string()];
    settings.uploads.allowed_file_extensions = vec!["pdf".to_string(), "txt".to_string()];
    settings
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_settings()).await
}

pub async fn spawn_app_with(settings: GovGptConfig) -> TestApp {
    LazyLock::force(&TRACING);

    let config = WebConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        dev_mode: true,
        database_url: Some("sqlite::memory:".to_string()),
    };

    let state = AppState::new(config, settings).await.unwrap();
    let app = govgpt_web::create_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        api_client: reqwest::Client::new(),
        state,
    }
}
