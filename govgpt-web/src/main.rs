//! GovGPT web server binary

use anyhow::Context;
use clap::Parser;
use govgpt_core::GovGptConfig;
use govgpt_web::config_validator::{validate_config, ConfigValidator};
use govgpt_web::server::GovGptServerBuilder;
use govgpt_web::{init_logging, WebConfig};
use std::path::PathBuf;
use tracing::info;

/// GovGPT customization layer HTTP server
#[derive(Parser)]
#[command(name = "govgpt-web")]
#[command(about = "HTTP server for the GovGPT customization layer")]
#[command(version)]
struct Args {
    /// Server host to bind to (overrides GOVGPT_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on (overrides GOVGPT_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,

    /// SQLite URL for file storage (overrides DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Settings file; defaults to ~/.govgpt/config.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_logging();

    let mut config = WebConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.dev_mode |= args.dev;
    if args.database_url.is_some() {
        config.database_url = args.database_url;
    }

    let settings = GovGptConfig::load(args.config.as_deref())
        .context("Failed to load GovGPT settings")?;

    ConfigValidator::print_validation_results(&ConfigValidator::validate_environment());
    let validation = validate_config(&config, &settings)?;
    ConfigValidator::print_validation_results(&validation);

    info!(
        "Starting GovGPT web server on http://{} (QA inlet {})",
        config.address(),
        if settings.qa.enabled { "enabled" } else { "disabled" }
    );

    let server = GovGptServerBuilder::new()
        .config(config)
        .settings(settings)
        .build()
        .await
        .context("Failed to build server")?;

    server.start().await.context("Server failed")?;
    Ok(())
}
