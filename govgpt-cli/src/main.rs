//! GovGPT CLI - inspect and validate a GovGPT deployment's settings

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use govgpt_core::{
    function_loader::derive_function_name,
    init_logging, log_operation_error, log_operation_start, log_operation_success,
    url_security::{
        github_url_to_raw_url, is_url_allowed, Verdict, FUNCTION_DOMAINS_ENV, TOOL_DOMAINS_ENV,
    },
    GovGptConfig, LogFormat, LoggingConfig, UrlSecurityValidator,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "govgpt")]
#[command(about = "Inspect and validate GovGPT customization settings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the function and tool loading security configuration
    ValidateConfig,

    /// Run the reference URL list through both allow-list validators
    CheckUrls,

    /// Explain how a single URL would be treated by the loaders
    CheckUrl {
        /// URL to classify
        url: String,
    },

    /// Manage the configuration file
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,

        /// Overwrite an existing file when initializing
        #[arg(long)]
        force: bool,

        /// Validate current configuration
        #[arg(long)]
        validate: bool,
    },
}

/// URLs an approved-domain deployment is expected to accept
const SAMPLE_ALLOWED_URLS: &[&str] = &[
    "https://github.com/user/repo/blob/main/function.py",
    "https://raw.githubusercontent.com/user/repo/main/function.py",
    "https://gist.githubusercontent.com/user/gist_id/function.py",
];

/// URLs that must never pass, whatever the allow-list says
const SAMPLE_BLOCKED_URLS: &[&str] = &[
    "http://10.0.0.1/function.py",
    "http://192.168.1.1/function.py",
    "http://localhost/function.py",
    "http://internal.corp.local/function.py",
    "http://8.8.8.8/function.py",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let logging_config = LoggingConfig {
        level: if cli.verbose { "debug" } else { "warn" }.to_string(),
        format: LogFormat::Compact,
        include_location: false,
        filter_directives: Vec::new(),
        ..LoggingConfig::default()
    };
    init_logging(&logging_config).map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    info!("Starting GovGPT CLI v{}", env!("CARGO_PKG_VERSION"));

    let config = GovGptConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::ValidateConfig => handle_validate_config(&config),
        Commands::CheckUrls => handle_check_urls(&config),
        Commands::CheckUrl { url } => {
            handle_check_url(&config, &url);
            Ok(())
        }
        Commands::Config {
            show,
            init,
            force,
            validate,
        } => handle_config(cli.config.as_deref(), &config, show, init, force, validate),
    }
}

fn validators(config: &GovGptConfig) -> (UrlSecurityValidator, UrlSecurityValidator) {
    (
        UrlSecurityValidator::from_env(&config.security.function_domains, FUNCTION_DOMAINS_ENV),
        UrlSecurityValidator::from_env(&config.security.tool_domains, TOOL_DOMAINS_ENV),
    )
}

fn sorted(domains: HashSet<String>) -> Vec<String> {
    let mut domains: Vec<String> = domains.into_iter().collect();
    domains.sort();
    domains
}

fn print_domains(title: &str, domains: &[String]) {
    println!("{}:", title);
    if domains.is_empty() {
        println!("  Allowed domains: 0 (empty by default)");
    } else {
        println!("  Allowed domains: {}", domains.len());
        for domain in domains {
            println!("    - {}", domain);
        }
    }
}

fn env_display(name: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => format!("{:?}", value),
        _ => "not set".to_string(),
    }
}

fn handle_validate_config(config: &GovGptConfig) -> anyhow::Result<()> {
    log_operation_start!("validate_config");

    let (function_validator, tool_validator) = validators(config);
    let function_domains = sorted(function_validator.allowed_domains());
    let tool_domains = sorted(tool_validator.allowed_domains());

    println!("Function and Tool Loading Security Configuration");
    println!("{}", "=".repeat(60));

    print_domains("FUNCTION LOADING", &function_domains);
    println!();
    print_domains("TOOL LOADING", &tool_domains);

    println!("\nSUMMARY:");
    println!("  Total function domains: {}", function_domains.len());
    println!("  Total tool domains: {}", tool_domains.len());
    println!(
        "  Combined total: {}",
        function_domains.len() + tool_domains.len()
    );

    let loader = &config.loader;
    println!("\nSecurity features (always enabled):");
    println!("  - Private IP range blocking");
    println!("  - Localhost and loopback blocking");
    println!("  - Internal domain blocking");
    println!("  - Direct IP address blocking");
    println!("  - Content type validation");
    println!("  - File size limit ({} bytes)", loader.max_content_bytes);
    println!(
        "  - Request timeouts ({}s total, {}s connect)",
        loader.total_timeout_secs, loader.connect_timeout_secs
    );
    println!(
        "  - Rate limit ({} requests per {}s per user)",
        loader.max_requests_per_window, loader.window_secs
    );

    println!("\nEnvironment Variables:");
    println!("  {}: {}", FUNCTION_DOMAINS_ENV, env_display(FUNCTION_DOMAINS_ENV));
    println!("  {}: {}", TOOL_DOMAINS_ENV, env_display(TOOL_DOMAINS_ENV));

    println!("\nNote:");
    println!("  Function and tool loading allow no domains by default.");
    println!("  Add domains only when you need to load from specific sources.");
    println!("\n{}", "=".repeat(60));

    if let Err(e) = config.validate() {
        log_operation_error!("validate_config", e);
        return Err(anyhow!("Configuration validation failed: {}", e));
    }

    println!("Configuration is valid!");
    log_operation_success!(
        "validate_config",
        function_domains = function_domains.len(),
        tool_domains = tool_domains.len()
    );
    Ok(())
}

/// Outcome of running the sample URLs through one validator
#[derive(Debug, Default, PartialEq, Eq)]
struct UrlCheckReport {
    /// Sample "allowed" URLs the allow-list rejected
    rejected_allowed: Vec<String>,
    /// Sample "blocked" URLs that got through
    leaked_blocked: Vec<String>,
}

fn check_validator(validator: &UrlSecurityValidator, label: &str) -> UrlCheckReport {
    let mut report = UrlCheckReport::default();

    println!("\nTesting {} URL validator:", label);
    println!("  Allowed URLs:");
    for url in SAMPLE_ALLOWED_URLS {
        let allowed = validator.classify(url).is_allowed();
        println!("    {}: {}", if allowed { "PASS" } else { "FAIL" }, url);
        if !allowed {
            report.rejected_allowed.push(url.to_string());
        }
    }

    println!("  Blocked URLs:");
    for url in SAMPLE_BLOCKED_URLS {
        let allowed = validator.classify(url).is_allowed();
        println!("    {}: {}", if allowed { "FAIL" } else { "PASS" }, url);
        if allowed {
            report.leaked_blocked.push(url.to_string());
        }
    }

    report
}

fn handle_check_urls(config: &GovGptConfig) -> anyhow::Result<()> {
    log_operation_start!("check_urls");

    let (function_validator, tool_validator) = validators(config);
    println!("Testing URL security validators");
    println!("{}", "=".repeat(60));

    let function_report = check_validator(&function_validator, "FUNCTION");
    let tool_report = check_validator(&tool_validator, "TOOL");

    println!("\nTesting is_url_allowed() with the function allow-list:");
    let function_domains = function_validator.allowed_domains();
    let mut leaked: Vec<String> = Vec::new();
    for url in SAMPLE_BLOCKED_URLS {
        let allowed = is_url_allowed(url, Some(&function_domains));
        println!("    {}: {}", if allowed { "FAIL" } else { "PASS" }, url);
        if allowed {
            leaked.push(url.to_string());
        }
    }

    println!("\nCurrent Configuration:");
    println!("  Function allowed domains: {}", function_domains.len());
    println!("  Tool allowed domains: {}", tool_validator.allowed_domains().len());
    println!("\n{}", "=".repeat(60));

    leaked.extend(function_report.leaked_blocked);
    leaked.extend(tool_report.leaked_blocked);
    if !leaked.is_empty() {
        let error = anyhow!("{} blocked URL checks were allowed", leaked.len());
        log_operation_error!("check_urls", error, leaked = ?leaked);
        return Err(error);
    }

    let rejected = function_report.rejected_allowed.len() + tool_report.rejected_allowed.len();
    if rejected > 0 {
        println!(
            "{} sample URLs are outside the configured allow-lists (expected when no domains are approved)",
            rejected
        );
    }

    println!("URL security checks completed");
    log_operation_success!("check_urls", rejected_samples = rejected);
    Ok(())
}

fn describe_verdict(verdict: &Verdict) -> String {
    match verdict {
        Verdict::Allowed { host } => format!("allowed ({})", host),
        Verdict::Denied { host, reason } => match host {
            Some(host) => format!("denied: {} ({})", reason.describe(), host),
            None => format!("denied: {}", reason.describe()),
        },
    }
}

fn handle_check_url(config: &GovGptConfig, url: &str) {
    let (function_validator, tool_validator) = validators(config);
    let transformed = github_url_to_raw_url(url);

    println!("URL: {}", url);
    if transformed != url {
        println!("Fetched as: {}", transformed);
    }
    println!("Derived name: {}", derive_function_name(&transformed));

    for (label, validator) in [("function", &function_validator), ("tool", &tool_validator)] {
        println!("  {} loader:", label);
        println!("    requested URL: {}", describe_verdict(&validator.classify(url)));
        if transformed != url {
            println!(
                "    fetched URL:   {}",
                describe_verdict(&validator.classify(&transformed))
            );
        }
    }
}

fn handle_config(
    path: Option<&Path>,
    config: &GovGptConfig,
    show: bool,
    init: bool,
    force: bool,
    validate: bool,
) -> anyhow::Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(GovGptConfig::default_path);

    if init {
        if config_path.exists() && !force {
            return Err(anyhow!(
                "{} already exists; pass --force to overwrite it",
                config_path.display()
            ));
        }
        GovGptConfig::default().save_to_file(&config_path)?;
        println!("Configuration initialized at: {}", config_path.display());
    }

    if show {
        println!("Current configuration:");
        println!("{}", render_config(config)?);
    }

    if validate {
        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;
        println!("Configuration is valid");
    }

    Ok(())
}

/// TOML view of the settings with the QA API key masked
fn render_config(config: &GovGptConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if !shown.qa.api_key.is_empty() {
        shown.qa.api_key = "********".to_string();
    }
    Ok(toml::to_string_pretty(&shown)?)
}
