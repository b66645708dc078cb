use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::clients::memory_lol::MemoryLolRemote;
use crate::infra::config::{serper_key_from_env, AppConfig, Config, TwitterCredentials};
use crate::tools::twitter::format;

#[derive(Parser)]
#[command(name = "twitter-marketing-mcp")]
#[command(about = "Twitter/X MCP server. Runs the server when no subcommand is given.")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Look up the username change history of a screen name on memory.lol
    Lookup {
        /// Screen name, with or without the leading @
        screen_name: String,
        /// memory.lol base URL (defaults to config/env)
        #[arg(short, long)]
        url: Option<String>,
    },
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(warnings) => {
                for w in warnings {
                    println!("⚠️  {}", w);
                }
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Lookup { screen_name, url } => match lookup(&screen_name, url).await {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Lookup failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

/// Hard errors fail validation; missing credentials only disable tools, so
/// they come back as warnings.
fn validate_config() -> Result<Vec<String>, Box<dyn std::error::Error>> {
    Config::validate()?;

    let mut warnings = Vec::new();
    if let Err(e) = TwitterCredentials::from_env() {
        warnings.push(format!("Twitter tools disabled: {}", e));
    }
    if serper_key_from_env().is_none() {
        warnings.push("web_scrape disabled: serper_api not set".to_string());
    }
    Ok(warnings)
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    // A bare tools/list without a session is enough to see the endpoint answer.
    let tools_response = client
        .post(format!("{}/mcp", url))
        .header("content-type", "application/json")
        .header("accept", "application/json, text/event-stream")
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/list",
            "params": {}
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => println!("🔧 MCP endpoint: ✅ Available"),
        Ok(resp) => println!("🔧 MCP endpoint: ❌ HTTP {}", resp.status()),
        Err(_) => println!("🔧 MCP endpoint: ❌ Unavailable"),
    }

    let cfg = Config::from_env();
    let app = AppConfig::from_env_and_toml();
    println!("\n📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    println!(
        "  Twitter credentials: {}",
        if TwitterCredentials::from_env().is_ok() { "configured" } else { "Not configured" }
    );
    println!(
        "  Serper key: {}",
        if serper_key_from_env().is_some() { "configured" } else { "Not configured" }
    );
    println!(
        "  memory.lol: {}",
        app.memory_lol
            .base_url_or(crate::infra::config::DEFAULT_MEMORY_LOL_BASE_URL)
    );

    Ok(())
}

async fn lookup(screen_name: &str, url: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    let screen_name = format::strip_at(screen_name);
    if screen_name.is_empty() {
        return Err("screen name is empty".into());
    }
    let client = match url {
        Some(base) => MemoryLolRemote::new(base)?,
        None => MemoryLolRemote::from_config(&AppConfig::from_env_and_toml().memory_lol)?,
    };
    let history = client.history(screen_name).await?;
    Ok(format::username_history(screen_name, &history))
}
