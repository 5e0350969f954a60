use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

use fastalert_mcp::config::Config;
use fastalert_mcp::fastalert::FastalertClient;
use fastalert_mcp::mcp::McpServer;

#[derive(Debug, Parser)]
#[command(version, about = "MCP server for sending FastAlert notifications")]
struct Args {
    /// Optional config file (toml, json or yaml)
    #[arg(env = "FASTALERT_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    init_logging()?;

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let client = Arc::new(FastalertClient::new(&config.fastalert, &config.connection)?);
    info!(base_url = client.base_url(), "FastAlert MCP server running on stdio");

    let mcp_server = Arc::new(McpServer::new(client));

    let shutdown_signal = tokio::signal::ctrl_c();

    tokio::select! {
        result = mcp_server.run() => {
            if let Err(e) = result {
                error!("MCP server error: {}", e);
                return Err(e);
            }
        }
        _ = shutdown_signal => {
            info!("Shutting down FastAlert MCP server");
            // stdin reads block a runtime thread, so don't wait on runtime teardown
            std::process::exit(0);
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    // Support both LOG_LEVEL and RUST_LOG environment variables
    let filter = if let Ok(rust_log) = std::env::var("RUST_LOG") {
        tracing_subscriber::EnvFilter::try_new(rust_log)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    } else if let Ok(log_level) = std::env::var("LOG_LEVEL") {
        let level_str = match log_level.to_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "warn",
        };
        tracing_subscriber::EnvFilter::new(level_str)
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr) // stdout carries the protocol
        .compact()
        .with_target(false)
        .init();

    Ok(())
}
