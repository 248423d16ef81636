//! Fatebook MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server for Fatebook prediction tracking.
//! Provides tools for creating, forecasting on, resolving and managing questions.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use fatebook_mcp_server_rust::config::Config;
use fatebook_mcp_server_rust::error::Result;
use fatebook_mcp_server_rust::fatebook::client::FatebookClient;
use fatebook_mcp_server_rust::mcp::server::McpServer;
use fatebook_mcp_server_rust::mcp::tools::tool_catalogue;

/// Fatebook MCP Server
#[derive(Parser)]
#[command(name = "fatebook-mcp-server")]
#[command(author, version, about = "Fatebook MCP Server - A Model Context Protocol server for Fatebook")]
struct Cli {
    /// Fatebook API base URL (overrides FATEBOOK_API_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides FATEBOOK_TIMEOUT_SECS)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool catalogue as JSON and exit
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries the protocol
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Tools) => {
            println!("{}", serde_json::to_string_pretty(&tool_catalogue())?);
        }
        None => {
            // Load configuration
            let mut config = Config::new()?;
            if let Some(base_url) = cli.base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(secs) = cli.timeout_secs {
                config = config.with_timeout(Duration::from_secs(secs));
            }

            run_server(config).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    if config.api_key.is_none() {
        tracing::warn!(
            "FATEBOOK_API_KEY is not set; tool calls must pass apiKey explicitly"
        );
    }

    tracing::info!(base_url = %config.base_url, timeout = ?config.request_timeout, "Starting Fatebook MCP server");

    // Create Fatebook client
    let client = Arc::new(FatebookClient::new(&config)?);

    // Create and run MCP server
    let mut server = McpServer::new(client);
    server.run_stdio().await?;

    Ok(())
}
