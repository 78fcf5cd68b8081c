//! Standalone MCP server binary for the Gerschel portal database.
//!
//! Spawned by an MCP host (Claude Desktop, Claude Code, ...). Protocol
//! traffic is Content-Length framed JSON-RPC 2.0 on stdin/stdout; logs go to
//! stderr and, optionally, a rolling log file.
//!
//! Environment variables:
//! - `GERSCHEL_DB_CONFIG` -- path to a JSON config file (default `~/.gerschel/mcp_config.json`)
//! - `GERSCHEL_DB_API_URL` -- query endpoint override
//! - `GERSCHEL_DB_TOKEN_PATH` -- bearer token file override
//! - `GERSCHEL_DB_TIMEOUT_SECS` -- HTTP request timeout
//! - `GERSCHEL_DB_LOG_DIR` -- enable file logging into this directory
//! - `RUST_LOG` -- log filter (default `info`)

use anyhow::Context;
use tracing::info;

use gerschel_db_mcp::config::ServerConfig;
use gerschel_db_mcp::mcp::handlers::query::HttpQueryTool;
use gerschel_db_mcp::mcp::server::{run_server, McpServer};
use gerschel_db_mcp::services::logger;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        // The logger may not be up yet.
        eprintln!("[gerschel-db-mcp] {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::load();
    logger::init(config.log_dir.as_deref()).context("failed to initialize logging")?;

    info!(
        api_url = %config.api_url,
        token_path = %config.token_path.display(),
        "{} {} starting",
        config.server_name,
        config.server_version
    );

    let tool = HttpQueryTool::new(&config).context("failed to build query tool")?;
    let server = McpServer::new(&config, tool);

    // Runs until the host closes stdin.
    run_server(tokio::io::stdin(), tokio::io::stdout(), &server)
        .await
        .context("stdio transport failed")?;

    info!("Shutting down");
    Ok(())
}
