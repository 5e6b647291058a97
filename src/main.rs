//! Stagehand - Desktop control MCP server
//!
//! Exposes mouse, keyboard, screenshot and screen info tools to AI assistants
//! over stdio.

use std::time::Duration;

use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use stagehand::core::config::Settings;
use stagehand::server::DesktopServer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// MCP server for desktop control.
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Do not abort input actions when the cursor is in the top-left corner.
    #[arg(long)]
    no_fail_safe: bool,

    /// Pause after every input action, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pause_ms: u64,

    /// Skip the startup permission check.
    #[arg(long)]
    skip_permission_check: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing (stderr to keep stdout clean for MCP protocol)
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Stagehand MCP Server");

    let platform = stagehand::platform::detect();
    if args.skip_permission_check {
        tracing::debug!("Permission check skipped");
    } else {
        platform.prime_permissions();
    }

    let settings = Settings::new(Duration::from_millis(args.pause_ms))
        .with_fail_safe(!args.no_fail_safe);
    if !settings.fail_safe {
        tracing::warn!("Fail-safe disabled");
    }

    let server = DesktopServer::new(settings, platform);

    tracing::info!("Stagehand MCP Server ready, listening on stdio");

    let service = server.serve(stdio()).await?;

    // Wait for graceful shutdown
    service.waiting().await?;

    tracing::info!("Stagehand MCP Server shutting down");
    Ok(())
}
