//! formfill MCP Server
//!
//! Exposes form-filling passes as Model Context Protocol tools over stdio.

use clap::Parser;
use formfill::browser::{BrowserTarget, ConnectionOptions, LaunchOptions};
use formfill::config::FillerConfig;
use formfill::mcp::FormFillServer;
use rmcp::{ServiceExt, transport::stdio};

#[derive(Parser)]
#[command(name = "formfill-mcp")]
#[command(version)]
#[command(about = "Job application form filling MCP server", long_about = None)]
struct Cli {
    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<String>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<String>,

    /// Submit candidates tried before native form submission
    #[arg(long, default_value_t = 5)]
    max_submit_candidates: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let target = match cli.ws_endpoint {
        Some(endpoint) => {
            log::info!("WebSocket endpoint: {}", endpoint);
            BrowserTarget::Connect(ConnectionOptions::new(endpoint))
        }
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = cli.chrome_path {
                log::info!("Browser executable: {}", path);
                options = options.chrome_path(path);
            }
            if let Some(dir) = cli.user_data_dir {
                log::info!("User data directory: {}", dir);
                options = options.user_data_dir(dir);
            }
            log::info!("Browser mode: {}", if options.headless { "headless" } else { "headed" });
            BrowserTarget::Launch(options)
        }
    };

    let config = FillerConfig::new().max_submit_candidates(cli.max_submit_candidates);

    log::info!("formfill MCP server v{} ready on stdio", env!("CARGO_PKG_VERSION"));
    let server = FormFillServer::with_config(target, config).serve(stdio()).await?;
    let quit_reason = server.waiting().await?;
    log::info!("Server quit with reason: {:?}", quit_reason);

    Ok(())
}
