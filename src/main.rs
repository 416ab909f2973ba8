mod config;
mod error;
mod gemini;
mod llm_client;
mod logging;
mod models;
mod request_id;
mod router;

use clap::Parser;
use config::{Config, DEFAULT_API_BASE, DEFAULT_MODEL, VendorOptions};
use llm_client::GeminiClient;
use router::{AppState, build_router};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};

#[derive(Parser, Debug)]
#[command(name = "gemini-proxy")]
#[command(about = "Relays a query and images to Gemini and returns the generated text")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    ip: String,

    #[arg(short, long, default_value = "5000")]
    port: u16,

    /// Gemini model identifier
    #[arg(short, long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Also write logs to this file (capped at 10 MiB)
    #[arg(long)]
    log_file: Option<String>,

    /// socks and http proxy for vendor calls, example: socks5://192.168.0.2:10080
    #[arg(long)]
    proxy: Option<String>,

    /// Per-request timeout for vendor calls; none by default
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Local development convenience; deployments set the environment directly
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using INFO level.", args.log_level);
        Level::INFO
    });
    logging::init_logging(log_level, args.log_file.as_deref());

    let config = Arc::new(Config::from_env(VendorOptions {
        model: args.model,
        api_base: args.api_base,
        timeout: args.timeout_secs.map(Duration::from_secs),
        proxy: args.proxy,
    })?);
    info!("Configuration loaded: {:?}", config);

    let http_client = Arc::new(GeminiClient::build_http_client(&config)?);
    let generator = Arc::new(GeminiClient::new(http_client, config.clone()));
    info!("Using model {}", generator.model());

    let app = build_router(AppState { config, generator });

    let bind_address = format!("{}:{}", args.ip, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Server started on http://{}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
