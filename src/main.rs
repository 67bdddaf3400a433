// speech-gateway - JSON/HTTP to gRPC gateway for the Tiro speech service
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use speech_gateway::cli::Args;
use speech_gateway::config::AppConfig;
use speech_gateway::server;
use speech_gateway::utils::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration, flags take precedence
    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_args(&args);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting speech-gateway v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Dial backend and serve until shutdown
    if let Err(e) = server::run(config).await {
        error!("{}", e);
        std::process::exit(1);
    }

    Ok(())
}
