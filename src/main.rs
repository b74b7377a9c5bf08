// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use simple_load_balancer::{
    cli::Cli,
    config::{load_config, LogFormat},
    server::{RequestHandler, ServerBuilder},
    telemetry, LoadBalancer,
};

#[tokio::main]
async fn main() {
    telemetry::install_panic_hook();

    if let Err(e) = run().await {
        error!(error = ?e, "command failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Optional config file; environment variables override it.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            telemetry::init(LogFormat::Text, cli.debug_logging())?;
            return Err(e);
        }
    };
    telemetry::init(config.log_format, cli.debug_logging())?;
    debug!(?config, "config loaded");

    let addr = config.listen_addr()?;
    let balancer = Arc::new(
        LoadBalancer::new(&config).context("Failed to build load balancer")?,
    );
    if balancer.pool().is_empty() {
        warn!("No backends configured, every request will be answered with 503");
    }

    balancer.start();

    info!(url = %format!("http://{}", addr), backends = balancer.pool().len(), "service started");

    ServerBuilder::new(addr)
        .with_handler(RequestHandler::new(balancer))
        .serve()
        .await
}
