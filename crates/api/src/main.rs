//! S3 Manager - web server entry point

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use s3manager_domain::Config;
use s3manager_infra::config;
use s3manager_lib::cli::Cli;
use s3manager_lib::utils::logging::init_tracing;
use s3manager_lib::{router, AppContext};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }

    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) if cli.local_dev_mode => {
            warn!(error = %err, "no usable configuration, starting with defaults");
            Config::default()
        }
        Err(err) => return Err(err).context("failed to load configuration"),
    };
    cli.apply(&mut config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let ctx = Arc::new(AppContext::new(config).context("failed to initialize application")?);
    let sweeper = ctx.spawn_sweeper();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "S3 Manager listening");

    axum::serve(listener, router(ctx)).with_graceful_shutdown(shutdown_signal()).await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("S3 Manager stopped");
    Ok(())
}

fn load_config(cli: &Cli) -> s3manager_domain::Result<Config> {
    match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone())),
        None => config::load(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
