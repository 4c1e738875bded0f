use std::sync::Arc;

use anyhow::Context;
use leadsync_api::{router, AppContext};
use leadsync_common::{init_tracing, LogFormat};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info", LogFormat::from_env()).context("failed to install tracing subscriber")?;

    let config = leadsync_infra::config::load().context("failed to load configuration")?;
    let ctx = Arc::new(AppContext::new(config).context("failed to initialize application")?);

    ctx.start_background_jobs().await.context("failed to start background jobs")?;

    let address = ctx.config.server.bind_address.clone();
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;
    info!(%address, "leadsync listening");

    let served = axum::serve(listener, router(ctx.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(err) = ctx.shutdown().await {
        error!(error = %err, "shutdown did not complete cleanly");
    }
    served.context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
