//! Groq-backed chat server with document context, webhooks and achievements
//!
//! (c) Softlandia 2025

use anyhow::{Context, anyhow};
use groq_chat_api::app;
use groq_chat_api::config::AppConfig;
use groq_chat_api::infrastructure::database::DatabaseConnection;
use log::info;
use tokio::runtime::{Builder, Runtime};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = app::services()
        .build_provider()
        .map_err(|e| anyhow!("failed to build service provider: {e:?}"))?;

    let config = provider.get_required::<AppConfig>();
    provider
        .get_required::<DatabaseConnection>()
        .migrate()
        .await
        .context("failed to migrate database")?;

    if config.default_api_key.is_none() {
        info!("GROQ_API_KEY is not set, users must configure their own key");
    }

    let app = app::router(provider, &config);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    info!("Shutting down...");

    Ok(())
}
