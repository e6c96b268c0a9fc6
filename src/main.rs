mod config;
mod error;
mod gemini;
mod intake;
mod web;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Fatal precondition: no credential, no server.
    let config = config::Config::from_env()?;
    info!(model = %config.model, addr = %config.bind_addr, "starting ai-nutritionist");

    let state = Arc::new(web::AppState {
        http: reqwest::Client::new(),
        config: config.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, web::router(state)).await?;
    Ok(())
}
