use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use video_gen_proxy::{AppConfig, AppState, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_address = config.bind_address();
    info!(
        image_endpoint = %config.image_endpoint,
        video_endpoint = %config.video_endpoint,
        "upstream models configured"
    );

    let router = build_router(AppState::new(config));
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!("video generation server started at http://{bind_address}/api");

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
