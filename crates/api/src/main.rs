use anyhow::Context as _;

use gymjobs_api::app::{AppState, build_app};
use gymjobs_api::bootstrap::bootstrap;
use gymjobs_api::config::ServeConfig;
use gymjobs_api::services::Services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_format = ServeConfig::log_format_from(|var| std::env::var(var).ok())?;
    gymjobs_observability::init_with(log_format);

    let config = ServeConfig::from_env()?;
    let booted = bootstrap(&config, Services::in_memory()).context("registering job functions")?;
    let app = build_app(AppState::new(config.app_id.clone(), booted));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
