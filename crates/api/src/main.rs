use anyhow::Context;

use opsdeck_infra::EngineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env().context("invalid configuration")?;
    opsdeck_observability::init(config.log_format);

    let services = opsdeck_api::app::services::build_services(&config).await?;
    let app = opsdeck_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        persistent = config.use_persistent_stores,
        score_all_concurrency = config.score_all_concurrency,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
