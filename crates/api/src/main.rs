use std::sync::Arc;

use anyhow::Context;

use arena_infra::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    arena_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = arena_api::app::services::build_services(&config)
        .await
        .context("failed to wire services")?;
    let services = Arc::new(services);

    let app = arena_api::app::build_app(services.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        storage = services.backend(),
        seeded = config.seed_demo_data,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
