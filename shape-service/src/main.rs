use dotenvy::dotenv;
use service_core::observability::init_tracing;
use shape_service::config::ShapeConfig;
use shape_service::services::ShapeProvider;
use shape_service::services::providers::hunyuan::{HunyuanConfig, HunyuanShapeProvider};
use shape_service::startup::Application;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing("shape-service", "info");

    let config = ShapeConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    let provider: Arc<dyn ShapeProvider> = Arc::new(HunyuanShapeProvider::new(HunyuanConfig {
        space_url: config.hunyuan.space_url.clone(),
        hf_token: config.hunyuan.hf_token.clone(),
    }));

    let app = Application::build(config, provider).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        anyhow::anyhow!("Startup error: {}", e)
    })?;

    app.run_until_stopped().await?;

    Ok(())
}
