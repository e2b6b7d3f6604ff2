use anyhow::{Context, Result};
use listing_scout::{
    app_state::AppState, browser::ChromiumLauncher, config::Config, miner::RegexCategoryMiner,
    pipeline::AnalysisPipeline, report::GeminiFactory, routes,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);

    let generators = GeminiFactory::new(config.gemini_base_url())
        .context("Failed to build generation client")?;
    let pipeline = AnalysisPipeline::new(
        Arc::clone(&config),
        Arc::new(ChromiumLauncher::new()),
        Arc::new(RegexCategoryMiner::new()),
    );
    let app = routes::router(AppState::new(pipeline, Arc::new(generators)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
