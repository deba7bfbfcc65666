use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_finder::api::router;
use schedule_finder::config::AppConfig;
use schedule_finder::db;
use schedule_finder::extraction::OpenAiExtractor;
use schedule_finder::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "schedule_finder=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections).await?;

    if config.extractor.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; uploads will fail at extraction");
    }
    if config.skip_database {
        info!("preview mode: uploads will not be saved");
    }

    let extractor = Arc::new(OpenAiExtractor::new(config.extractor.clone())?);
    let addr = config.bind_addr;
    let state = AppState::new(pool, extractor, config);

    let app = router(state);

    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
