use std::sync::Arc;

use anyhow::Context;

use moodlog_api::config::Config;
use moodlog_api::db::{self, MemoryMoodStore, MoodStore, PgMoodStore};
use moodlog_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn MoodStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .context("Failed to create database pool")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
            Arc::new(PgMoodStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, mood entries are kept in memory only");
            Arc::new(MemoryMoodStore::new())
        }
    };

    let state = AppState::new(config, store)?;

    state
        .voice
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create upload dir {}", state.voice.dir().display()))?;

    if state.insights.is_configured() {
        tracing::info!("Insight API key found, insights will be generated");
    } else {
        tracing::warn!("Insight API key not set, insights will use fallback messages");
    }

    let addr = state.config.listen_addr();
    let app = build_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
