use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod db;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use config::Config;
use db::MoodStore;
use services::insight::InsightGenerator;
use services::voice::VoiceStorage;

/// Headroom for multipart boundaries and part headers on top of the file.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MoodStore>,
    pub insights: InsightGenerator,
    pub voice: VoiceStorage,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MoodStore>) -> anyhow::Result<Self> {
        let insights = InsightGenerator::new(&config)?;
        let voice = VoiceStorage::new(&config);
        Ok(Self {
            store,
            insights,
            voice,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.voice.max_bytes() + MULTIPART_OVERHEAD_BYTES;

    let upload_routes = Router::new()
        .route("/upload-voice", post(handlers::voice::upload_voice))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/voice/:filename", get(handlers::voice::serve_voice))
        .route("/mood-log", post(handlers::moods::create_mood_entry))
        .route("/mood-history", get(handlers::moods::list_mood_history))
        .route("/mood/:id", delete(handlers::moods::delete_mood_entry))
        .route("/mood/:id/insight", get(handlers::moods::get_mood_insight))
        .merge(upload_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if config.frontend_url == "*" || config.cors_extra_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let mut origins: Vec<HeaderValue> = Vec::new();
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(origin = %config.frontend_url, "Ignoring invalid FRONTEND_URL"),
    }
    for o in &config.cors_extra_origins {
        match o.parse::<HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::warn!(origin = %o, "Ignoring invalid CORS_EXTRA_ORIGINS entry"),
        }
    }
    cors.allow_origin(origins)
}
