mod analysis;
mod config;
mod db;
mod errors;
mod interview;
mod llm_client;
mod media;
mod routes;
mod state;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::NoopFacialAnalyzer;
use crate::config::Config;
use crate::db::create_pool;
use crate::interview::inflight::InflightSessions;
use crate::interview::store::PgSessionStore;
use crate::llm_client::{LlmClient, LlmConfig};
use crate::media::MediaArchive;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Parley API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO for answer media archival
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize the model invocation adapter
    let llm = LlmClient::new(LlmConfig::new(
        config.anthropic_api_key.clone(),
        config.interview_model.clone(),
    ));
    info!("LLM client initialized (model: {})", llm.model());

    // Build app state
    let state = AppState {
        store: Arc::new(PgSessionStore::new(db)),
        model: Arc::new(llm),
        analyzer: Arc::new(NoopFacialAnalyzer),
        media: MediaArchive::new(s3, config.s3_bucket.clone()),
        inflight: InflightSessions::new(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "parley-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
