mod coach;
mod config;
mod db;
mod errors;
mod insights;
mod llm_client;
mod media;
mod models;
mod persistence;
mod routes;
mod state;
mod store;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::insights::LlmAnalyzer;
use crate::llm_client::LlmClient;
use crate::media::S3MediaStore;
use crate::persistence::postgres::PgGateway;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::SessionRegistry;

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

    info!("Starting Soul Compass API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let gateway = Arc::new(PgGateway::new(pool));

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let media = Arc::new(S3MediaStore::new(
        s3,
        config.s3_bucket.clone(),
        config.s3_endpoint.clone(),
    ));
    info!("S3 media store initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client and the analysis capability over it
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    let analyzer = Arc::new(LlmAnalyzer::new(llm.clone()));
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        gateway,
        media,
        llm,
        analyzer,
        sessions: SessionRegistry::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = config.bind_addr().parse()?;
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
        "soul-compass-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
