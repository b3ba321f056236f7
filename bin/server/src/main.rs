use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::{error, info, instrument};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dto;
mod errors;
mod identity;
mod routers;
mod service;

use config::{Args, Settings};
use service::MessagingService;

/// Health check endpoint
#[instrument(skip(service))]
async fn healthcheck(
    Extension(service): Extension<Arc<MessagingService>>,
) -> Result<Json<Value>, StatusCode> {
    if service.is_healthy().await {
        Ok(Json(json!({"status": "healthy"})))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

/// Build the Axum router around a messaging service
fn build_router(service: Arc<MessagingService>) -> Router {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/api", routers::create_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
                .layer(CorsLayer::permissive())
                .layer(Extension(service)),
        )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "schoolmail_server=debug,schoolmail_core=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let args = Args::parse();
    let settings = Settings::load(&args)?;
    info!(
        "Starting SchoolMail server ({} store, {:?} directory)",
        settings.messaging.store.store_type, settings.messaging.directory.directory_type
    );

    // Create the app
    let service = Arc::new(MessagingService::new(&settings).await?);
    let app = build_router(Arc::clone(&service));

    // Start the server
    let listener = tokio::net::TcpListener::bind(&settings.server_address()).await?;
    info!("Server listening on {}", settings.server_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.close().await?;
    Ok(())
}
