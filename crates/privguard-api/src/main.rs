// Modified: 2026-03-14

//! # Privguard API Server
//!
//! REST API server for the Privguard data-privacy governance platform.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod error;
mod handlers;
mod routes;
mod state;

use privguard_core::config::PlatformConfig;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privguard_api=debug,tower_http=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = PlatformConfig::from_env()?;
    info!(port = config.server.port, "starting Privguard API server");

    // Initialize application state: catalog pool, graph store, sync
    // workers, sweeper, pipeline, orchestrator
    let state = AppState::new(config.clone()).await?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = routes::router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.server.max_body_size)),
    );

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Privguard API server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
