//! Documentation of the CivicDesk municipal-complaint backend.
//!
//! # General Infrastructure
//! - A single stateless HTTP process in front of two hosted collaborators:
//!   the data store (rows + storage buckets, see the `depot` crate) and a
//!   Redis instance holding session records.
//! - The SPA talks JSON to `/api/...` with a session cookie; CORS is locked
//!   to the configured SPA origin with credentials enabled.
//! - Requests are independent; there is no shared in-process mutable state
//!   beyond the per-request session lookup. All coordination problems
//!   (notably the resolved-counter dual write, see `lifecycle`) are
//!   documented there rather than papered over.
use std::time::Duration;

use axum::http::{HeaderValue, Method, header::CONTENT_TYPE};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod admin;
pub mod auth;
pub mod citizen;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod routes;
pub mod session;
pub mod staff;
pub mod stats;
pub mod state;

use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .cors_origin
                .parse::<HeaderValue>()
                .expect("CORS_ORIGIN must be a valid origin"),
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60));

    let app = routes::router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
