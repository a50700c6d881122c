//! Pomelo Market storefront - public cart API.
//!
//! This binary serves the cart JSON API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON request/response bodies
//! - The cart aggregate from `pomelo-core`, one guarded session per cart ID
//! - A durable key-value snapshot store: `PostgreSQL` when
//!   `POMELO_DATABASE_URL` is set, in-process memory otherwise
//! - A static catalog seeded from `POMELO_CATALOG_PATH` standing in for the
//!   remote catalog service

#![cfg_attr(not(test), forbid(unsafe_code))]
// Modules are shared with the library target; not every helper is reachable from the binary
#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

mod cart;
mod catalog;
mod checkout;
mod config;
mod error;
mod routes;
mod state;

use cart::{CartStore, MemoryCartStore, PgCartStore};
use catalog::{Catalog, StaticCatalog};
use config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Pick the snapshot store: Postgres when configured, memory otherwise.
async fn create_store(config: &StorefrontConfig) -> Arc<dyn CartStore> {
    match &config.database_url {
        Some(url) => {
            let pool = cart::store::create_pool(url)
                .await
                .expect("Failed to create database pool");
            let store = PgCartStore::new(pool);
            store
                .ensure_schema()
                .await
                .expect("Failed to prepare cart_snapshots table");
            tracing::info!("Cart snapshots stored in PostgreSQL");
            Arc::new(store)
        }
        None => {
            tracing::warn!("POMELO_DATABASE_URL not set; cart snapshots are in-memory only");
            Arc::new(MemoryCartStore::new())
        }
    }
}

/// Load the catalog seed, or run with an empty catalog.
fn create_catalog(config: &StorefrontConfig) -> Arc<dyn Catalog> {
    match &config.catalog_path {
        Some(path) => {
            let catalog =
                StaticCatalog::from_json_file(path).expect("Failed to load catalog seed");
            tracing::info!(products = catalog.len(), "Catalog seeded");
            Arc::new(catalog)
        }
        None => {
            tracing::warn!("POMELO_CATALOG_PATH not set; catalog is empty");
            Arc::new(StaticCatalog::default())
        }
    }
}

#[tokio::main]
async fn main() {
    // Load .env if present, then configuration (needed for Sentry init)
    dotenvy::dotenv().ok();
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pomelo_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let store = create_store(&config).await;
    let catalog = create_catalog(&config);

    // Build application state
    let state = AppState::new(config.clone(), store, catalog);

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies snapshot-store connectivity before returning OK.
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
