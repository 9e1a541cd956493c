//! PideAI Storefront - cart API server.
//!
//! This binary serves the cart and product customization API on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - Cart engine from `pideai-core` (identity, transitions, validation)
//! - Carts persisted to memory, JSON files or `PostgreSQL`
//! - Catalog read from a JSON file and cached for 5 minutes
//! - Sentry for error capture, cart events recorded as breadcrumbs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use pideai_storefront::analytics::BreadcrumbAnalytics;
use pideai_storefront::cart::{CartDeps, CartRegistry};
use pideai_storefront::catalog::{CachedCatalog, Catalog, JsonCatalog};
use pideai_storefront::config::StorefrontConfig;
use pideai_storefront::report::{REPORT_LOG_TARGET, SentryReporter};
use pideai_storefront::routes;
use pideai_storefront::state::AppState;
use pideai_storefront::storage;
use sentry::integrations::tracing as sentry_tracing;
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
///
/// Report log lines are skipped; `SentryReporter` has already captured them.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    if metadata.target() == REPORT_LOG_TARGET {
        return sentry_tracing::EventFilter::Ignore;
    }
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pideai_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p pideai-cli -- migrate
    let cart_storage = storage::open(&config.storage)
        .await
        .expect("Failed to open cart storage");
    tracing::info!(storage = ?config.storage, "Cart storage ready");

    let json_catalog = JsonCatalog::from_path(&config.catalog_path)
        .await
        .expect("Failed to load catalog");
    for (product_id, problem) in json_catalog.check() {
        tracing::warn!(%product_id, error = %problem, "Catalog problem");
    }
    let catalog: Arc<dyn Catalog> = Arc::new(CachedCatalog::new(Arc::new(json_catalog)));

    let deps = CartDeps {
        storage: cart_storage,
        catalog: Arc::clone(&catalog),
        analytics: Arc::new(BreadcrumbAnalytics),
        reporter: Arc::new(SentryReporter),
    };
    let carts = CartRegistry::new(config.store_id.clone(), deps, config.cart_idle_timeout);
    let state = AppState::new(carts.clone(), catalog, config.default_selection);

    let app = routes::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!(store_id = %config.store_id, "storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let in-flight cart writes land before exiting
    carts.flush_all().await;
    tracing::info!("Pending cart writes flushed");
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
