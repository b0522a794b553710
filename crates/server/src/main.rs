//! Bazaar shop server.
//!
//! Serves the JSON API for customers and admins.
//!
//! # Storage
//!
//! - `BAZAAR_STORAGE=postgres` (default): documents and sessions in `PostgreSQL`.
//!   Run `bz-cli migrate` first; migrations are not run on startup.
//! - `BAZAAR_STORAGE=memory`: everything in process memory, lost on restart.
//!
//! The root admin named by `ROOT_ADMIN_EMAIL` is created on startup when
//! `ROOT_ADMIN_PASSWORD` is set and the account does not exist yet.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::Router;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bazaar_server::build_app;
use bazaar_server::config::{ServerConfig, StorageConfig};
use bazaar_server::db::{self, MemoryStore, PgStore, Store};
use bazaar_server::middleware::create_session_layer;
use bazaar_server::services::AuthService;
use bazaar_server::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            traces_sample_rate: config.sentry_traces_sample_rate,
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

/// Build the store, the session layer and the router for the configured backend.
async fn assemble(config: &ServerConfig) -> Router {
    match &config.storage {
        StorageConfig::Postgres { database_url } => {
            let pool = db::create_pool(database_url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");

            let sessions = tower_sessions_sqlx_store::PostgresStore::new(pool.clone());
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
            let state = bootstrap(config, store).await;
            build_app(state, create_session_layer(sessions, config))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            let state = bootstrap(config, store).await;
            build_app(
                state,
                create_session_layer(tower_sessions::MemoryStore::default(), config),
            )
        }
    }
}

/// Create the application state and make sure the root admin is in place.
async fn bootstrap(config: &ServerConfig, store: Arc<dyn Store>) -> AppState {
    let state = AppState::new(config.clone(), store);

    let password = config
        .root_admin_password
        .as_ref()
        .map(|p| p.expose_secret().to_owned());
    let root = AuthService::new(state.store())
        .ensure_root_admin(state.root_admin(), password.as_deref())
        .await
        .expect("Failed to bootstrap the root admin");
    match root {
        Some(user) => tracing::info!(user_id = %user.id, "Root admin ready"),
        None => tracing::warn!(
            "Root admin account does not exist; set ROOT_ADMIN_PASSWORD to create it"
        ),
    }

    state
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bazaar_server=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let app = assemble(&config).await;

    let addr = config.socket_addr();
    tracing::info!("bazaar listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
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
