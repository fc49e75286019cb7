//! HTTP server wiring for ttlpaste (API, pages, and shared state).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for the JSON API, health probe, and paste pages.
pub mod handlers;
/// HTML documents rendered by the page handler.
pub mod templates;

pub use ttlpaste_core::{
    config, models, store, AppError, Config, KvStore, PasteService, StoreBackend, DEFAULT_PORT,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    routing::post,
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Room for the JSON envelope around a maximum-size paste.
const BODY_ENVELOPE_OVERHEAD: usize = 64 * 1024;

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'; base-uri 'self'; form-action 'self'";

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pastes: Arc<PasteService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state over an opened store.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `store`: Store selected by `config.store`.
    ///
    /// # Returns
    /// A new [`AppState`].
    pub fn new(config: Config, store: Arc<dyn KvStore>) -> Self {
        let pastes = PasteService::new(store).with_max_paste_size(config.max_paste_size);
        Self::with_service(config, pastes)
    }

    /// Construct shared application state around a pre-built service.
    ///
    /// Tests use this to inject a service driven by a manual clock.
    pub fn with_service(config: Config, pastes: PasteService) -> Self {
        Self {
            pastes: Arc::new(pastes),
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
///
/// # Returns
/// Configured `axum::Router`.
pub fn create_app(state: AppState) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing `port` and the public access flag.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is disabled.
pub fn resolve_bind_address(config: &Config) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if config.allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn cors_layer(allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PUT];
    if allow_public_access {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = [
        format!("http://localhost:{}", cors_port),
        format!("http://127.0.0.1:{}", cors_port),
    ]
    .iter()
    .filter_map(|origin| origin.parse().ok())
    .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

fn create_app_with_cors_port(state: AppState, cors_port: u16) -> Router {
    let body_limit = state
        .config
        .max_paste_size
        .saturating_add(BODY_ENVELOPE_OVERHEAD);
    let cors = cors_layer(state.config.allow_public_access, cors_port);

    Router::new()
        // API routes
        .route("/api/healthz", get(handlers::health::healthz))
        .route("/api/pastes", post(handlers::paste::create_paste))
        .route("/api/pastes/batch", post(handlers::paste::create_pastes_batch))
        .route(
            "/api/pastes/:id",
            get(handlers::paste::get_paste).put(handlers::paste::update_paste),
        )
        // Server-rendered share links
        .route("/p/:id", get(handlers::page::view_paste_page))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}
