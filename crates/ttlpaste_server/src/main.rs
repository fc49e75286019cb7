//! Paste API server entrypoint.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ttlpaste_core::{store, Config, KvStore, DEFAULT_PORT};
use ttlpaste_server::{resolve_bind_address, serve_router, AppState};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    check_store: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => flags.help = true,
            "--check-store" => flags.check_store = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

async fn check_store(store: &dyn KvStore, backend: &str) -> anyhow::Result<()> {
    match store.ping().await {
        Ok(()) => {
            println!("{} store is reachable", backend);
            Ok(())
        }
        Err(err) => anyhow::bail!("{} store is unreachable: {}", backend, err),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let dotenv_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttlpaste=info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = dotenv_path {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env()?;
    let kv: Arc<dyn KvStore> = store::open(&config.store)?;
    tracing::info!("Using {:?} store backend", config.store);

    if cli_flags.check_store {
        return check_store(kv.as_ref(), config.store.name()).await;
    }

    if let Err(err) = kv.ping().await {
        tracing::warn!(
            "Store ping failed at startup: {}. Requests will fail until it recovers",
            err
        );
    }

    if config.allow_public_access {
        tracing::warn!("Public access enabled - server will accept requests from any origin");
    }

    let bind_addr = resolve_bind_address(&config);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }

    let state = AppState::new(config, kv);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("ttlpaste running at http://{}", actual_addr);

    serve_router(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");

    Ok(())
}

fn print_help() {
    println!("ttlpaste server\n");
    println!("Usage: ttlpaste [OPTIONS]\n");
    println!("Options:");
    println!("  --check-store     Ping the configured store and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables (also read from .env):");
    println!(
        "  PORT              Server port (default: {})",
        DEFAULT_PORT
    );
    println!(
        "  BIND              Override bind address (e.g. 0.0.0.0:{})",
        DEFAULT_PORT
    );
    println!("  ALLOW_PUBLIC_ACCESS  Allow non-loopback binds and CORS from any origin");
    println!("  STORE_BACKEND     memory | upstash (default: upstash when credentials are set)");
    println!("  UPSTASH_REDIS_REST_URL    Upstash REST endpoint");
    println!("  UPSTASH_REDIS_REST_TOKEN  Upstash REST token");
    println!("  PUBLIC_BASE_URL   Origin used in share links (default: derived from request)");
    println!("  MAX_PASTE_SIZE    Maximum paste size in bytes (default: 10MB)");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
