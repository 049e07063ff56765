use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use epg_cache_core::{
    load_config, load_config_from_env, validate_config, Config, EpgSource, EpgStore, PiconIndex,
    QueryService, RefreshControl, RefreshScheduler, SearchIndex, SqliteEpgStore, TvheadendClient,
};
use epg_cache_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load()?;
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("TVHeadend URL: {}", config.tvheadend.url);

    let store: Arc<dyn EpgStore> = Arc::new(
        SqliteEpgStore::new(&config.database.path).context("Failed to open EPG store")?,
    );

    // Serve searches from the persisted cache until the first refresh lands.
    let search_index = Arc::new(SearchIndex::new());
    search_index
        .rebuild(store.as_ref())
        .context("Failed to build search index")?;

    let source: Arc<dyn EpgSource> = Arc::new(
        TvheadendClient::new(&config.tvheadend).context("Failed to create TVHeadend client")?,
    );

    let scheduler = Arc::new(RefreshScheduler::new(
        source,
        Arc::clone(&store),
        Arc::clone(&search_index),
        config.refresh.interval(),
    ));

    let mut query = QueryService::new(
        Arc::clone(&store),
        search_index,
        Arc::clone(&scheduler) as Arc<dyn RefreshControl>,
        config.refresh.interval_secs,
    );

    match &config.picons {
        Some(picon_config) => {
            let picons = PiconIndex::open(&picon_config.build_source_path)
                .context("Failed to load picon index")?;
            query = query.with_picons(Arc::new(picons));
        }
        None => info!("Picons not configured"),
    }

    let app = create_router(Arc::new(AppState::new(query)));

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    scheduler.start().await;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.stop().await;

    Ok(())
}

/// Load from the file named by `EPG_CACHE_CONFIG` (default `config.toml`).
///
/// Without a file, configuration comes from `EPG_CACHE_*` variables alone.
fn load() -> Result<Config> {
    let explicit = std::env::var("EPG_CACHE_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    if config_path.exists() || explicit.is_some() {
        info!("Loading configuration from {:?}", config_path);
        return load_config(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path));
    }

    warn!("No config file found, using environment variables only");
    load_config_from_env().context("Failed to load config from environment")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
}
