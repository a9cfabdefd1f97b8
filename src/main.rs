use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use http::HeaderValue;
use tokio::sync::mpsc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use housestock_api::config::{init_tracing, load_config};
use housestock_api::events::{process_events, EventSender};
use housestock_api::models::Permissions;
use housestock_api::services::{CatalogRegistry, InventoryService};
use housestock_api::store::MemoryStore;
use housestock_api::{app_router, AppState};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const EVENT_CHANNEL_CAPACITY: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;
    init_tracing(config.log_level(), config.log_json);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "starting housestock-api"
    );

    let store = Arc::new(MemoryStore::new());
    if config.demo_mode {
        store.seed_demo(&config.default_inventory_id).await;
    }

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(process_events(event_rx));

    // A single-tenant deployment serves its default inventory with full
    // rights; multi-user grants live on the inventory document.
    let service = InventoryService::connect(
        store,
        &config.default_inventory_id,
        Permissions::full(),
        None,
        EventSender::new(event_tx),
        config.demo_mode,
    )
    .await
    .context("failed to attach to inventory")?;

    let registry = match &config.registry_path {
        Some(path) => CatalogRegistry::load(path)
            .map_err(|e| anyhow::anyhow!("failed to load catalog registry: {}", e))?,
        None => CatalogRegistry::with_defaults(),
    };

    let cors = match &config.cors_allowed_origins {
        Some(origins) => {
            let origins = origins
                .split(',')
                .map(|o| o.trim().parse::<HeaderValue>())
                .collect::<Result<Vec<_>, _>>()
                .context("invalid CORS origin")?;
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let state = AppState {
        config: Arc::new(config.clone()),
        service: Arc::new(service),
        registry: Arc::new(registry),
    };

    let app = app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c"),
        _ = terminate => info!("received terminate signal"),
    }
}
