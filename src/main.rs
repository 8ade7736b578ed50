//! Booking Timer - durable service-duration countdown server
//!
//! This is the main entry point for the booking-timer application.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use booking_timer::{
    api::create_router,
    clock::SystemClock,
    config::Config,
    services::HttpBookingSource,
    session::SessionDeps,
    state::AppState,
    store::FileStore,
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "booking_timer={},tower_http=info",
            config.log_level()
        ))
        .init();

    info!("Starting booking-timer server v{}", env!("CARGO_PKG_VERSION"));
    let intervals = config.intervals();
    info!(
        "Configuration: host={}, port={}, api={}, tick={:?}, poll={:?}",
        config.host, config.port, config.api_url, intervals.tick, intervals.poll
    );

    let store_path = config.store_path()?;
    let store = FileStore::open(&store_path).await?;
    info!("Persisting timers to {}", store.path().display());

    let source = HttpBookingSource::new(
        config.api_url.clone(),
        config.api_token.clone(),
        config.request_timeout(),
    )?;

    let deps = SessionDeps {
        source: Arc::new(source),
        store: Arc::new(store),
        clock: Arc::new(SystemClock),
        intervals,
    };
    let state = Arc::new(AppState::new(deps, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /bookings/:id/session     - Open booking session");
    info!("  DELETE /bookings/:id/session     - Close booking session");
    info!("  GET    /bookings/:id/timer       - Timer and booking status");
    info!("  POST   /bookings/:id/timer/start - Start service timer");
    info!("  POST   /bookings/:id/timer/stop  - Stop service timer");
    info!("  GET    /status                   - Open sessions and uptime");
    info!("  GET    /health                   - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.close_all().await;
    info!("Server shutdown complete");
    Ok(())
}
