// Framework bootstrap for the snake server runtime.

use crate::frameworks::config;
use crate::interface_adapters::net::{room_status_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{MatchRegistry, MatchSettings};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let settings = settings_from_env();
    tracing::info!(
        board_width = settings.board.width,
        board_height = settings.board.height,
        tick_ms = settings.tick_interval.as_millis() as u64,
        match_secs = settings.match_duration.as_secs(),
        "match settings"
    );
    run_with_settings(listener, settings).await
}

/// Serves the game on an already bound listener with explicit match settings.
pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    settings: MatchSettings,
) -> Result<()> {
    let address = listener.local_addr()?;
    let state = Arc::new(AppState {
        registry: Arc::new(MatchRegistry::new(settings)),
    });

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms/{code}", get(room_status_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_host(), config::http_port());

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn settings_from_env() -> MatchSettings {
    MatchSettings {
        board: config::board_size(),
        tick_interval: config::tick_interval(),
        match_duration: config::match_duration(),
        event_broadcast_capacity: config::EVENT_BROADCAST_CAPACITY,
    }
}
