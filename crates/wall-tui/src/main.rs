mod action;
mod app;
mod http;
mod theme;
mod ui;
mod widgets;

use tokio::sync::{broadcast, mpsc};
use wall_core::mpv::MpvSdk;
use wall_core::{BroadcastMessage, WallCore, WallEvent};
use wall_proto::store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = wall_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tilewall.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // The terminal belongs to the TUI, so logs go to a file.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,wall_core=debug,wall_tui=debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tilewall log: {}", log_path.display());
    tracing::info!("tilewall starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match wall_proto::config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config unreadable ({:#}), using defaults", e);
            wall_proto::config::Config::default()
        }
    };

    // ── Broadcast channel (WallCore → TUI) ──────────────────────────────────
    let (broadcast_tx, broadcast_rx) = broadcast::channel::<BroadcastMessage>(1024);

    // ── WallEvent channel (TUI/HTTP → WallCore) ─────────────────────────────
    let (event_tx, event_rx) = mpsc::channel::<WallEvent>(1024);

    // ── Build WallCore ───────────────────────────────────────────────────────
    let store = JsonFileStore::open(config.paths.store_file.clone());
    tracing::info!("sources stored in {}", store.path().display());
    let wall_core = WallCore::new(
        MpvSdk::new(config.mpv.clone()),
        &config,
        Box::new(store),
        broadcast_tx.clone(),
    );
    let shared = wall_core.shared_state();

    // ── HTTP server ──────────────────────────────────────────────────────────
    if config.http.enabled {
        http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            shared.clone(),
            event_tx.clone(),
        );
    }

    // ── Spawn WallCore event loop ────────────────────────────────────────────
    let core_task = tokio::spawn(async move {
        if let Err(e) = wall_core.run(event_rx).await {
            tracing::error!("WallCore exited with error: {}", e);
        }
    });

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(event_tx.clone(), shared, config.wall.columns);
    let result = app.run(broadcast_rx).await;

    // Players are torn down by the core on shutdown; wait for it so no mpv
    // window outlives the UI.
    let _ = event_tx.send(WallEvent::Shutdown).await;
    let _ = core_task.await;
    tracing::info!("tilewall stopped");

    result
}
