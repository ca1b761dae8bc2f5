use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use wall_core::{SharedState, WallEvent};
use wall_proto::protocol::{Command, WallState, TILE_COUNT};

#[derive(Clone)]
struct HttpState {
    shared: SharedState,
    event_tx: mpsc::Sender<WallEvent>,
}

#[derive(Deserialize)]
struct SourceBody {
    reference: String,
}

pub fn start_server(
    bind_address: String,
    port: u16,
    shared: SharedState,
    event_tx: mpsc::Sender<WallEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(shared, event_tx);

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

fn router(shared: SharedState, event_tx: mpsc::Sender<WallEvent>) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/tiles/:tile/load", post(load_tile))
        .route("/api/tiles/:tile/reload", post(reload_tile))
        .route("/api/tiles/:tile/focus", post(focus_tile))
        .route("/api/tiles/:tile/source", put(set_source))
        .route("/api/load-all", post(load_all))
        .route("/api/mute-all", post(mute_all))
        .route("/api/pause-all", post(pause_all))
        .route("/api/play-all-muted", post(play_all_muted))
        .layer(CorsLayer::permissive())
        .with_state(HttpState { shared, event_tx })
}

async fn get_state(State(state): State<HttpState>) -> Json<WallState> {
    Json(state.shared.get_state().await)
}

async fn forward(state: &HttpState, cmd: Command) -> StatusCode {
    info!("HTTP API: {:?}", cmd);
    if state.event_tx.send(WallEvent::ClientCommand(cmd)).await.is_err() {
        error!("Failed to forward command, wall core is gone");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::ACCEPTED
}

fn check_tile(tile: usize) -> Result<usize, StatusCode> {
    if tile < TILE_COUNT {
        Ok(tile)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn load_tile(State(state): State<HttpState>, Path(tile): Path<usize>) -> StatusCode {
    match check_tile(tile) {
        Ok(tile) => forward(&state, Command::Load { tile }).await,
        Err(code) => code,
    }
}

async fn reload_tile(State(state): State<HttpState>, Path(tile): Path<usize>) -> StatusCode {
    match check_tile(tile) {
        Ok(tile) => forward(&state, Command::Reload { tile }).await,
        Err(code) => code,
    }
}

async fn focus_tile(State(state): State<HttpState>, Path(tile): Path<usize>) -> StatusCode {
    match check_tile(tile) {
        Ok(tile) => forward(&state, Command::Focus { tile }).await,
        Err(code) => code,
    }
}

async fn set_source(
    State(state): State<HttpState>,
    Path(tile): Path<usize>,
    Json(body): Json<SourceBody>,
) -> StatusCode {
    match check_tile(tile) {
        Ok(tile) => {
            let cmd = Command::SetSource {
                tile,
                reference: body.reference,
            };
            forward(&state, cmd).await
        }
        Err(code) => code,
    }
}

async fn load_all(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Command::LoadAll).await
}

async fn mute_all(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Command::MuteAll).await
}

async fn pause_all(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Command::PauseAll).await
}

async fn play_all_muted(State(state): State<HttpState>) -> StatusCode {
    forward(&state, Command::PlayAllMuted).await
}
