/// mpv-backed player SDK: one mpv process per tile.
///
/// ```text
///   MpvSdk::construct()
///         │
///         └── tile worker task  ← PlayerOp via unbounded mpsc (never blocks the core)
///                 ├── spawns mpv with its own IPC socket
///                 ├── writer task ← IpcRequest via mpsc, serialises → socket
///                 └── reader task ← JSON lines from socket
///                                     ├── response (has request_id) → matched oneshot
///                                     └── event ("file-loaded", …)   → worker
/// ```
///
/// "Loading the SDK" means locating mpv and checking that it runs.  A player
/// is ready once mpv reports `file-loaded` for its video.
///
/// Platform notes:
/// - Unix:   Unix domain sockets
/// - Windows: Named pipes  \\.\pipe\<name>
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

use wall_proto::config::MpvConfig;
use wall_proto::platform;
use wall_proto::VideoId;

use crate::sdk::{MountTarget, PlayerConfig, PlayerInstance, PlayerSdk, ReadyCallback};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<anyhow::Result<Value>>>>>;

// ── IPC link ──────────────────────────────────────────────────────────────────

struct IpcRequest {
    req_id: u64,
    line: String,
    reply: oneshot::Sender<anyhow::Result<Value>>,
}

/// Request/response channel to one mpv process.
#[derive(Clone)]
struct IpcLink {
    tx: mpsc::Sender<IpcRequest>,
}

impl IpcLink {
    async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&json!({ "command": command, "request_id": req_id }))?;
        line.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(IpcRequest {
                req_id,
                line,
                reply: reply_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("mpv writer task gone"))?;

        tokio::time::timeout(Duration::from_secs(5), reply_rx)
            .await
            .map_err(|_| anyhow::anyhow!("mpv IPC timeout for req={}", req_id))?
            .map_err(|_| anyhow::anyhow!("mpv reply channel dropped req={}", req_id))?
    }

    async fn set_property(&self, name: &str, value: Value) -> anyhow::Result<()> {
        self.send(json!(["set_property", name, value])).await?;
        Ok(())
    }

    fn start<R, W>(read_half: R, write_half: W) -> (Self, mpsc::Receiver<Value>)
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
        W: tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (req_tx, req_rx) = mpsc::channel::<IpcRequest>(64);
        let (event_tx, event_rx) = mpsc::channel::<Value>(64);
        tokio::spawn(writer_task(write_half, req_rx, pending.clone()));
        tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));
        (Self { tx: req_tx }, event_rx)
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<Value>)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    let reason = loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => break "connection closed".to_string(),
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("mpv reader: invalid json '{}': {}", trimmed, e);
                        continue;
                    }
                };
                match val.get("request_id").and_then(Value::as_u64) {
                    Some(req_id) => {
                        let Some(tx) = pending.lock().await.remove(&req_id) else {
                            debug!("mpv reader: response for unknown req={}", req_id);
                            continue;
                        };
                        let result = match val.get("error").and_then(Value::as_str) {
                            Some("success") => Ok(val),
                            other => Err(anyhow::anyhow!(
                                "mpv error: {}",
                                other.unwrap_or("unknown error")
                            )),
                        };
                        let _ = tx.send(result);
                    }
                    None => {
                        if event_tx.send(val).await.is_err() {
                            break "worker gone".to_string();
                        }
                    }
                }
            }
            Err(e) => break format!("read error: {}", e),
        }
    };
    debug!("mpv reader: {}", reason);
    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("mpv IPC {}", reason)));
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<IpcRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register before writing so the reader can always match the reply.
        pending.lock().await.insert(req.req_id, req.reply);
        if let Err(e) = writer.write_all(req.line.as_bytes()).await {
            warn!("mpv writer: write error: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: task exiting");
}

#[cfg(unix)]
async fn connect(socket_name: &str) -> anyhow::Result<(IpcLink, mpsc::Receiver<Value>)> {
    let socket_path = PathBuf::from(socket_name);
    for _ in 0..50 {
        if socket_path.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    if !socket_path.exists() {
        anyhow::bail!("mpv IPC socket did not appear");
    }
    let stream = UnixStream::connect(&socket_path).await?;
    let (read_half, write_half) = stream.into_split();
    Ok(IpcLink::start(read_half, write_half))
}

#[cfg(windows)]
async fn connect(socket_name: &str) -> anyhow::Result<(IpcLink, mpsc::Receiver<Value>)> {
    let pipe_path = format!(r"\\.\pipe\{}", socket_name);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(client) = ClientOptions::new().open(&pipe_path) {
            let (read_half, write_half) = tokio::io::split(client);
            return Ok(IpcLink::start(read_half, write_half));
        }
    }
    anyhow::bail!("mpv named pipe did not appear")
}

// ── SDK ───────────────────────────────────────────────────────────────────────

pub struct MpvSdk {
    config: MpvConfig,
    /// Resolved once loading starts.
    binary: Option<PathBuf>,
    next_instance: u64,
}

impl MpvSdk {
    pub fn new(config: MpvConfig) -> Self {
        Self {
            config,
            binary: None,
            next_instance: 1,
        }
    }
}

impl PlayerSdk for MpvSdk {
    type Instance = MpvPlayer;

    fn request_load(&mut self, on_loaded: ReadyCallback) {
        let Some(binary) = platform::find_mpv_binary(self.config.binary.as_deref()) else {
            error!("mpv binary not found; tiles will stay queued");
            return;
        };
        if platform::find_yt_dlp_binary().is_none() {
            warn!("yt-dlp not found; mpv will not be able to open watch URLs");
        }
        self.binary = Some(binary.clone());
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("cannot probe mpv outside the runtime: {}", e);
                return;
            }
        };
        runtime.spawn(async move {
            match tokio::process::Command::new(&binary)
                .arg("--version")
                .output()
                .await
            {
                Ok(out) if out.status.success() => {
                    let version = String::from_utf8_lossy(&out.stdout);
                    info!(
                        "mpv: {} ({})",
                        version.lines().next().unwrap_or("unknown version"),
                        binary.display()
                    );
                    on_loaded.fire();
                }
                Ok(out) => error!("mpv --version exited with {}", out.status),
                Err(e) => error!("failed to run {}: {}", binary.display(), e),
            }
        });
    }

    fn construct(
        &mut self,
        mount: &MountTarget,
        video: &VideoId,
        config: &PlayerConfig,
        on_ready: ReadyCallback,
    ) -> anyhow::Result<MpvPlayer> {
        let binary = self
            .binary
            .clone()
            .ok_or_else(|| anyhow::anyhow!("mpv has not been located yet"))?;
        let runtime = tokio::runtime::Handle::try_current()?;

        let instance = self.next_instance;
        self.next_instance += 1;
        let socket_name = platform::mpv_socket_name(mount.tile, instance);
        let mut args = player_args(mount, config);
        args.push(platform::mpv_socket_arg(mount.tile, instance));

        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let worker = TileWorker {
            tile: mount.tile,
            binary,
            args,
            socket_name,
            url: video.watch_url(),
            startup_timeout: Duration::from_secs(self.config.startup_timeout_secs),
        };
        runtime.spawn(worker.run(ops_rx, on_ready));
        Ok(MpvPlayer {
            tile: mount.tile,
            ops: ops_tx,
        })
    }
}

/// Command-line flags for one tile's mpv.  The video itself is sent over IPC
/// once the socket is up, so `file-loaded` is never missed.
pub fn player_args(mount: &MountTarget, config: &PlayerConfig) -> Vec<String> {
    let mut args = vec![
        "--idle=yes".to_string(),
        "--quiet".to_string(),
        "--force-window=yes".to_string(),
        "--keep-open=yes".to_string(),
        format!("--title={}", mount.title),
        // Audio only ever reaches a tile through focus.
        "--mute=yes".to_string(),
        format!("--pause={}", yes_no(!config.autoplay)),
        format!("--osc={}", yes_no(config.controls)),
        // mpv has no related-videos surface; inline playback maps to a
        // borderless window sitting in its grid cell.
        format!("--border={}", yes_no(!config.inline_playback)),
    ];
    if let Some(g) = mount.geometry {
        args.push(format!("--geometry={}x{}+{}+{}", g.width, g.height, g.x, g.y));
    }
    args
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// ── player ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum PlayerOp {
    Mute(bool),
    Volume(u8),
    Pause(bool),
    Destroy,
}

pub struct MpvPlayer {
    tile: usize,
    ops: mpsc::UnboundedSender<PlayerOp>,
}

impl MpvPlayer {
    fn queue(&self, op: PlayerOp) -> anyhow::Result<()> {
        self.ops
            .send(op)
            .map_err(|_| anyhow::anyhow!("tile {} mpv worker gone", self.tile + 1))
    }
}

impl PlayerInstance for MpvPlayer {
    fn mute(&mut self) -> anyhow::Result<()> {
        self.queue(PlayerOp::Mute(true))
    }

    fn unmute(&mut self) -> anyhow::Result<()> {
        self.queue(PlayerOp::Mute(false))
    }

    fn set_volume(&mut self, volume: u8) -> anyhow::Result<()> {
        self.queue(PlayerOp::Volume(volume.min(100)))
    }

    fn play(&mut self) -> anyhow::Result<()> {
        self.queue(PlayerOp::Pause(false))
    }

    fn pause(&mut self) -> anyhow::Result<()> {
        self.queue(PlayerOp::Pause(true))
    }

    fn destroy(&mut self) -> anyhow::Result<()> {
        self.queue(PlayerOp::Destroy)
    }
}

// ── tile worker ───────────────────────────────────────────────────────────────

struct TileWorker {
    tile: usize,
    binary: PathBuf,
    args: Vec<String>,
    socket_name: String,
    url: String,
    startup_timeout: Duration,
}

impl TileWorker {
    async fn run(self, mut ops: mpsc::UnboundedReceiver<PlayerOp>, on_ready: ReadyCallback) {
        let n = self.tile + 1;
        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("tile {}: failed to start mpv: {:#}", n, e);
                return;
            }
        };

        let (link, mut events) = match connect(&self.socket_name).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("tile {}: {:#}", n, e);
                let _ = child.kill().await;
                return;
            }
        };
        info!("tile {}: connected to mpv, loading {}", n, self.url);
        if let Err(e) = link.send(json!(["loadfile", self.url])).await {
            warn!("tile {}: loadfile failed: {:#}", n, e);
        }

        let connected = drive(
            self.tile,
            &link,
            &mut events,
            &mut ops,
            on_ready,
            self.startup_timeout,
        )
        .await;

        debug!("tile {}: shutting down mpv", n);
        if connected {
            let _ = link.send(json!(["quit"])).await;
        }
        let _ = child.kill().await;
    }

    fn spawn(&self) -> anyhow::Result<tokio::process::Child> {
        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(&self.socket_name);
        }
        let log_dir = platform::data_dir();
        std::fs::create_dir_all(&log_dir)?;
        let stderr_path = log_dir.join(format!("mpv-tile-{}.log", self.tile + 1));
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(&self.binary)
            .args(&self.args)
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true)
            .spawn()?;
        info!(
            "tile {}: spawned mpv pid {:?}, stderr -> {:?}",
            self.tile + 1,
            child.id(),
            stderr_path
        );
        Ok(child)
    }
}

/// Serve one connected player until it is destroyed.  Returns whether the
/// IPC connection is still up.
///
/// `on_ready` fires on the first `file-loaded`, however late it arrives; the
/// startup timeout only logs.
async fn drive(
    tile: usize,
    link: &IpcLink,
    events: &mut mpsc::Receiver<Value>,
    ops: &mut mpsc::UnboundedReceiver<PlayerOp>,
    on_ready: ReadyCallback,
    startup_timeout: Duration,
) -> bool {
    let n = tile + 1;
    let mut on_ready = Some(on_ready);
    let mut connected = true;
    let mut overdue_logged = false;
    let deadline = tokio::time::sleep(startup_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            op = ops.recv() => match op {
                None | Some(PlayerOp::Destroy) => break,
                Some(op) => {
                    if let Err(e) = apply(link, op).await {
                        debug!("tile {}: {:?} failed: {:#}", n, op, e);
                    }
                }
            },
            event = events.recv(), if connected => match event {
                Some(event) => {
                    let name = event.get("event").and_then(Value::as_str).unwrap_or("");
                    debug!("tile {}: mpv event {}", n, name);
                    if name == "file-loaded" {
                        if let Some(cb) = on_ready.take() {
                            cb.fire();
                        }
                    }
                }
                None => {
                    warn!("tile {}: mpv connection lost", n);
                    connected = false;
                }
            },
            _ = &mut deadline, if !overdue_logged && on_ready.is_some() => {
                warn!(
                    "tile {}: video did not load within {}s, still waiting",
                    n,
                    startup_timeout.as_secs()
                );
                overdue_logged = true;
            }
        }
    }
    connected
}

async fn apply(link: &IpcLink, op: PlayerOp) -> anyhow::Result<()> {
    match op {
        PlayerOp::Mute(muted) => link.set_property("mute", json!(muted)).await,
        PlayerOp::Volume(volume) => link.set_property("volume", json!(volume)).await,
        PlayerOp::Pause(paused) => link.set_property("pause", json!(paused)).await,
        PlayerOp::Destroy => Ok(()),
    }
}
