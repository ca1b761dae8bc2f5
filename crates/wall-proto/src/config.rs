use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::platform;
use crate::protocol::TILE_COUNT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wall: WallConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub mpv: MpvConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallConfig {
    /// Source references used until the store holds a saved list.
    #[serde(default = "default_sources")]
    pub default_sources: Vec<String>,
    /// Tiles per row when laying out player windows.
    #[serde(default = "default_columns")]
    pub columns: u16,
}

/// Fixed construction options handed to every player instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default = "default_true")]
    pub controls: bool,
    /// Players are always built muted; `false` is accepted in the file but
    /// not honored, so audio only starts through focus.
    #[serde(default = "default_true")]
    pub start_muted: bool,
    #[serde(default)]
    pub show_related: bool,
    #[serde(default = "default_true")]
    pub inline_playback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpvConfig {
    /// Explicit mpv binary; discovered beside the executable or on PATH when unset.
    #[serde(default)]
    pub binary: Option<PathBuf>,
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    /// How long a freshly spawned tile may take to load its video.
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Key-value store holding the persisted source list.
    #[serde(default = "default_store_file")]
    pub store_file: PathBuf,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            default_sources: default_sources(),
            columns: default_columns(),
        }
    }
}

impl WallConfig {
    /// Exactly `TILE_COUNT` defaults: extra entries are dropped, missing
    /// entries are left blank.
    pub fn tile_defaults(&self) -> Vec<String> {
        let mut sources: Vec<String> = self
            .default_sources
            .iter()
            .take(TILE_COUNT)
            .cloned()
            .collect();
        sources.resize(TILE_COUNT, String::new());
        sources
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            controls: true,
            start_muted: true,
            show_related: false,
            inline_playback: true,
        }
    }
}

impl Default for MpvConfig {
    fn default() -> Self {
        Self {
            binary: None,
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
        }
    }
}

fn default_sources() -> Vec<String> {
    [
        "https://www.youtube.com/watch?v=xKERvEPF898",
        "https://www.youtube.com/watch?v=dAfq7g3JQI8",
        "https://www.youtube.com/watch?v=CDrm8RhonZU",
        "https://www.youtube.com/watch?v=4UkssSAYNIA",
        "https://www.youtube.com/watch?v=-dMtaC5QaUk",
        "https://www.youtube.com/watch?v=en2DcyDUYB4",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_columns() -> u16 {
    3
}

fn default_true() -> bool {
    true
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

fn default_startup_timeout() -> u64 {
    30
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_store_file() -> PathBuf {
    platform::data_dir().join("store.json")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
