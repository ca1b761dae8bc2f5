use std::path::PathBuf;

/// Per-player mpv IPC endpoint.  Each tile runs its own mpv process and a
/// reload starts a new one while the old one may still be exiting, so the
/// name carries both the tile number and the player generation.
#[cfg(unix)]
pub fn mpv_socket_name(tile: usize, generation: u64) -> String {
    format!(
        "{}/tilewall-mpv-{}-{}.sock",
        std::env::temp_dir().display(),
        tile + 1,
        generation
    )
}

#[cfg(windows)]
pub fn mpv_socket_name(tile: usize, generation: u64) -> String {
    format!("tilewall-mpv-{}-{}", tile + 1, generation)
}

#[cfg(unix)]
pub fn mpv_socket_arg(tile: usize, generation: u64) -> String {
    format!("--input-ipc-server={}", mpv_socket_name(tile, generation))
}

#[cfg(windows)]
pub fn mpv_socket_arg(tile: usize, generation: u64) -> String {
    format!(
        "--input-ipc-server=\\\\.\\pipe\\{}",
        mpv_socket_name(tile, generation)
    )
}

pub fn data_dir() -> PathBuf {
    // ~/.local/share/tilewall on both macOS and Linux
    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local")
            .join("share")
            .join("tilewall")
    }
    #[cfg(windows)]
    {
        // Portable install: a data/ directory beside the executable wins.
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let portable_data = exe_dir.join("data");
                if portable_data.exists() {
                    return portable_data;
                }
            }
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilewall")
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                if exe_dir.join("config.toml").exists() {
                    return exe_dir.to_path_buf();
                }
            }
        }
    }

    #[cfg(unix)]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("tilewall")
    }

    #[cfg(windows)]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilewall")
    }
}

#[cfg(unix)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv"]
}

#[cfg(windows)]
fn mpv_binary_names() -> &'static [&'static str] {
    &["mpv.exe", "mpv"]
}

#[cfg(unix)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp"]
}

#[cfg(windows)]
fn yt_dlp_binary_names() -> &'static [&'static str] {
    &["yt-dlp.exe", "yt-dlp"]
}

fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let current_exe = std::env::current_exe().ok()?;
    let dir = current_exe.parent()?;
    for name in names {
        let p = dir.join(name);
        if p.exists() {
            return Some(p);
        }
        let p = dir.join("external").join(name);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path) {
        for name in names {
            let p = dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }
    None
}

/// Locate the mpv binary that backs every tile.
///
/// Order: explicit override (if it exists), beside the executable, `PATH`.
pub fn find_mpv_binary(override_path: Option<&std::path::Path>) -> Option<PathBuf> {
    if let Some(p) = override_path {
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }
    find_beside_exe(mpv_binary_names()).or_else(|| find_on_path(mpv_binary_names()))
}

/// Locate yt-dlp, which mpv needs to resolve watch URLs.
/// `YT_DLP_PATH` overrides the search.
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("YT_DLP_PATH") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }
    find_beside_exe(yt_dlp_binary_names()).or_else(|| find_on_path(yt_dlp_binary_names()))
}
