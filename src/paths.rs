//! Per-user locations for configuration, data and logs.

use anyhow::Result;
use std::path::PathBuf;

pub const APP_NAME: &str = "simple-media-downloader";

#[cfg(unix)]
fn base_dirs() -> Result<xdg::BaseDirectories> {
    Ok(xdg::BaseDirectories::with_prefix(APP_NAME)?)
}

/// `~/.config/simple-media-downloader/config.toml`, parent created.
#[cfg(unix)]
pub fn config_file() -> Result<PathBuf> {
    Ok(base_dirs()?.place_config_file("config.toml")?)
}

/// A file under `~/.local/share/simple-media-downloader/`, parent created.
#[cfg(unix)]
pub fn data_file(name: &str) -> Result<PathBuf> {
    Ok(base_dirs()?.place_data_file(name)?)
}

/// A file under `~/.local/state/simple-media-downloader/`, parent created.
#[cfg(unix)]
pub fn state_file(name: &str) -> Result<PathBuf> {
    Ok(base_dirs()?.place_state_file(name)?)
}

#[cfg(not(unix))]
fn app_dir(kind: &str) -> Result<PathBuf> {
    let root = std::env::var_os("APPDATA")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("APPDATA is not set"))?;
    let dir = root.join(APP_NAME).join(kind);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(not(unix))]
pub fn config_file() -> Result<PathBuf> {
    Ok(app_dir("config")?.join("config.toml"))
}

#[cfg(not(unix))]
pub fn data_file(name: &str) -> Result<PathBuf> {
    Ok(app_dir("data")?.join(name))
}

#[cfg(not(unix))]
pub fn state_file(name: &str) -> Result<PathBuf> {
    Ok(app_dir("logs")?.join(name))
}
