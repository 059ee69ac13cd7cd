use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;
use crate::ytdlp::models::DEFAULT_USER_AGENT;

/// Overrides `ytdlp_path` when set.
pub const YTDLP_PATH_ENV: &str = "SMD_YTDLP_PATH";

const ARCHIVE_FILENAME: &str = "archive.txt";

/// User configuration loaded from `config.toml` in the per-user config dir.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// yt-dlp executable (looked up on PATH when not absolute).
    pub ytdlp_path: PathBuf,
    /// Arguments placed before all others, e.g. `["-m", "yt_dlp"]` when
    /// `ytdlp_path` points at a Python interpreter.
    pub ytdlp_args: Vec<String>,
    /// Directory containing ffmpeg/ffprobe, if not on PATH.
    pub ffmpeg_location: Option<PathBuf>,
    /// Initial download directory; the working directory when unset.
    pub download_dir: Option<PathBuf>,
    /// Download-archive ledger; `archive.txt` in the data dir when unset.
    pub archive_file: Option<PathBuf>,
    pub audio_format: String,
    pub audio_quality: String,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ytdlp_args: Vec::new(),
            ffmpeg_location: None,
            download_dir: None,
            archive_file: None,
            audio_format: "m4a".to_string(),
            audio_quality: "320".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(data: &str) -> Result<Self> {
        Ok(toml::from_str(data)?)
    }

    /// Applies environment overrides, given a lookup function so tests do
    /// not have to touch the process environment.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(YTDLP_PATH_ENV).filter(|path| !path.trim().is_empty()) {
            self.ytdlp_path = PathBuf::from(path);
        }
        self
    }

    /// Fills in the archive path when the config leaves it unset.
    pub fn with_default_archive(mut self, default: impl FnOnce() -> Result<PathBuf>) -> Self {
        if self.archive_file.is_none() {
            match default() {
                Ok(path) => self.archive_file = Some(path),
                Err(err) => tracing::warn!("no download archive available: {err:#}"),
            }
        }
        self
    }

    /// Directory the shell starts in.
    pub fn initial_download_dir(&self, fallback: &Path) -> PathBuf {
        self.download_dir
            .clone()
            .filter(|dir| dir.is_dir())
            .unwrap_or_else(|| fallback.to_path_buf())
    }
}

pub fn default_archive_file() -> Result<PathBuf> {
    paths::data_file(ARCHIVE_FILENAME)
}

fn load_or_init_at(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_cfg = AppConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    AppConfig::from_toml(&data)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<AppConfig> {
    load_or_init_at(&paths::config_file()?)
}
