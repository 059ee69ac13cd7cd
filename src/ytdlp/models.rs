use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Prefix of the stdout line yt-dlp prints for every download progress callback.
pub const DOWNLOAD_MARKER: &str = "[smd-progress] ";
/// Prefix of the stdout line yt-dlp prints for every post-processor callback.
pub const POSTPROCESS_MARKER: &str = "[smd-postprocess] ";

/// Containers yt-dlp's merger accepts for `--merge-output-format`.
pub const MERGE_CONTAINERS: [&str; 6] = ["avi", "flv", "mkv", "mov", "mp4", "webm"];

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    ExtractAudio { codec: String, quality: String },
    EmbedMetadata,
    EmbedThumbnail,
}

/// Everything yt-dlp is told about a single download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOptions {
    pub format: String,
    pub merge_output_format: String,
    pub http_headers: Vec<(String, String)>,
    pub output_template: PathBuf,
    pub postprocessors: Vec<PostProcessor>,
    pub keep_video: bool,
    pub download_archive: Option<PathBuf>,
    pub no_overwrites: bool,
    pub ignore_errors: bool,
    pub write_thumbnail: bool,
    pub ffmpeg_location: Option<PathBuf>,
}

impl DownloadOptions {
    /// Best audio stream, converted to `codec`, tagged and with cover art,
    /// written as `<title>.<ext>` under `destination`.
    pub fn audio_extraction(destination: &Path, codec: &str, quality: &str) -> Self {
        Self {
            format: "bestaudio/best".to_string(),
            merge_output_format: codec.to_string(),
            http_headers: vec![("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())],
            output_template: destination.join("%(title)s.%(ext)s"),
            postprocessors: vec![
                PostProcessor::ExtractAudio {
                    codec: codec.to_string(),
                    quality: quality.to_string(),
                },
                PostProcessor::EmbedMetadata,
                PostProcessor::EmbedThumbnail,
            ],
            keep_video: false,
            download_archive: None,
            no_overwrites: true,
            ignore_errors: true,
            write_thumbnail: true,
            ffmpeg_location: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.http_headers.retain(|(name, _)| !name.eq_ignore_ascii_case("User-Agent"));
        self.http_headers
            .push(("User-Agent".to_string(), user_agent.to_string()));
        self
    }

    pub fn with_archive(mut self, archive: Option<PathBuf>) -> Self {
        self.download_archive = archive;
        self
    }

    pub fn with_ffmpeg_location(mut self, location: Option<PathBuf>) -> Self {
        self.ffmpeg_location = location;
        self
    }

    /// Renders the options as yt-dlp command-line arguments (without the URL).
    ///
    /// The merge format is only passed when it names a merger container;
    /// for audio codecs `--audio-format` already decides the output file.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-f".into(), self.format.as_str().into()];

        let merge_format = self.merge_output_format.to_ascii_lowercase();
        if MERGE_CONTAINERS.contains(&merge_format.as_str()) {
            args.push("--merge-output-format".into());
            args.push(merge_format.into());
        }

        for (name, value) in &self.http_headers {
            args.push("--add-header".into());
            args.push(format!("{}:{}", name, value).into());
        }

        args.push("-o".into());
        args.push(self.output_template.as_os_str().to_owned());

        for postprocessor in &self.postprocessors {
            match postprocessor {
                PostProcessor::ExtractAudio { codec, quality } => {
                    args.push("--extract-audio".into());
                    args.push("--audio-format".into());
                    args.push(codec.as_str().into());
                    args.push("--audio-quality".into());
                    args.push(quality.as_str().into());
                }
                PostProcessor::EmbedMetadata => args.push("--embed-metadata".into()),
                PostProcessor::EmbedThumbnail => args.push("--embed-thumbnail".into()),
            }
        }

        let keep_video = if self.keep_video { "--keep-video" } else { "--no-keep-video" };
        args.push(keep_video.into());

        if let Some(archive) = &self.download_archive {
            args.push("--download-archive".into());
            args.push(archive.as_os_str().to_owned());
        }
        if self.no_overwrites {
            args.push("--no-overwrites".into());
        }
        if self.ignore_errors {
            args.push("--ignore-errors".into());
        }
        if self.write_thumbnail {
            args.push("--write-thumbnail".into());
        }
        if let Some(location) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".into());
            args.push(location.as_os_str().to_owned());
        }

        args
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Postprocessing,
    Error,
    #[serde(other)]
    Other,
}

/// One progress callback from yt-dlp. Byte counters are only present when
/// yt-dlp knows them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressReport {
    pub status: ProgressStatus,
    #[serde(default)]
    pub downloaded_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes: Option<u64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    #[serde(default)]
    pub filename: Option<String>,
}

impl ProgressReport {
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            filename: None,
        }
    }

    /// Parses one line of yt-dlp stdout. Returns `None` for anything that is
    /// not one of our progress lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if let Some(json) = line.strip_prefix(DOWNLOAD_MARKER) {
            return serde_json::from_str(json).ok();
        }
        if line.starts_with(POSTPROCESS_MARKER) {
            return Some(Self::new(ProgressStatus::Postprocessing));
        }
        None
    }

    /// Exact total when known, otherwise yt-dlp's estimate.
    pub fn total(&self) -> Option<u64> {
        self.total_bytes
            .filter(|total| *total > 0)
            .or_else(|| {
                self.total_bytes_estimate
                    .filter(|estimate| estimate.is_finite() && *estimate >= 1.0)
                    .map(|estimate| estimate.floor() as u64)
            })
    }
}

/// Arguments that make yt-dlp print one parseable line per progress callback.
pub fn progress_reporting_args() -> Vec<OsString> {
    vec![
        "--newline".into(),
        "--progress".into(),
        "--progress-template".into(),
        format!("download:{}%(progress)j", DOWNLOAD_MARKER).into(),
        "--progress-template".into(),
        format!(
            "postprocess:{}%(progress.status)s %(progress.postprocessor)s",
            POSTPROCESS_MARKER
        )
        .into(),
    ]
}
