pub mod client;
pub mod models;

pub use client::{DownloaderError, YtDlpClient};
pub use models::{DownloadOptions, ProgressReport, ProgressStatus};

/// The external download/transcode tool, seen as a blocking call that
/// reports progress through a callback while it runs.
pub trait MediaDownloader: Send + Sync + 'static {
    fn download(
        &self,
        url: &str,
        options: &DownloadOptions,
        on_progress: &mut dyn FnMut(ProgressReport),
    ) -> Result<(), DownloaderError>;
}
