use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::BoxStream;

use crate::{
    config::AppConfig,
    domain::{JobId, JobRequest},
    ytdlp::{DownloadOptions, MediaDownloader, YtDlpClient},
};

use super::download_job::{DownloadJob, JobEvent};

/// Builds jobs from requests and owns the native dialogs the shell needs.
#[derive(Clone)]
pub struct DownloadCoordinator {
    downloader: Arc<dyn MediaDownloader>,
    config: Arc<AppConfig>,
}

impl DownloadCoordinator {
    pub fn new(downloader: Arc<dyn MediaDownloader>, config: AppConfig) -> Self {
        Self {
            downloader,
            config: Arc::new(config),
        }
    }

    pub fn from_config(config: AppConfig) -> Self {
        let client = YtDlpClient::new(config.ytdlp_path.clone())
            .with_leading_args(config.ytdlp_args.iter().cloned());
        tracing::info!(program = %client.program().display(), "using yt-dlp");
        Self::new(Arc::new(client), config)
    }

    pub fn options_for(&self, request: &JobRequest) -> DownloadOptions {
        DownloadOptions::audio_extraction(
            request.destination(),
            &self.config.audio_format,
            &self.config.audio_quality,
        )
        .with_user_agent(&self.config.user_agent)
        .with_archive(self.config.archive_file.clone())
        .with_ffmpeg_location(self.config.ffmpeg_location.clone())
    }

    /// Starts the job in the background and hands back its event stream.
    pub fn download_stream(&self, id: JobId, request: JobRequest) -> BoxStream<'static, JobEvent> {
        let options = self.options_for(&request);
        let job = DownloadJob::new(id, request, options, Arc::clone(&self.downloader));
        tracing::debug!(id = %job.id(), "launching job");
        job.start()
    }

    pub async fn choose_directory(&self, current: PathBuf) -> Option<PathBuf> {
        rfd::AsyncFileDialog::new()
            .set_title("Select Download Directory")
            .set_directory(&current)
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    pub async fn show_error(&self, message: String) {
        rfd::AsyncMessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_title("Error")
            .set_description(message)
            .set_buttons(rfd::MessageButtons::Ok)
            .show()
            .await;
    }
}
