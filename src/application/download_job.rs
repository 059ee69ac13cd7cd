use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{JobId, JobRequest},
    utils::panic_message,
    ytdlp::{DownloadOptions, MediaDownloader, ProgressReport, ProgressStatus},
};

/// What a running job tells the shell. `Completed` and `Failed` are terminal
/// and always the last event of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress(u8),
    Completed(String),
    Failed(String),
}

/// `floor(downloaded * 100 / total)`, or `None` when the total is unknown.
pub fn percentage(downloaded: u64, total: u64) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let percent = u128::from(downloaded) * 100 / u128::from(total);
    Some(percent.min(100) as u8)
}

/// Turns raw yt-dlp progress callbacks into job events.
#[derive(Debug, Default)]
pub struct ProgressTranslator {
    terminated: bool,
}

impl ProgressTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_report(&mut self, report: &ProgressReport) -> Vec<JobEvent> {
        if self.terminated {
            return Vec::new();
        }

        match report.status {
            ProgressStatus::Downloading => report
                .downloaded_bytes
                .zip(report.total())
                .and_then(|(downloaded, total)| percentage(downloaded, total))
                .map(JobEvent::Progress)
                .into_iter()
                .collect(),
            ProgressStatus::Postprocessing => vec![JobEvent::Progress(100)],
            ProgressStatus::Finished => {
                self.terminated = true;
                let filename = report
                    .filename
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| "(unknown file)".to_string());
                vec![JobEvent::Progress(100), JobEvent::Completed(filename)]
            }
            ProgressStatus::Error | ProgressStatus::Other => Vec::new(),
        }
    }

    /// Closing event once the downloader has returned, unless the job
    /// already ended.
    pub fn on_outcome(&mut self, outcome: Result<(), String>) -> Option<JobEvent> {
        if self.terminated {
            return None;
        }
        self.terminated = true;

        Some(match outcome {
            Ok(()) => JobEvent::Failed(
                "no file was downloaded (the item may already be in the download archive)"
                    .to_string(),
            ),
            Err(message) => JobEvent::Failed(message),
        })
    }
}

/// A single download request bound to a downloader.
pub struct DownloadJob {
    id: JobId,
    request: JobRequest,
    options: DownloadOptions,
    downloader: Arc<dyn MediaDownloader>,
}

impl DownloadJob {
    pub fn new(
        id: JobId,
        request: JobRequest,
        options: DownloadOptions,
        downloader: Arc<dyn MediaDownloader>,
    ) -> Self {
        Self {
            id,
            request,
            options,
            downloader,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    /// Runs the job on its own thread. The returned stream yields the job's
    /// events in order and ends after the terminal one.
    pub fn start(self) -> BoxStream<'static, JobEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let fallback = tx.clone();
        let id = self.id;

        let spawned = thread::Builder::new()
            .name(format!("download-{}", id))
            .spawn(move || self.run(tx));

        if let Err(err) = spawned {
            tracing::error!(%id, error = %err, "failed to spawn download thread");
            let _ = fallback.send(JobEvent::Failed(format!(
                "Failed to start download thread: {}",
                err
            )));
        }
        drop(fallback);

        futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed()
    }

    fn run(self, tx: mpsc::UnboundedSender<JobEvent>) {
        let span = tracing::info_span!("job", id = %self.id);
        let _guard = span.enter();
        tracing::info!(
            url = %self.request.url(),
            destination = %self.request.destination().display(),
            "download started"
        );

        let mut translator = ProgressTranslator::new();
        let emit = |event: JobEvent| {
            match &event {
                JobEvent::Progress(percent) => tracing::debug!(percent, "progress"),
                JobEvent::Completed(file) => tracing::info!(%file, "download finished"),
                JobEvent::Failed(message) => tracing::warn!(%message, "download failed"),
            }
            // The shell may have gone away; nothing left to report to.
            let _ = tx.send(event);
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.prepare_archive()?;
            self.downloader
                .download(self.request.url(), &self.options, &mut |report| {
                    for event in translator.on_report(&report) {
                        emit(event);
                    }
                })
                .map_err(|err| err.to_string())
        }))
        .unwrap_or_else(|payload| {
            Err(format!(
                "downloader crashed: {}",
                panic_message(payload.as_ref())
            ))
        });

        if let Some(event) = translator.on_outcome(outcome) {
            emit(event);
        }
    }

    fn prepare_archive(&self) -> Result<(), String> {
        let Some(parent) = self
            .options
            .download_archive
            .as_deref()
            .and_then(|archive| archive.parent())
        else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create archive directory {}: {}",
                parent.display(),
                err
            )
        })
    }
}
