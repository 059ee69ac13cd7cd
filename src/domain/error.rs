use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Please enter a URL.")]
    EmptyUrl,

    #[error("Download directory is not writable: {}", .0.display())]
    InvalidDestination(PathBuf),

    #[error("A download is already running")]
    JobAlreadyRunning,
}
