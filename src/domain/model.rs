use std::fmt;
use std::path::{Path, PathBuf};

use super::AppError;

/// One user-initiated download: what to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    url: String,
    destination: PathBuf,
}

impl JobRequest {
    /// Validates the user's input. Surrounding whitespace is not part of the URL.
    pub fn new(url: &str, destination: &Path) -> Result<Self, AppError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::EmptyUrl);
        }
        if !is_directory_writable(destination) {
            return Err(AppError::InvalidDestination(destination.to_path_buf()));
        }

        Ok(Self {
            url: url.to_string(),
            destination: destination.to_path_buf(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

fn is_directory_writable(path: &Path) -> bool {
    // The probe gets a fresh name and is removed on drop.
    path.is_dir()
        && tempfile::Builder::new()
            .prefix(".smd_write_test")
            .tempfile_in(path)
            .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct JobId(u64);

impl JobId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// What the shell is currently showing. `Finished` and `Errored` accept a
/// new start exactly like `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellPhase {
    #[default]
    Idle,
    Running,
    Finished,
    Errored,
}

impl ShellPhase {
    pub fn accepts_start(self) -> bool {
        self != ShellPhase::Running
    }
}
