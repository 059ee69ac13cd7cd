use std::path::Path;

use crate::domain::{AppError, JobId, JobRequest, JobState, ShellPhase};

use super::download_job::JobEvent;

pub const STATUS_DOWNLOADING: &str = "Downloading...";
pub const STATUS_ERRORED: &str = "Error occurred during download.";

/// Snapshot of everything the window displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellView {
    pub phase: ShellPhase,
    pub status: String,
    /// `Some` only while a job is running.
    pub progress: Option<u8>,
    pub start_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CurrentJob {
    id: JobId,
    request: JobRequest,
    state: JobState,
    progress: u8,
}

/// Owns the single job slot and maps job events onto visible state.
#[derive(Debug, Default)]
pub struct JobController {
    phase: ShellPhase,
    status: String,
    current: Option<CurrentJob>,
    last_id: JobId,
}

impl JobController {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn current_job(&self) -> Option<(JobId, JobState, u8)> {
        self.current
            .as_ref()
            .map(|job| (job.id, job.state, job.progress))
    }

    /// Accepts a start action. On success the slot holds a `Pending` job
    /// and the caller is expected to launch it and call [`Self::job_started`].
    pub fn request_start(
        &mut self,
        url: &str,
        destination: &Path,
    ) -> Result<(JobId, JobRequest), AppError> {
        if !self.phase.accepts_start() {
            return Err(AppError::JobAlreadyRunning);
        }

        let request = match JobRequest::new(url, destination) {
            Ok(request) => request,
            Err(err) => {
                self.status = err.to_string();
                return Err(err);
            }
        };

        self.last_id = self.last_id.next();
        let id = self.last_id;
        self.current = Some(CurrentJob {
            id,
            request: request.clone(),
            state: JobState::Pending,
            progress: 0,
        });
        self.phase = ShellPhase::Running;
        self.status = STATUS_DOWNLOADING.to_string();

        Ok((id, request))
    }

    pub fn job_started(&mut self, id: JobId) {
        if let Some(job) = self.job_mut(id) {
            if job.state == JobState::Pending {
                job.state = JobState::Running;
            }
        }
    }

    /// Applies an event from job `id`. Events from any other job are
    /// dropped. Returns the message for the modal error dialog on failure.
    pub fn apply(&mut self, id: JobId, event: JobEvent) -> Option<String> {
        let Some(job) = self.job_mut(id) else {
            tracing::debug!(%id, ?event, "dropping event for inactive job");
            return None;
        };
        if job.state.is_terminal() {
            return None;
        }

        match event {
            JobEvent::Progress(percent) => {
                job.state = JobState::Running;
                job.progress = percent;
                None
            }
            JobEvent::Completed(filename) => {
                job.progress = 100;
                job.state = JobState::Succeeded;
                tracing::info!(%id, url = %job.request.url(), %filename, "job succeeded");
                self.current = None;
                self.phase = ShellPhase::Finished;
                self.status = format!("Download finished: {}", filename);
                None
            }
            JobEvent::Failed(message) => {
                job.state = JobState::Failed;
                tracing::info!(%id, url = %job.request.url(), %message, "job failed");
                self.current = None;
                self.phase = ShellPhase::Errored;
                self.status = STATUS_ERRORED.to_string();
                Some(format!("Error: {}", message))
            }
        }
    }

    pub fn view(&self) -> ShellView {
        let running = self.phase == ShellPhase::Running;
        ShellView {
            phase: self.phase,
            status: self.status.clone(),
            progress: self
                .current
                .as_ref()
                .filter(|_| running)
                .map(|job| job.progress),
            start_enabled: self.phase.accepts_start(),
        }
    }

    fn job_mut(&mut self, id: JobId) -> Option<&mut CurrentJob> {
        self.current.as_mut().filter(|job| job.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(controller: &mut JobController, dir: &Path) -> JobId {
        let (id, _) = controller
            .request_start("https://example/video", dir)
            .unwrap();
        controller.job_started(id);
        id
    }

    #[test]
    fn test_initial_state_is_idle() {
        let controller = JobController::new();
        let view = controller.view();
        assert_eq!(view.phase, ShellPhase::Idle);
        assert!(view.start_enabled);
        assert_eq!(view.progress, None);
        assert!(view.status.is_empty());
    }

    #[test]
    fn test_empty_url_is_rejected_without_job() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();

        let err = controller.request_start("", dir.path()).unwrap_err();

        assert_eq!(err, AppError::EmptyUrl);
        assert_eq!(controller.view().phase, ShellPhase::Idle);
        assert_eq!(controller.current_job(), None);
        assert_eq!(controller.view().status, "Please enter a URL.");
        assert!(controller.view().start_enabled);
    }

    #[test]
    fn test_bad_destination_is_rejected_without_job() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut controller = JobController::new();

        let err = controller
            .request_start("https://example/video", &missing)
            .unwrap_err();

        assert_eq!(err, AppError::InvalidDestination(missing));
        assert_eq!(controller.view().phase, ShellPhase::Idle);
        assert!(controller.view().status.contains("not writable"));
    }

    #[test]
    fn test_start_shows_zero_progress_and_disables_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();

        let (id, request) = controller
            .request_start("https://example/video", dir.path())
            .unwrap();
        assert_eq!(request.url(), "https://example/video");
        assert_eq!(controller.current_job(), Some((id, JobState::Pending, 0)));

        controller.job_started(id);
        assert_eq!(controller.current_job(), Some((id, JobState::Running, 0)));
        assert_eq!(
            controller.view(),
            ShellView {
                phase: ShellPhase::Running,
                status: STATUS_DOWNLOADING.to_string(),
                progress: Some(0),
                start_enabled: false,
            }
        );
    }

    #[test]
    fn test_second_start_while_running_has_no_effect() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let first = started(&mut controller, dir.path());
        controller.apply(first, JobEvent::Progress(40));

        let err = controller
            .request_start("https://example/other", dir.path())
            .unwrap_err();

        assert_eq!(err, AppError::JobAlreadyRunning);
        assert_eq!(controller.current_job(), Some((first, JobState::Running, 40)));
        assert_eq!(controller.view().status, STATUS_DOWNLOADING);
    }

    #[test]
    fn test_progress_is_not_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let id = started(&mut controller, dir.path());

        controller.apply(id, JobEvent::Progress(60));
        controller.apply(id, JobEvent::Progress(30));

        assert_eq!(controller.view().progress, Some(30));
    }

    #[test]
    fn test_download_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let id = started(&mut controller, dir.path());

        assert_eq!(controller.apply(id, JobEvent::Progress(25)), None);
        assert_eq!(controller.view().progress, Some(25));
        controller.apply(id, JobEvent::Progress(100));
        assert_eq!(controller.view().progress, Some(100));
        let notice = controller.apply(id, JobEvent::Completed("video.m4a".to_string()));

        assert_eq!(notice, None);
        assert_eq!(
            controller.view(),
            ShellView {
                phase: ShellPhase::Finished,
                status: "Download finished: video.m4a".to_string(),
                progress: None,
                start_enabled: true,
            }
        );
        assert_eq!(controller.current_job(), None);
    }

    #[test]
    fn test_failure_surfaces_error_and_reenables_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let id = started(&mut controller, dir.path());
        controller.apply(id, JobEvent::Progress(10));

        let notice = controller.apply(id, JobEvent::Failed("Video unavailable".to_string()));

        assert_eq!(notice.as_deref(), Some("Error: Video unavailable"));
        let view = controller.view();
        assert_eq!(view.phase, ShellPhase::Errored);
        assert_eq!(view.status, STATUS_ERRORED);
        assert_eq!(view.progress, None);
        assert!(view.start_enabled);
    }

    #[test]
    fn test_failure_before_start_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let (id, _) = controller
            .request_start("https://example/video", dir.path())
            .unwrap();

        assert!(controller
            .apply(id, JobEvent::Failed("no thread".to_string()))
            .is_some());
        assert_eq!(controller.view().phase, ShellPhase::Errored);
    }

    #[test]
    fn test_finished_and_errored_accept_new_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();

        let first = started(&mut controller, dir.path());
        controller.apply(first, JobEvent::Completed("a.m4a".to_string()));
        let second = started(&mut controller, dir.path());
        assert!(second > first);
        assert_eq!(controller.view().progress, Some(0));

        controller.apply(second, JobEvent::Failed("boom".to_string()));
        let third = started(&mut controller, dir.path());
        assert_eq!(controller.current_job(), Some((third, JobState::Running, 0)));
    }

    #[test]
    fn test_events_from_stale_jobs_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let first = started(&mut controller, dir.path());
        controller.apply(first, JobEvent::Completed("a.m4a".to_string()));
        let second = started(&mut controller, dir.path());

        assert_eq!(controller.apply(first, JobEvent::Failed("late".to_string())), None);
        controller.apply(first, JobEvent::Progress(90));

        assert_eq!(controller.current_job(), Some((second, JobState::Running, 0)));
        assert_eq!(controller.view().phase, ShellPhase::Running);
    }

    #[test]
    fn test_nothing_after_terminal_event() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = JobController::new();
        let id = started(&mut controller, dir.path());
        controller.apply(id, JobEvent::Completed("video.m4a".to_string()));

        assert_eq!(controller.apply(id, JobEvent::Failed("late".to_string())), None);
        assert_eq!(controller.view().status, "Download finished: video.m4a");
        assert_eq!(controller.view().phase, ShellPhase::Finished);
    }
}
