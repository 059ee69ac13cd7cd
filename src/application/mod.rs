pub mod download_coordinator;
pub mod download_job;
pub mod job_controller;

pub use download_coordinator::DownloadCoordinator;
pub use download_job::JobEvent;
pub use job_controller::{JobController, ShellView};
