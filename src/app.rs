use crate::application::{DownloadCoordinator, JobController, JobEvent, ShellView};
use crate::config::AppConfig;
use crate::domain::{AppError, JobId};
use crate::ui::{DownloadMessage, DownloadView};
use futures::StreamExt;
use iced::Task;
use std::path::PathBuf;

pub struct DownloadApp {
    view: DownloadView,
    controller: JobController,
    coordinator: DownloadCoordinator,
    destination: PathBuf,
    // Cached so `view` can borrow it
    shell: ShellView,
}

impl DownloadApp {
    pub fn new(config: AppConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let destination = config.initial_download_dir(&cwd);
        let controller = JobController::new();
        let shell = controller.view();

        Self {
            view: DownloadView::default(),
            controller,
            coordinator: DownloadCoordinator::from_config(config),
            destination,
            shell,
        }
    }

    fn refresh(&mut self) {
        self.shell = self.controller.view();
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Result of the native folder picker
    DirectorySelected(Option<PathBuf>),
    /// Event from the job with the given id
    Job(JobId, JobEvent),
    /// User dismissed the error dialog
    ErrorAcknowledged,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    let task = match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::DownloadPressed => start_download(app),
                DownloadMessage::ChooseDirectoryPressed => {
                    let coordinator = app.coordinator.clone();
                    let current = app.destination.clone();
                    Task::perform(
                        async move { coordinator.choose_directory(current).await },
                        Message::DirectorySelected,
                    )
                }
                DownloadMessage::UrlChanged(_) => Task::none(),
            }
        }
        Message::DirectorySelected(selected) => {
            // None means the user cancelled the dialog
            if let Some(dir) = selected {
                tracing::debug!(dir = %dir.display(), "download directory changed");
                app.destination = dir;
            }
            Task::none()
        }
        Message::Job(id, event) => match app.controller.apply(id, event) {
            Some(error_message) => {
                let coordinator = app.coordinator.clone();
                Task::perform(
                    async move { coordinator.show_error(error_message).await },
                    |_| Message::ErrorAcknowledged,
                )
            }
            None => Task::none(),
        },
        Message::ErrorAcknowledged => Task::none(),
    };

    app.refresh();
    task
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    match app.controller.request_start(&app.view.url, &app.destination) {
        Ok((id, request)) => {
            let events = app.coordinator.download_stream(id, request);
            app.controller.job_started(id);
            Task::stream(events.map(move |event| Message::Job(id, event)))
        }
        Err(AppError::JobAlreadyRunning) => Task::none(),
        Err(err) => {
            tracing::debug!(error = %err, "start rejected");
            Task::none()
        }
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view
        .view(&app.shell, &app.destination)
        .map(Message::UiMessage)
}
