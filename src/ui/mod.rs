use std::path::Path;

use iced::{
    widget::{button, column, progress_bar, text, text_input, Space},
    Element, Length,
};

use crate::application::ShellView;

/// Main view state: only what the user types lives here, the rest comes
/// from the job controller.
#[derive(Debug, Default)]
pub struct DownloadView {
    pub url: String,
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    ChooseDirectoryPressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::ChooseDirectoryPressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view<'a>(&'a self, shell: &'a ShellView, destination: &Path) -> Element<'a, DownloadMessage> {
        let mut content = column![
            text("Video URL:").size(16),
            text_input("Paste a video URL...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .on_submit(DownloadMessage::DownloadPressed)
                .padding(10),
            button("Choose Download Directory")
                .on_press(DownloadMessage::ChooseDirectoryPressed)
                .padding([8, 16]),
            text(format!("Saving to: {}", destination.display())).size(12),
            Space::new().height(Length::Fixed(10.0)),
            button("Download")
                .on_press_maybe(shell.start_enabled.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
        ]
        .padding(20)
        .spacing(10);

        if let Some(percent) = shell.progress {
            content = content.push(progress_bar(0.0..=100.0, f32::from(percent)));
        }

        content.push(text(&shell.status).size(14)).into()
    }
}
