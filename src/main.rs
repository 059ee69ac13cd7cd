mod app;
mod application;
mod config;
mod domain;
mod logging;
mod paths;
mod ui;
mod utils;
mod ytdlp;

use iced::Theme;

use crate::config::AppConfig;

fn main() -> iced::Result {
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {err:#}");
    }

    let config = config::load_or_init()
        .unwrap_or_else(|err| {
            tracing::warn!("failed to load config, using defaults: {err:#}");
            AppConfig::default()
        })
        .with_env_overrides(|key| std::env::var(key).ok())
        .with_default_archive(config::default_archive_file);

    tracing::info!(?config, "starting");

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("Simple Media Downloader")
    .theme(|_: &app::DownloadApp| Theme::Dark)
    .window_size((420.0, 300.0))
    .run()
}
