use crate::ui::{DownloadMessage, DownloadView};
use futures::StreamExt;
use iced::Task;
use simple_video_downloader::{
    DownloadControls, DownloadCoordinator, DownloadError, DownloadEvent, DownloadRequest,
    ProgressEvent, TerminalResult, ToolConfig,
};
use std::path::PathBuf;

pub struct DownloadApp {
    view: DownloadView,
    /// None when yt-dlp could not be found at startup.
    coordinator: Option<DownloadCoordinator>,
    // Cancel and path lookup for the download in flight
    active: Option<DownloadControls>,
    // Cancel pressed before DownloadStarted delivered the controls
    cancel_pending: bool,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadApp {
    pub fn new() -> Self {
        let config = ToolConfig::load().unwrap_or_else(|e| {
            tracing::warn!("{}, using defaults", e);
            ToolConfig::default()
        });
        let mut view = DownloadView::new(config.default_output_dir.clone());

        let coordinator = match DownloadCoordinator::new(config) {
            Ok(coordinator) => Some(coordinator),
            Err(e) => {
                view.status_message = e.to_string();
                None
            }
        };

        Self {
            view,
            coordinator,
            active: None,
            cancel_pending: false,
        }
    }

    fn request(&self) -> DownloadRequest {
        let mut request = DownloadRequest::new(
            self.view.url.clone(),
            self.view.format,
            self.view.output_dir.clone(),
        )
        .with_resolution(self.view.resolution)
        .with_bitrate(self.view.bitrate);

        if !self.view.custom_filename.trim().is_empty() {
            request = request.with_custom_filename(self.view.custom_filename.clone());
        }
        request
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    FolderSelected(Option<PathBuf>),
    DownloadStarted(DownloadControls),
    DownloadRejected(DownloadError),
    Download(DownloadEvent),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::ChooseFolderPressed => {
                    let current = app.view.output_dir.clone();
                    return Task::perform(
                        async move {
                            rfd::AsyncFileDialog::new()
                                .set_directory(&current)
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                DownloadMessage::DownloadPressed if !app.view.is_downloading => {
                    let Some(coordinator) = app.coordinator.clone() else {
                        return Task::none();
                    };
                    let request = app.request();

                    app.view.is_downloading = true;
                    app.cancel_pending = false;
                    app.view.download_progress = 0.0;
                    app.view.detail_message.clear();
                    app.view.status_message = "Starting yt-dlp...".to_string();

                    // start_download spawns onto tokio, so it runs inside the task
                    let events = futures::stream::once(async move {
                        coordinator.start_download(request)
                    })
                    .flat_map(|started| match started {
                        Ok(handle) => {
                            let controls = handle.controls();
                            futures::stream::once(async move { Message::DownloadStarted(controls) })
                                .chain(handle.into_stream().map(Message::Download))
                                .boxed()
                        }
                        Err(e) => {
                            futures::stream::once(async move { Message::DownloadRejected(e) })
                                .boxed()
                        }
                    });

                    return Task::stream(events);
                }
                DownloadMessage::CancelPressed => match &app.active {
                    Some(controls) => {
                        if controls.cancel() {
                            app.view.status_message = "Cancelling...".to_string();
                        }
                    }
                    None if app.view.is_downloading => {
                        app.cancel_pending = true;
                        app.view.status_message = "Cancelling...".to_string();
                    }
                    None => {}
                },
                _ => {}
            }
        }
        Message::FolderSelected(Some(path)) => {
            app.view.output_dir = path;
        }
        Message::FolderSelected(None) => {
            // User closed the dialog
        }
        Message::DownloadStarted(controls) => {
            if std::mem::take(&mut app.cancel_pending) {
                controls.cancel();
            }
            app.active = Some(controls);
        }
        Message::DownloadRejected(e) => {
            app.view.is_downloading = false;
            app.cancel_pending = false;
            app.view.status_message = e.to_string();
        }
        Message::Download(DownloadEvent::Update(event)) => show_progress(&mut app.view, event),
        Message::Download(DownloadEvent::Terminal(result)) => {
            app.view.is_downloading = false;
            app.active = None;
            app.cancel_pending = false;
            app.view.detail_message.clear();
            match result {
                TerminalResult::Completed { path: Some(path) } => {
                    app.view.download_progress = 100.0;
                    app.view.status_message = format!("Saved: {}", path.display());
                }
                TerminalResult::Completed { path: None } => {
                    app.view.download_progress = 100.0;
                    app.view.status_message = "Download complete".to_string();
                }
                TerminalResult::Cancelled => {
                    app.view.download_progress = 0.0;
                    app.view.status_message = "Download cancelled".to_string();
                }
                TerminalResult::Failed(cause) => {
                    app.view.download_progress = 0.0;
                    app.view.status_message = format!("Download failed: {}", cause);
                }
            }
        }
    }
    Task::none()
}

fn show_progress(view: &mut DownloadView, event: ProgressEvent) {
    match event {
        ProgressEvent::Progress {
            percent,
            total_size,
            speed,
            eta,
        } => {
            view.download_progress = percent as f32;
            view.status_message = format!("Downloading: {:.1}%", percent);
            let parts: Vec<String> = [
                total_size.map(|size| format!("of {}", size)),
                speed.map(|speed| format!("at {}", speed)),
                eta.map(|eta| format!("ETA {}", eta)),
            ]
            .into_iter()
            .flatten()
            .collect();
            view.detail_message = parts.join("  ");
        }
        ProgressEvent::PhaseChange(phase) => {
            view.status_message = format!("{}...", phase);
        }
        ProgressEvent::DestinationKnown(path) => {
            view.detail_message = path.display().to_string();
        }
    }
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use simple_video_downloader::MediaFormat;
    use std::time::Duration;
    use tempfile::TempDir;

    fn app_with_script(dir: &TempDir, script: &str) -> DownloadApp {
        let script_path = dir.path().join("fake-yt-dlp.sh");
        std::fs::write(&script_path, script).unwrap();

        let coordinator = DownloadCoordinator::new(ToolConfig {
            program: PathBuf::from("/bin/sh"),
            launcher_args: vec![script_path.to_string_lossy().into_owned()],
            poll_interval_ms: 20,
            drain_grace_ms: 1000,
            default_output_dir: dir.path().to_path_buf(),
        })
        .unwrap();

        DownloadApp {
            view: DownloadView::new(dir.path().to_path_buf()),
            coordinator: Some(coordinator),
            active: None,
            cancel_pending: false,
        }
    }

    #[tokio::test]
    async fn test_cancel_before_start_is_applied_when_download_starts() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_script(&dir, "sleep 30\n");
        app.view.is_downloading = true;

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::CancelPressed));
        assert!(app.cancel_pending);
        assert_eq!(app.view.status_message, "Cancelling...");

        let coordinator = app.coordinator.clone().unwrap();
        let handle = coordinator
            .start_download(DownloadRequest::new(
                "https://example.com/watch?v=1",
                MediaFormat::Video,
                dir.path().join("out"),
            ))
            .unwrap();
        let controls = handle.controls();

        let _ = update(&mut app, Message::DownloadStarted(controls.clone()));
        assert!(controls.is_cancel_requested());
        assert!(!app.cancel_pending);

        let events = tokio::time::timeout(
            Duration::from_secs(10),
            handle.into_stream().collect::<Vec<_>>(),
        )
        .await
        .expect("download did not finish");
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Terminal(TerminalResult::Cancelled))
        ));
    }

    #[test]
    fn test_cancel_while_idle_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_script(&dir, "exit 0\n");
        let idle_status = app.view.status_message.clone();

        let _ = update(&mut app, Message::UiMessage(DownloadMessage::CancelPressed));

        assert!(!app.cancel_pending);
        assert_eq!(app.view.status_message, idle_status);
    }
}
