use std::path::PathBuf;

use iced::{
    widget::{button, column, pick_list, progress_bar, row, text, text_input, Space},
    Element, Length,
};
use simple_video_downloader::{AudioBitrate, MediaFormat, VideoResolution};

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub format: MediaFormat,
    pub resolution: VideoResolution,
    pub bitrate: AudioBitrate,
    pub custom_filename: String,
    pub output_dir: PathBuf,
    pub status_message: String,
    pub detail_message: String,
    /// 0.0 to 100.0
    pub download_progress: f32,
    pub is_downloading: bool,
}

impl DownloadView {
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            url: String::new(),
            format: MediaFormat::Video,
            resolution: VideoResolution::P1080,
            bitrate: AudioBitrate::Kbps192,
            custom_filename: String::new(),
            output_dir,
            status_message: "Paste a video URL to download".to_string(),
            detail_message: String::new(),
            download_progress: 0.0,
            is_downloading: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    FormatSelected(MediaFormat),
    ResolutionSelected(VideoResolution),
    BitrateSelected(AudioBitrate),
    FilenameChanged(String),
    ChooseFolderPressed,
    DownloadPressed,
    CancelPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => self.url = url,
            DownloadMessage::FormatSelected(format) => self.format = format,
            DownloadMessage::ResolutionSelected(resolution) => self.resolution = resolution,
            DownloadMessage::BitrateSelected(bitrate) => self.bitrate = bitrate,
            DownloadMessage::FilenameChanged(name) => self.custom_filename = name,
            DownloadMessage::ChooseFolderPressed
            | DownloadMessage::DownloadPressed
            | DownloadMessage::CancelPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let idle = !self.is_downloading;

        let quality = if self.format == MediaFormat::Video {
            row![
                pick_list(
                    VideoResolution::ALL,
                    Some(self.resolution),
                    DownloadMessage::ResolutionSelected
                ),
                pick_list(
                    AudioBitrate::ALL,
                    Some(self.bitrate),
                    DownloadMessage::BitrateSelected
                ),
            ]
            .spacing(10)
        } else {
            row![pick_list(
                AudioBitrate::ALL,
                Some(self.bitrate),
                DownloadMessage::BitrateSelected
            )]
        };

        column![
            text("Video Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("URL:").size(16),
            text_input("https://www.youtube.com/watch?v=...", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .padding(10),
            row![
                pick_list(
                    MediaFormat::ALL,
                    Some(self.format),
                    DownloadMessage::FormatSelected
                ),
                quality,
            ]
            .spacing(10),
            text_input("File name (optional)", &self.custom_filename)
                .on_input(DownloadMessage::FilenameChanged)
                .padding(10),
            row![
                text(self.output_dir.display().to_string()).size(14),
                button("Choose folder...")
                    .on_press_maybe(idle.then_some(DownloadMessage::ChooseFolderPressed)),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=100.0, self.download_progress),
            text(&self.status_message).size(14),
            text(&self.detail_message).size(12),
            Space::new().height(Length::Fixed(20.0)),
            row![
                button("Download")
                    .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                    .padding([10, 20]),
                button("Cancel")
                    .on_press_maybe(
                        self.is_downloading
                            .then_some(DownloadMessage::CancelPressed)
                    )
                    .padding([10, 20]),
            ]
            .spacing(10),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
