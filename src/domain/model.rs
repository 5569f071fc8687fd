use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::FailureCause;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaFormat {
    Video,
    AudioOnly,
}

impl MediaFormat {
    pub const ALL: [MediaFormat; 2] = [MediaFormat::Video, MediaFormat::AudioOnly];
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFormat::Video => write!(f, "Video"),
            MediaFormat::AudioOnly => write!(f, "Audio only"),
        }
    }
}

/// Maximum video height. Only consulted for `MediaFormat::Video`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    P2160,
    P1440,
    P1080,
    P720,
    P480,
}

const RESOLUTION_HEIGHTS: [u32; 5] = [2160, 1440, 1080, 720, 480];

impl VideoResolution {
    pub const ALL: [VideoResolution; 5] = [
        VideoResolution::P2160,
        VideoResolution::P1440,
        VideoResolution::P1080,
        VideoResolution::P720,
        VideoResolution::P480,
    ];

    pub fn height(self) -> u32 {
        RESOLUTION_HEIGHTS[self as usize]
    }
}

impl fmt::Display for VideoResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}p", self.height())
    }
}

/// Upper bound on the audio stream quality, in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioBitrate {
    Kbps320,
    Kbps256,
    Kbps192,
    Kbps128,
}

const BITRATE_KBPS: [u32; 4] = [320, 256, 192, 128];

impl AudioBitrate {
    pub const ALL: [AudioBitrate; 4] = [
        AudioBitrate::Kbps320,
        AudioBitrate::Kbps256,
        AudioBitrate::Kbps192,
        AudioBitrate::Kbps128,
    ];

    pub fn kbps(self) -> u32 {
        BITRATE_KBPS[self as usize]
    }
}

impl fmt::Display for AudioBitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} kbps", self.kbps())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: MediaFormat,
    pub resolution: VideoResolution,
    pub bitrate: AudioBitrate,
    pub output_dir: PathBuf,
    pub custom_filename: Option<String>,
}

impl DownloadRequest {
    /// A request with the highest quality tiers and the title as filename.
    pub fn new(url: impl Into<String>, format: MediaFormat, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            format,
            resolution: VideoResolution::P1080,
            bitrate: AudioBitrate::Kbps320,
            output_dir: output_dir.into(),
            custom_filename: None,
        }
    }

    pub fn with_resolution(mut self, resolution: VideoResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_bitrate(mut self, bitrate: AudioBitrate) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_custom_filename(mut self, name: impl Into<String>) -> Self {
        self.custom_filename = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    FetchingInfo,
    ExtractingUrl,
    Downloading,
    PostProcessing,
}

impl fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DownloadPhase::FetchingInfo => "Fetching video info",
            DownloadPhase::ExtractingUrl => "Extracting URL",
            DownloadPhase::Downloading => "Downloading",
            DownloadPhase::PostProcessing => "Post-processing",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress {
        /// Always within `0.0..=100.0`.
        percent: f64,
        total_size: Option<String>,
        speed: Option<String>,
        eta: Option<String>,
    },
    PhaseChange(DownloadPhase),
    DestinationKnown(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TerminalResult {
    Completed { path: Option<PathBuf> },
    Failed(FailureCause),
    /// User-initiated abort; never reported as a generic failure.
    Cancelled,
}

impl TerminalResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TerminalResult::Completed { .. })
    }
}

/// One item of the ordered stream a running download produces.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Update(ProgressEvent),
    Terminal(TerminalResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_tables_cover_every_variant() {
        let heights: Vec<u32> = VideoResolution::ALL.iter().map(|r| r.height()).collect();
        assert_eq!(heights, vec![2160, 1440, 1080, 720, 480]);

        let rates: Vec<u32> = AudioBitrate::ALL.iter().map(|b| b.kbps()).collect();
        assert_eq!(rates, vec![320, 256, 192, 128]);
    }

    #[test]
    fn test_labels() {
        assert_eq!(VideoResolution::P720.to_string(), "720p");
        assert_eq!(AudioBitrate::Kbps192.to_string(), "192 kbps");
        assert_eq!(MediaFormat::AudioOnly.to_string(), "Audio only");
    }
}
