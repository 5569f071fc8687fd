//! Maps a [`DownloadRequest`] onto the yt-dlp command line.

use crate::domain::{DownloadRequest, MediaFormat};
use crate::utils::sanitize_filename;

pub const AUDIO_CONTAINER: &str = "mp3";
pub const VIDEO_CONTAINER: &str = "mp4";

const TITLE_PLACEHOLDER: &str = "%(title)s";
const EXT_PLACEHOLDER: &str = "%(ext)s";

/// Flags passed on every invocation.
const COMMON_ARGS: [&str; 4] = [
    "--no-playlist",
    "--embed-thumbnail",
    "--embed-metadata",
    "--newline",
];

/// Build the argument list for one download. Pure: no I/O.
pub fn build_args(request: &DownloadRequest) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(16);

    match request.format {
        MediaFormat::AudioOnly => {
            args.push("-f".to_owned());
            args.push("bestaudio/best".to_owned());
            args.push("--extract-audio".to_owned());
            args.push("--audio-format".to_owned());
            args.push(AUDIO_CONTAINER.to_owned());
            args.push("--audio-quality".to_owned());
            args.push(format!("{}K", request.bitrate.kbps()));
        }
        MediaFormat::Video => {
            args.push("-f".to_owned());
            args.push(format!(
                "bestvideo[height<={}]+bestaudio[abr<={}]/best",
                request.resolution.height(),
                request.bitrate.kbps()
            ));
            args.push("--merge-output-format".to_owned());
            args.push(VIDEO_CONTAINER.to_owned());
        }
    }

    args.extend(COMMON_ARGS.iter().map(|arg| arg.to_string()));

    args.push("-o".to_owned());
    args.push(output_template(request));

    args.push("--".to_owned());
    args.push(request.url.trim().to_owned());
    args
}

fn output_template(request: &DownloadRequest) -> String {
    let stem = request
        .custom_filename
        .as_deref()
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_owned());

    request
        .output_dir
        .join(format!("{}.{}", stem, EXT_PLACEHOLDER))
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AudioBitrate, VideoResolution};
    use std::path::Path;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|arg| arg == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_audio_only_args() {
        let request = DownloadRequest::new("https://youtu.be/abc", MediaFormat::AudioOnly, "/music")
            .with_bitrate(AudioBitrate::Kbps192);
        let args = build_args(&request);

        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert!(args.contains(&"--extract-audio".to_string()));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("192K"));
        assert!(!args.contains(&"--merge-output-format".to_string()));
    }

    #[test]
    fn test_video_args_bound_height_and_bitrate() {
        let request = DownloadRequest::new("https://youtu.be/abc", MediaFormat::Video, "/videos")
            .with_resolution(VideoResolution::P720)
            .with_bitrate(AudioBitrate::Kbps128);
        let args = build_args(&request);

        assert_eq!(
            value_after(&args, "-f"),
            Some("bestvideo[height<=720]+bestaudio[abr<=128]/best")
        );
        assert_eq!(value_after(&args, "--merge-output-format"), Some("mp4"));
        assert!(!args.contains(&"--extract-audio".to_string()));
    }

    #[test]
    fn test_every_resolution_tier_reaches_the_selector() {
        for resolution in VideoResolution::ALL {
            let request = DownloadRequest::new("u", MediaFormat::Video, "/v").with_resolution(resolution);
            let args = build_args(&request);
            let selector = value_after(&args, "-f").unwrap();
            assert!(selector.contains(&format!("[height<={}]", resolution.height())));
        }
    }

    #[test]
    fn test_common_flags_and_url_position() {
        let request = DownloadRequest::new("  https://youtu.be/abc ", MediaFormat::Video, "/videos");
        let args = build_args(&request);

        for flag in COMMON_ARGS {
            assert!(args.iter().any(|arg| arg == flag), "missing {}", flag);
        }
        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], "https://youtu.be/abc");
    }

    #[test]
    fn test_output_template_uses_title_by_default() {
        let request = DownloadRequest::new("u", MediaFormat::Video, "/videos");
        let args = build_args(&request);
        let expected = Path::new("/videos").join("%(title)s.%(ext)s");
        assert_eq!(value_after(&args, "-o"), expected.to_str());
    }

    #[test]
    fn test_output_template_uses_sanitized_custom_name() {
        let request = DownloadRequest::new("u", MediaFormat::AudioOnly, "/music")
            .with_custom_filename("AC/DC: 100%");
        let args = build_args(&request);
        let expected = Path::new("/music").join("AC_DC_ 100%%.%(ext)s");
        assert_eq!(value_after(&args, "-o"), expected.to_str());
    }

    #[test]
    fn test_blank_custom_name_falls_back_to_title() {
        let request = DownloadRequest::new("u", MediaFormat::AudioOnly, "/music").with_custom_filename("  ");
        let args = build_args(&request);
        assert!(value_after(&args, "-o").unwrap().ends_with("%(title)s.%(ext)s"));
    }

    #[test]
    fn test_builder_is_deterministic() {
        let request = DownloadRequest::new("https://youtu.be/abc", MediaFormat::Video, "/videos");
        assert_eq!(build_args(&request), build_args(&request));
    }
}
