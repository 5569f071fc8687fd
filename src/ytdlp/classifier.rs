//! Line-by-line interpretation of yt-dlp output.
//!
//! Every function here judges a single line on its own content. Nothing is
//! carried between calls, so duplicated or reordered lines cannot affect how
//! later lines are classified.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{DownloadPhase, ProgressEvent};

static DESTINATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]\s+Destination:\s*(?P<path>.+?)\s*$").unwrap());

static ALREADY_DOWNLOADED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[download\]\s+(?P<path>.+?) has already been downloaded").unwrap()
});

static MERGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\[Merger\]\s+Merging formats into "(?P<path>[^"]+)""#).unwrap()
});

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[download\]\s+(?P<pct>[-+]?\d+(?:\.\d+)?)%").unwrap());

static TOTAL_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bof\s+~?\s*(?P<size>\d+(?:\.\d+)?\s?(?:[KMGTP]i?)?B)\b").unwrap()
});

static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bat\s+(?P<speed>\d+(?:\.\d+)?\s?(?:[KMGTP]i?)?B/s)").unwrap()
});

static ETA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bETA\s+(?P<eta>\d+(?::\d{2}){1,2}|\d+s)\b").unwrap());

static POST_PROCESSING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(?:Merger|ExtractAudio|EmbedThumbnail|Metadata|FixupM3u8|FixupM4a|FixupStretched|VideoConvertor|VideoRemuxer|MoveFiles|ffmpeg)\]",
    )
    .unwrap()
});

static FORMATS_SELECTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDownloading \d+ format\(s\)").unwrap());

static FETCHING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(?P<tag>[^\]]+)\]\s.*\bDownloading\b").unwrap());

static EXTRACTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]\s+Extracting URL:").unwrap());

static ADVISORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:WARNING|Deprecated Feature):|thumbnail").unwrap());

/// What one stdout line means. The destination update is reported
/// separately from the event so the caller owns the tracker write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub event: Option<ProgressEvent>,
    pub destination: Option<PathBuf>,
}

impl Classified {
    fn none() -> Self {
        Self::default()
    }

    fn event(event: ProgressEvent) -> Self {
        Self {
            event: Some(event),
            destination: None,
        }
    }

    fn phase(phase: DownloadPhase) -> Self {
        Self::event(ProgressEvent::PhaseChange(phase))
    }

    fn destination(path: PathBuf) -> Self {
        Self {
            event: Some(ProgressEvent::DestinationKnown(path.clone())),
            destination: Some(path),
        }
    }
}

/// Classify one stdout line. First match wins.
pub fn classify_line(line: &str) -> Classified {
    let line = line.trim_end();

    if let Some(path) = announced_destination(line) {
        return Classified::destination(path);
    }

    if let Some(event) = parse_progress(line) {
        return Classified::event(event);
    }

    if POST_PROCESSING_RE.is_match(line) {
        let mut classified = Classified::phase(DownloadPhase::PostProcessing);
        classified.destination = MERGER_RE
            .captures(line)
            .map(|caps| PathBuf::from(&caps["path"]));
        return classified;
    }

    if FORMATS_SELECTED_RE.is_match(line) {
        return Classified::phase(DownloadPhase::Downloading);
    }

    if let Some(caps) = FETCHING_RE.captures(line) {
        if &caps["tag"] != "download" {
            return Classified::phase(DownloadPhase::FetchingInfo);
        }
    }

    if EXTRACTING_RE.is_match(line) {
        return Classified::phase(DownloadPhase::ExtractingUrl);
    }

    Classified::none()
}

fn announced_destination(line: &str) -> Option<PathBuf> {
    DESTINATION_RE
        .captures(line)
        .or_else(|| ALREADY_DOWNLOADED_RE.captures(line))
        .map(|caps| PathBuf::from(&caps["path"]))
}

/// A progress line without a usable percentage yields nothing.
fn parse_progress(line: &str) -> Option<ProgressEvent> {
    let caps = PERCENT_RE.captures(line)?;
    let percent = caps["pct"].parse::<f64>().ok()?;
    if !percent.is_finite() {
        return None;
    }

    let rest = &line[caps.get(0)?.end()..];

    Some(ProgressEvent::Progress {
        percent: percent.clamp(0.0, 100.0),
        total_size: capture(&TOTAL_SIZE_RE, rest, "size"),
        speed: capture(&SPEED_RE, rest, "speed"),
        eta: capture(&ETA_RE, rest, "eta"),
    })
}

fn capture(re: &Regex, haystack: &str, name: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.name(name).map(|m| m.as_str().to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrKind {
    /// Non-critical; logged and dropped.
    Advisory,
    /// Kept as failure context. Never ends the download by itself.
    Error,
    Blank,
}

pub fn classify_stderr(line: &str) -> StderrKind {
    let line = line.trim();
    if line.is_empty() {
        StderrKind::Blank
    } else if ADVISORY_RE.is_match(line) {
        StderrKind::Advisory
    } else {
        StderrKind::Error
    }
}
