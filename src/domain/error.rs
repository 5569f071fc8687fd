use std::path::PathBuf;

use thiserror::Error;

/// Errors raised synchronously before any process is spawned.
#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    #[error("yt-dlp was not found at {}", .0.display())]
    ToolMissing(PathBuf),

    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("Cannot use output directory {}: {reason}", .path.display())]
    OutputDirectory { path: PathBuf, reason: String },

    #[error("Another download is still running")]
    Busy,

    #[error("Config error: {0}")]
    Config(String),
}

/// Why a started download ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    #[error("Failed to start yt-dlp: {0}")]
    Spawn(String),

    #[error("yt-dlp exited with {}{}", exit_code_text(.code), stderr_suffix(.stderr))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("Lost track of the yt-dlp process: {0}")]
    Monitor(String),
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_zero_exit_message() {
        let cause = FailureCause::NonZeroExit {
            code: Some(1),
            stderr: "ERROR: Video unavailable".to_string(),
        };
        assert_eq!(
            cause.to_string(),
            "yt-dlp exited with code 1: ERROR: Video unavailable"
        );

        let killed = FailureCause::NonZeroExit {
            code: None,
            stderr: String::new(),
        };
        assert_eq!(
            killed.to_string(),
            "yt-dlp exited with no exit code (terminated by signal)"
        );
    }
}
