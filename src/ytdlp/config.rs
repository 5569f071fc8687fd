use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use serde::{Deserialize, Serialize};

use crate::domain::DownloadError;

#[cfg(windows)]
const DEFAULT_PROGRAM: &str = "yt-dlp.exe";
#[cfg(not(windows))]
const DEFAULT_PROGRAM: &str = "yt-dlp";

const CONFIG_FILE_NAME: &str = "config.json";

/// How to launch yt-dlp and how closely to watch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable path, or a bare name looked up on `PATH`.
    pub program: PathBuf,
    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`
    /// when `program` is a Python interpreter.
    pub launcher_args: Vec<String>,
    pub poll_interval_ms: u64,
    /// How long to keep reading output after the process exited.
    pub drain_grace_ms: u64,
    pub default_output_dir: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            launcher_args: Vec::new(),
            poll_interval_ms: 250,
            drain_grace_ms: 2000,
            default_output_dir: default_download_dir(),
        }
    }
}

impl ToolConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DownloadError> {
        serde_json::from_str(json).map_err(|e| DownloadError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self, DownloadError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DownloadError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Read `config.json` from the platform config directory, falling back
    /// to defaults when there is none.
    pub fn load() -> Result<Self, DownloadError> {
        match config_file_path() {
            Some(path) if path.is_file() => {
                tracing::info!("Loading config from {}", path.display());
                Self::from_json_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    /// Locate the configured executable. Bare names are searched on `PATH`.
    pub fn resolve_program(&self) -> Option<PathBuf> {
        let program = &self.program;
        if program.components().count() > 1 || program.is_absolute() {
            return program.is_file().then(|| program.clone());
        }

        let search_path = std::env::var_os("PATH")?;
        std::env::split_paths(&search_path)
            .map(|dir| dir.join(program))
            .find(|candidate| candidate.is_file())
    }

    pub fn tool_available(&self) -> bool {
        self.resolve_program().is_some()
    }
}

fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("downloads"))
}

fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "simple-video-downloader")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ToolConfig::from_json_str(r#"{ "poll_interval_ms": 100 }"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.program, PathBuf::from(DEFAULT_PROGRAM));
        assert!(config.launcher_args.is_empty());
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = ToolConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, DownloadError::Config(_)));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "program": "/usr/bin/python3", "launcher_args": ["-m", "yt_dlp"] }"#,
        )
        .unwrap();

        let config = ToolConfig::from_json_file(&path).unwrap();
        assert_eq!(config.program, PathBuf::from("/usr/bin/python3"));
        assert_eq!(config.launcher_args, vec!["-m", "yt_dlp"]);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = ToolConfig {
            program: dir.path().join("no-such-yt-dlp"),
            ..ToolConfig::default()
        };
        assert!(!config.tool_available());
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_program_is_available() {
        let config = ToolConfig {
            program: PathBuf::from("/bin/sh"),
            ..ToolConfig::default()
        };
        assert_eq!(config.resolve_program(), Some(PathBuf::from("/bin/sh")));
    }
}
