pub mod logging;

use std::ffi::OsStr;

use tokio::process::Command;

/// Make a user-supplied name safe to use as a single path component
/// inside a yt-dlp output template.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches('.')
        .trim()
        .replace('%', "%%")
}

/// A command that never opens a console window of its own.
pub fn background_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    configure_for_background(&mut cmd);
    cmd
}

#[cfg(windows)]
fn configure_for_background(cmd: &mut Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn configure_for_background(_cmd: &mut Command) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file"), "test_file");
        assert_eq!(sanitize_filename("normal-name"), "normal-name");
        assert_eq!(sanitize_filename("  ..hidden.  "), "hidden");
    }

    #[test]
    fn test_sanitize_filename_escapes_template_markers() {
        assert_eq!(sanitize_filename("100% real"), "100%% real");
        assert_eq!(sanitize_filename("%(id)s"), "%%(id)s");
    }
}
