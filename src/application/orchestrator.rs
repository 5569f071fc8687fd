use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::{
    application::{CancellationController, FilePathTracker},
    domain::{DownloadEvent, FailureCause, TerminalResult},
    utils::background_command,
    ytdlp::{classify_line, classify_stderr, StderrKind, ToolConfig},
};

/// Error lines kept for the `Failed` cause.
const STDERR_TAIL_LINES: usize = 50;

/// Everything one download owns while yt-dlp is running.
pub(crate) struct DownloadRun {
    pub config: Arc<ToolConfig>,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cancel: CancellationController,
    pub destination: FilePathTracker,
    pub events: UnboundedSender<DownloadEvent>,
}

enum OutputLine {
    Stdout(String),
    Stderr(String),
}

enum Exit {
    Natural(ExitStatus),
    Cancelled,
    Lost(io::Error),
}

impl DownloadRun {
    /// Run yt-dlp to the end, forwarding progress as it goes. Sends no
    /// terminal event itself; the returned result is the terminal outcome.
    pub async fn execute(&self) -> TerminalResult {
        if self.cancel.is_cancelled() {
            return TerminalResult::Cancelled;
        }

        let mut child = match self.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to spawn {}: {}", self.program.display(), e);
                return TerminalResult::Failed(FailureCause::Spawn(e.to_string()));
            }
        };
        info!(pid = ?child.id(), "yt-dlp started");

        let (line_tx, line_rx) = mpsc::unbounded_channel();
        let readers: Vec<JoinHandle<()>> = [
            child
                .stdout
                .take()
                .map(|out| spawn_reader(out, line_tx.clone(), OutputLine::Stdout)),
            child
                .stderr
                .take()
                .map(|err| spawn_reader(err, line_tx.clone(), OutputLine::Stderr)),
        ]
        .into_iter()
        .flatten()
        .collect();
        drop(line_tx);

        let mut monitor = Monitor {
            run: self,
            lines: line_rx,
            stderr_tail: VecDeque::new(),
        };

        let exit = monitor.watch(&mut child).await;
        let killed = match &exit {
            Exit::Natural(_) => {
                monitor.drain().await;
                false
            }
            Exit::Cancelled | Exit::Lost(_) => {
                terminate_process_tree(&mut child).await;
                true
            }
        };
        release(&mut child, readers, killed).await;

        monitor.outcome(exit)
    }

    fn spawn(&self) -> io::Result<Child> {
        let mut cmd = background_command(&self.program);
        cmd.args(&self.config.launcher_args)
            .args(&self.args)
            .env("PYTHONIOENCODING", "utf-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group, so the whole tree can be signalled at once.
        #[cfg(unix)]
        cmd.process_group(0);

        debug!("{} {:?}", self.program.display(), self.args);
        cmd.spawn()
    }
}

struct Monitor<'a> {
    run: &'a DownloadRun,
    lines: UnboundedReceiver<OutputLine>,
    stderr_tail: VecDeque<String>,
}

impl Monitor<'_> {
    /// Forward output until the process exits or a cancel is observed.
    async fn watch(&mut self, child: &mut Child) -> Exit {
        let mut ticker = tokio::time::interval(self.run.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                Some(line) = self.lines.recv() => self.handle(line),
                _ = ticker.tick() => {
                    match child.try_wait() {
                        Ok(Some(status)) => return Exit::Natural(status),
                        Ok(None) => {}
                        Err(e) => return Exit::Lost(e),
                    }
                    if self.run.cancel.is_cancelled() {
                        info!("Cancel requested, terminating yt-dlp");
                        return Exit::Cancelled;
                    }
                }
            }
        }
    }

    /// Output can still be buffered after exit; read it for a bounded time.
    async fn drain(&mut self) {
        let grace = self.run.config.drain_grace();
        let drained = tokio::time::timeout(grace, async {
            while let Some(line) = self.lines.recv().await {
                self.handle(line);
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "yt-dlp output still open {}ms after exit, ignoring the rest",
                grace.as_millis()
            );
        }
    }

    fn handle(&mut self, line: OutputLine) {
        match line {
            OutputLine::Stdout(line) => {
                debug!("yt-dlp: {}", line);
                let classified = classify_line(&line);
                if let Some(path) = classified.destination {
                    self.run.destination.set(path);
                }
                if let Some(event) = classified.event {
                    let _ = self.run.events.send(DownloadEvent::Update(event));
                }
            }
            OutputLine::Stderr(line) => match classify_stderr(&line) {
                StderrKind::Advisory => warn!("yt-dlp: {}", line),
                StderrKind::Error => {
                    error!("yt-dlp: {}", line);
                    if self.stderr_tail.len() == STDERR_TAIL_LINES {
                        self.stderr_tail.pop_front();
                    }
                    self.stderr_tail.push_back(line);
                }
                StderrKind::Blank => {}
            },
        }
    }

    fn outcome(self, exit: Exit) -> TerminalResult {
        match exit {
            Exit::Natural(status) if status.success() => TerminalResult::Completed {
                path: self.run.destination.get(),
            },
            // Killed from outside while we were about to act on the flag.
            Exit::Natural(_) if self.run.cancel.is_cancelled() => TerminalResult::Cancelled,
            Exit::Natural(status) => TerminalResult::Failed(FailureCause::NonZeroExit {
                code: status.code(),
                stderr: Vec::from(self.stderr_tail).join("\n"),
            }),
            Exit::Cancelled => TerminalResult::Cancelled,
            Exit::Lost(e) => TerminalResult::Failed(FailureCause::Monitor(e.to_string())),
        }
    }
}

fn spawn_reader<R>(
    stream: R,
    tx: UnboundedSender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(wrap(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Failed to read yt-dlp output: {}", e);
                    break;
                }
            }
        }
    })
}

/// Kill yt-dlp together with anything it started (ffmpeg and friends).
async fn terminate_process_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        if let Err(e) = kill_tree_command(pid).await {
            warn!("Failed to kill process tree of {}: {}", pid, e);
        }
    }
    if let Err(e) = child.start_kill() {
        // Already gone is fine.
        debug!("start_kill: {}", e);
    }
}

#[cfg(unix)]
async fn kill_tree_command(pid: u32) -> io::Result<ExitStatus> {
    background_command("kill")
        .args(["-s", "KILL", "--", &format!("-{}", pid)])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
}

#[cfg(windows)]
async fn kill_tree_command(pid: u32) -> io::Result<ExitStatus> {
    background_command("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
}

/// Single teardown for every exit path: stop the readers, reap the child.
/// `killed` means the tree was already terminated; no second kill is sent.
/// Returns whether this call sent a kill.
async fn release(child: &mut Child, readers: Vec<JoinHandle<()>>, killed: bool) -> bool {
    for reader in readers {
        reader.abort();
    }
    let kill_sent = !killed && matches!(child.try_wait(), Ok(None));
    if kill_sent {
        let _ = child.start_kill();
    }
    match child.wait().await {
        Ok(status) => debug!("yt-dlp reaped: {}", status),
        Err(e) => warn!("Failed to reap yt-dlp: {}", e),
    }
    kill_sent
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sleeping_child() -> Child {
        background_command("/bin/sh")
            .args(["-c", "sleep 30"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn test_terminated_tree_is_not_killed_again() {
        let mut child = sleeping_child();

        terminate_process_tree(&mut child).await;
        let kill_sent = tokio::time::timeout(
            Duration::from_secs(10),
            release(&mut child, Vec::new(), true),
        )
        .await
        .expect("child was not reaped");

        assert!(!kill_sent);
        assert!(child.id().is_none());
    }

    #[tokio::test]
    async fn test_release_kills_a_child_still_running() {
        let mut child = sleeping_child();

        let kill_sent = tokio::time::timeout(
            Duration::from_secs(10),
            release(&mut child, Vec::new(), false),
        )
        .await
        .expect("child was not reaped");

        assert!(kill_sent);
    }
}
