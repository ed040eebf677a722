//! Control socket: server (during `fetchq run`) and client (`fetchq pause|resume|stop`).
//! Protocol: one command per line: `pause`, `resume`, `toggle` or `stop`.

use anyhow::{Context, Result};
use fetchq_core::{EngineControl, EngineEvent};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::UnboundedSender;

/// `~/.local/state/fetchq/control.sock`.
pub fn default_socket_path() -> Result<PathBuf> {
    Ok(fetchq_core::logging::state_dir()?.join("control.sock"))
}

/// Applies one protocol line to `control`. Returns the log line to show, if any.
pub(crate) fn apply_line(control: &EngineControl, line: &str) -> Option<&'static str> {
    match line.trim() {
        "pause" => {
            control.pause();
            Some("paused")
        }
        "resume" => {
            control.resume();
            Some("resumed")
        }
        "toggle" => Some(if control.toggle_pause() { "paused" } else { "resumed" }),
        "stop" => {
            control.stop();
            Some("stop requested")
        }
        _ => None,
    }
}

/// Binds `path` and applies every received line to `control`. Malformed lines are ignored.
pub fn spawn_control_listener(
    control: Arc<EngineControl>,
    events: UnboundedSender<EngineEvent>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir: {}", parent.display()))?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("bind control socket {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let control = Arc::clone(&control);
                    let events = events.clone();
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            match apply_line(&control, &line) {
                                Some(msg) => {
                                    tracing::info!("control: {}", msg);
                                    let _ = events.send(EngineEvent::Log(msg.to_string()));
                                }
                                None => tracing::debug!("control: ignored line {:?}", line),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends one command line. Returns false when no queue is running (no socket).
pub async fn send_command(socket_path: &Path, command: &str) -> Result<bool> {
    if !socket_path.exists() {
        return Ok(false);
    }
    let mut stream = match UnixStream::connect(socket_path).await {
        Ok(s) => s,
        // Stale socket left by a crashed run.
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(false),
        Err(e) => return Err(e).context("connect to control socket"),
    };
    stream.write_all(format!("{}\n", command).as_bytes()).await?;
    stream.shutdown().await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_drive_the_control_state() {
        let control = EngineControl::new();
        assert_eq!(apply_line(&control, "pause\n"), Some("paused"));
        assert!(control.is_paused());
        assert_eq!(apply_line(&control, "toggle"), Some("resumed"));
        assert!(!control.is_paused());
        assert_eq!(apply_line(&control, "toggle"), Some("paused"));
        assert_eq!(apply_line(&control, " resume "), Some("resumed"));
        assert_eq!(apply_line(&control, "pause 3"), None);
        assert!(control.is_active());
        assert_eq!(apply_line(&control, "stop"), Some("stop requested"));
        assert!(!control.is_active());
    }

    #[tokio::test]
    async fn listener_applies_commands_from_client() {
        let dir = std::env::temp_dir().join(format!("fetchq-sock-{}", std::process::id()));
        let path = dir.join("control.sock");
        let control = Arc::new(EngineControl::new());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_control_listener(Arc::clone(&control), tx, &path).unwrap();

        assert!(send_command(&path, "pause").await.unwrap());
        assert_eq!(rx.recv().await, Some(EngineEvent::Log("paused".into())));
        assert!(control.is_paused());

        handle.abort();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn send_without_socket_reports_not_running() {
        let path = std::env::temp_dir().join("fetchq-no-such-dir").join("control.sock");
        assert!(!send_command(&path, "stop").await.unwrap());
    }
}
