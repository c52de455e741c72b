// src/player_backend.rs

use crate::error::PlayerError;
use crate::media::MediaType;
use log::{error, info, warn};
use std::{
    env,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::Command,
    time::timeout,
};

/// How long output is still collected after the player has exited.
const PIPE_GRACE: Duration = Duration::from_millis(250);

/// Captured output of a successful player invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerOutput {
    pub stdout: String,
    pub stderr: String,
}

/// The two commands the external player understands.
///
/// Implementations block until the command finishes and must not be called from
/// an async worker thread. Any failure (missing binary, non-zero exit, timeout)
/// is reported as [`PlayerError::PlayerUnavailable`].
pub trait PlayerBackend: Send + Sync {
    fn stop(&self) -> Result<PlayerOutput, PlayerError>;
    fn play(&self, media_type: MediaType, path: &Path) -> Result<PlayerOutput, PlayerError>;
}

/// Runs the player as a child process: `<program> [leading args] stop` or
/// `<program> [leading args] <type> <path>`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl CommandBackend {
    pub fn new(program: PathBuf, leading_args: Vec<String>, timeout: Duration) -> Self {
        CommandBackend {
            program,
            leading_args,
            timeout,
        }
    }

    /// Builds a backend for `name`, resolving it with [`locate_player`].
    pub fn from_name(name: &str, leading_args: Vec<String>, timeout: Duration) -> Self {
        Self::new(locate_player(name), leading_args, timeout)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&OsStr]) -> Result<PlayerOutput, PlayerError> {
        let command_line = format!(
            "{} {}",
            self.program.display(),
            self.leading_args
                .iter()
                .map(String::as_str)
                .chain(args.iter().map(|a| a.to_str().unwrap_or("?")))
                .collect::<Vec<_>>()
                .join(" ")
        );
        info!("player command: {}", command_line.trim_end());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                PlayerError::PlayerUnavailable(format!("Error: could not start player ({}).", e))
            })?;
        let (status, output) = runtime.block_on(self.run_child(args, &command_line))?;

        if !output.stdout.is_empty() {
            info!("player stdout: {}", output.stdout);
        }

        if !status.success() {
            error!(
                "Player command failed (status: {}). Stderr: {}",
                status, output.stderr
            );
            return Err(PlayerError::PlayerUnavailable(format!(
                "Error: {}",
                if output.stderr.is_empty() {
                    format!("player exited with {}", status)
                } else {
                    output.stderr
                }
            )));
        }
        if !output.stderr.is_empty() {
            warn!("player stderr: {}", output.stderr);
        }

        Ok(output)
    }

    /// Spawns the player and waits at most `timeout` for it to exit. Output is
    /// collected for at most `PIPE_GRACE` after that, since a launcher may leave a
    /// detached process holding its pipes.
    async fn run_child(
        &self,
        args: &[&OsStr],
        command_line: &str,
    ) -> Result<(ExitStatus, PlayerOutput), PlayerError> {
        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!(
                    "Player '{}' could not be started: {}. Make sure it is installed and on PATH.",
                    self.program.display(),
                    e
                );
                PlayerError::PlayerUnavailable(format!(
                    "Error: '{}' command not found ({}).",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let stdout_task = tokio::spawn(drain_pipe(child.stdout.take(), stdout_buf.clone()));
        let stderr_task = tokio::spawn(drain_pipe(child.stderr.take(), stderr_buf.clone()));

        let status = match timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                let _ = child.kill().await;
                error!("Waiting on player failed: {}: {}", command_line, e);
                return Err(PlayerError::PlayerUnavailable(format!(
                    "Error: lost track of the player ({}).",
                    e
                )));
            }
            Err(_) => {
                let _ = child.kill().await;
                error!(
                    "Player command timed out after {:?}: {}",
                    self.timeout, command_line
                );
                return Err(PlayerError::PlayerUnavailable(format!(
                    "Error: player timed out after {} seconds.",
                    self.timeout.as_secs_f32()
                )));
            }
        };

        let _ = timeout(PIPE_GRACE, async {
            let _ = stdout_task.await;
            let _ = stderr_task.await;
        })
        .await;

        let output = PlayerOutput {
            stdout: take_text(&stdout_buf),
            stderr: take_text(&stderr_buf),
        };
        Ok((status, output))
    }
}

impl PlayerBackend for CommandBackend {
    fn stop(&self) -> Result<PlayerOutput, PlayerError> {
        self.run(&[OsStr::new("stop")])
    }

    fn play(&self, media_type: MediaType, path: &Path) -> Result<PlayerOutput, PlayerError> {
        self.run(&[OsStr::new(media_type.as_str()), path.as_os_str()])
    }
}

/// Copies everything read from `pipe` into `sink` until EOF or a read error.
async fn drain_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, sink: Arc<Mutex<Vec<u8>>>) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 4096];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let mut buf = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                buf.extend_from_slice(&chunk[..n]);
            }
        }
    }
}

fn take_text(buf: &Mutex<Vec<u8>>) -> String {
    let bytes = buf.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    String::from_utf8_lossy(&bytes).trim().to_string()
}

/// Finds the player executable.
///
/// The player is searched in the following locations:
/// 1. `name` itself, if it contains a path separator.
/// 2. Next to the application executable.
/// 3. In a `tools` subdirectory next to the executable.
/// 4. In the system's PATH (the bare name is returned).
pub fn locate_player(name: &str) -> PathBuf {
    let requested = PathBuf::from(name);
    if requested.components().count() > 1 {
        return requested;
    }

    if let Ok(current_exe_path) = env::current_exe() {
        if let Some(exe_dir) = current_exe_path.parent() {
            let paths_to_check = [exe_dir.join(name), exe_dir.join("tools").join(name)];
            if let Some(found) = paths_to_check.into_iter().find(|p| p.is_file()) {
                return found;
            }
        }
    }

    requested
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_missing_binary_is_player_unavailable() {
        let backend = CommandBackend::new(
            PathBuf::from("/definitely/not/here/evlc"),
            Vec::new(),
            Duration::from_secs(1),
        );
        match backend.stop() {
            Err(PlayerError::PlayerUnavailable(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected PlayerUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_locate_player_keeps_explicit_paths() {
        assert_eq!(
            locate_player("/usr/local/bin/evlc"),
            PathBuf::from("/usr/local/bin/evlc")
        );
        assert_eq!(locate_player("some-player-xyz"), PathBuf::from("some-player-xyz"));
    }

    #[cfg(unix)]
    fn sh_backend(script: &str, timeout: Duration) -> CommandBackend {
        CommandBackend::new(
            PathBuf::from("sh"),
            vec!["-c".into(), script.into(), "evlc".into()],
            timeout,
        )
    }

    #[cfg(unix)]
    #[test]
    fn test_argument_vectors() {
        let backend = sh_backend("echo \"$@\"", Duration::from_secs(5));

        assert_eq!(backend.stop().unwrap().stdout, "stop");
        assert_eq!(
            backend
                .play(MediaType::Photo, Path::new("/media/cat.png"))
                .unwrap()
                .stdout,
            "photo /media/cat.png"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_carries_stderr() {
        let backend = sh_backend("echo 'no display' >&2; exit 3", Duration::from_secs(5));
        match backend.play(MediaType::Video, Path::new("/media/a.mp4")) {
            Err(PlayerError::PlayerUnavailable(msg)) => assert_eq!(msg, "Error: no display"),
            other => panic!("expected PlayerUnavailable, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_is_player_unavailable() {
        let backend = sh_backend("exec sleep 5", Duration::from_millis(200));
        let started = Instant::now();
        match backend.stop() {
            Err(PlayerError::PlayerUnavailable(msg)) => assert!(msg.contains("timed out")),
            other => panic!("expected PlayerUnavailable, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn test_detached_child_does_not_hold_the_call() {
        let backend = sh_backend("sleep 6 & echo started", Duration::from_secs(1));
        let started = Instant::now();

        let output = backend.stop().unwrap();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(output.stdout, "started");
    }

    #[cfg(unix)]
    #[test]
    fn test_timed_out_player_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());
        let backend = sh_backend(&script, Duration::from_millis(200));

        assert!(matches!(
            backend.stop(),
            Err(PlayerError::PlayerUnavailable(_))
        ));
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }
}
