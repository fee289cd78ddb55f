//! Abstractions for filesystem and command access to enable testing and mocking.
//!
//! The `FileSystem` trait lets the resolver read the real `/proc` and `/sys`
//! trees on a device or an in-memory mock in tests. `CommandRunner` does the
//! same for unprivileged external commands such as `dmesg` or `getprop`.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::collector::lines::{LineStream, LossyLines};
use crate::error::ExitStatusError;

/// Abstraction for filesystem operations.
///
/// This trait allows the resolver to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks whether a path exists.
    ///
    /// An error other than `NotFound`, typically `PermissionDenied` on a
    /// parent directory, means existence could not be determined.
    fn try_exists(&self, path: &Path) -> io::Result<bool>;

    /// True unless the path is known to be absent.
    ///
    /// A path hidden behind an unsearchable directory counts as present so
    /// that callers still try an elevated read.
    fn exists(&self, path: &Path) -> bool {
        match self.try_exists(path) {
            Ok(found) => found,
            Err(e) => e.kind() != io::ErrorKind::NotFound,
        }
    }

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Opens a file as a lazy line stream.
    fn open_lines(&self, path: &Path) -> io::Result<LineStream<'static>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn open_lines(&self, path: &Path) -> io::Result<LineStream<'static>> {
        let file = File::open(path)?;
        Ok(Box::new(LossyLines::new(BufReader::new(file))))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            stdout: Vec::new(),
            code: Some(code),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Runs external commands with stdin closed, stderr discarded and stdout
/// captured.
///
/// Callers only hand in argument vectors built from closed, read-only
/// command descriptions; see [`crate::collector::privileged`].
pub trait CommandRunner: Send + Sync {
    /// Runs `argv` to completion.
    fn output(&self, argv: &[String]) -> io::Result<CommandOutput>;

    /// Spawns `argv` and yields its stdout line by line.
    ///
    /// The child is reaped when the stream is exhausted or dropped.
    fn stream(&self, argv: &[String]) -> io::Result<LineStream<'static>>;
}

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `CommandRunner` backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn command(argv: &[String]) -> io::Result<Command> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty command line"))?;
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        Ok(cmd)
    }
}

impl CommandRunner for SystemRunner {
    fn output(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let mut cmd = Self::command(argv)?;
        debug!(argv = ?argv, timeout = ?self.timeout, "running command");
        match self.timeout {
            None => {
                let out = cmd.output()?;
                Ok(CommandOutput {
                    stdout: out.stdout,
                    code: out.status.code(),
                })
            }
            Some(limit) => output_with_deadline(cmd, limit),
        }
    }

    fn stream(&self, argv: &[String]) -> io::Result<LineStream<'static>> {
        let mut cmd = Self::command(argv)?;
        debug!(argv = ?argv, "streaming command");
        let mut child = cmd.spawn()?;
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::other("stdout was not captured"));
        };
        Ok(Box::new(ChildLines {
            child,
            lines: LossyLines::new(BufReader::new(stdout)),
            finished: false,
        }))
    }
}

/// Runs a command, killing it if it outlives `limit`.
///
/// Stdout is drained on a helper thread so a chatty child cannot block on
/// a full pipe while we poll for its exit.
fn output_with_deadline(mut cmd: Command, limit: Duration) -> io::Result<CommandOutput> {
    let mut child = cmd.spawn()?;
    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(io::Error::other("stdout was not captured"));
    };
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        stdout.read_to_end(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + limit;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                // A grandchild may still hold the pipe open; leave the
                // reader thread detached rather than joining it.
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("command exceeded {limit:?}"),
                ));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }
    };

    let stdout = reader
        .join()
        .map_err(|_| io::Error::other("stdout reader panicked"))??;
    Ok(CommandOutput {
        stdout,
        code: status.code(),
    })
}

/// Line stream over a running child's stdout.
struct ChildLines {
    child: Child,
    lines: LossyLines<BufReader<ChildStdout>>,
    finished: bool,
}

impl Iterator for ChildLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let next = self.lines.next();
        if next.is_some() {
            return next;
        }
        self.finished = true;
        match self.child.wait() {
            Ok(status) if !status.success() => Some(Err(io::Error::other(ExitStatusError {
                code: status.code(),
            }))),
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl Drop for ChildLines {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime");
        std::fs::write(&path, "12.5 3.0\n").unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_to_string(&path).unwrap(), "12.5 3.0\n");
        assert!(fs.exists(&path));
        assert!(!fs.exists(&dir.path().join("missing")));
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_unsearchable_dir_is_not_absent() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let thermal = dir.path().join("class/thermal");
        std::fs::create_dir_all(thermal.join("thermal_zone0")).unwrap();
        std::fs::write(thermal.join("thermal_zone0/temp"), "45000\n").unwrap();
        std::fs::set_permissions(&thermal, std::fs::Permissions::from_mode(0o600)).unwrap();

        let fs = RealFs::new();
        let zone = thermal.join("thermal_zone0");
        let probed = fs.try_exists(&zone);
        // Root ignores directory modes.
        let blocked = probed.is_err();
        if blocked {
            assert_eq!(probed.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
        }
        assert!(fs.exists(&zone));

        std::fs::set_permissions(&thermal, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(!fs.exists(&thermal.join("thermal_zone9")));
    }

    #[test]
    fn test_real_fs_not_found_kind() {
        let fs = RealFs::new();
        let err = fs
            .read_to_string(Path::new("/nonexistent/path/12345"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_read_dir_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.log"), "one\ntwo\n").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_dir(dir.path()).unwrap().len(), 2);

        let lines: Vec<String> = fs
            .open_lines(&dir.path().join("a.log"))
            .unwrap()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_command_output_helpers() {
        let ok = CommandOutput::success("Enforcing\n");
        assert!(ok.is_success());
        assert_eq!(ok.stdout_lossy(), "Enforcing\n");
        assert!(!CommandOutput::failed(1).is_success());
    }

    #[test]
    fn test_system_runner_rejects_empty_argv() {
        let runner = SystemRunner::default();
        let err = runner.output(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_streams_command_output() {
        let runner = SystemRunner::default();
        let argv = vec!["printf".to_string(), "a\\nb\\nc\\n".to_string()];
        let lines: Vec<String> = runner.stream(&argv).unwrap().map(|l| l.unwrap()).collect();
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_stream_reports_failed_exit() {
        let runner = SystemRunner::default();
        let argv = vec!["false".to_string()];
        let items: Vec<io::Result<String>> = runner.stream(&argv).unwrap().collect();
        assert_eq!(items.len(), 1);
        let err = items.into_iter().next().unwrap().unwrap_err();
        assert_eq!(
            crate::error::AttemptError::from(err),
            crate::error::AttemptError::CommandFailed { code: Some(1) }
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_timeout_kills_slow_command() {
        let runner = SystemRunner::new(Some(Duration::from_millis(50)));
        let argv = vec!["sleep".to_string(), "5".to_string()];
        let err = runner.output(&argv).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_system_runner_missing_program() {
        let runner = SystemRunner::default();
        let argv = vec!["/nonexistent/droidprobe-test-binary".to_string()];
        let err = runner.output(&argv).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
