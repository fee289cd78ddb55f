//! Scripted stand-ins for external commands, the privileged reader and
//! syscalls.
//!
//! Each mock is cheap to clone and clones share state, so a test can keep
//! a handle after moving one into a resolver and inspect the call log.

use std::collections::HashMap;
use std::io::{self, Cursor};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::collector::lines::{LineStream, LossyLines};
use crate::collector::privileged::{ElevatedTarget, PrivilegedReader};
use crate::collector::syscall::{SystemCalls, UnameInfo};
use crate::collector::traits::{CommandOutput, CommandRunner};
use crate::error::{AttemptError, ExitStatusError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turns captured output into a line stream that ends with an exit-status
/// error when the command failed, like a real child process.
fn stream_output(output: CommandOutput) -> LineStream<'static> {
    let failed = (!output.is_success()).then_some(ExitStatusError { code: output.code });
    let lines = LossyLines::new(Cursor::new(output.stdout));
    Box::new(lines.chain(failed.map(|e| Err(io::Error::other(e)))))
}

#[derive(Debug, Default)]
struct RunnerState {
    responses: HashMap<Vec<String>, Result<CommandOutput, io::ErrorKind>>,
    calls: Vec<Vec<String>>,
}

/// `CommandRunner` that replays scripted outputs.
///
/// Commands without a scripted response fail with `NotFound`, as if the
/// program was not installed.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the output of `argv`.
    pub fn respond(&self, argv: &[&str], output: CommandOutput) {
        lock(&self.state).responses.insert(owned(argv), Ok(output));
    }

    /// Makes `argv` fail to run with `kind`.
    pub fn fail(&self, argv: &[&str], kind: io::ErrorKind) {
        lock(&self.state).responses.insert(owned(argv), Err(kind));
    }

    /// Every argv run or streamed so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        lock(&self.state).calls.clone()
    }

    fn lookup(&self, argv: &[String]) -> io::Result<CommandOutput> {
        let mut state = lock(&self.state);
        state.calls.push(argv.to_vec());
        match state.responses.get(argv) {
            Some(Ok(output)) => Ok(output.clone()),
            Some(Err(kind)) => Err(io::Error::from(*kind)),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no scripted response for {argv:?}"),
            )),
        }
    }
}

fn owned(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}

impl CommandRunner for MockRunner {
    fn output(&self, argv: &[String]) -> io::Result<CommandOutput> {
        self.lookup(argv)
    }

    fn stream(&self, argv: &[String]) -> io::Result<LineStream<'static>> {
        self.lookup(argv).map(stream_output)
    }
}

#[derive(Debug, Default)]
struct PrivilegedState {
    responses: HashMap<ElevatedTarget, CommandOutput>,
    calls: Vec<ElevatedTarget>,
}

/// `PrivilegedReader` that answers only for granted targets.
///
/// Anything else fails with `NotFound`, like a device without `su`.
#[derive(Debug, Clone, Default)]
pub struct MockPrivileged {
    state: Arc<Mutex<PrivilegedState>>,
}

impl MockPrivileged {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, target: ElevatedTarget, output: CommandOutput) {
        lock(&self.state).responses.insert(target, output);
    }

    /// Grants an elevated `cat` of `path`.
    pub fn allow_file(&self, path: impl Into<PathBuf>, content: &str) {
        self.respond(
            ElevatedTarget::File(path.into()),
            CommandOutput::success(content),
        );
    }

    pub fn calls(&self) -> Vec<ElevatedTarget> {
        lock(&self.state).calls.clone()
    }

    fn lookup(&self, target: &ElevatedTarget) -> Result<CommandOutput, AttemptError> {
        target.shell_line()?;
        let mut state = lock(&self.state);
        state.calls.push(target.clone());
        state
            .responses
            .get(target)
            .cloned()
            .ok_or(AttemptError::NotFound)
    }
}

impl PrivilegedReader for MockPrivileged {
    fn read(&self, target: &ElevatedTarget) -> Result<CommandOutput, AttemptError> {
        self.lookup(target)
    }

    fn stream(&self, target: &ElevatedTarget) -> Result<LineStream<'static>, AttemptError> {
        self.lookup(target).map(stream_output)
    }

    fn describe(&self, target: &ElevatedTarget) -> String {
        match target.shell_line() {
            Ok(line) => format!("su -c {line}"),
            Err(_) => "su -c <rejected>".to_string(),
        }
    }
}

/// `SystemCalls` with fixed answers. Unset calls fail with `Unsupported`.
#[derive(Debug, Clone, Default)]
pub struct MockSyscalls {
    boot_clock: Option<Duration>,
    load_average: Option<[f64; 3]>,
    uname: Option<UnameInfo>,
}

impl MockSyscalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boot_clock(mut self, up: Duration) -> Self {
        self.boot_clock = Some(up);
        self
    }

    pub fn with_load_average(mut self, loads: [f64; 3]) -> Self {
        self.load_average = Some(loads);
        self
    }

    pub fn with_uname(mut self, uname: UnameInfo) -> Self {
        self.uname = Some(uname);
        self
    }

    /// A typical arm64 Android kernel.
    pub fn android() -> Self {
        Self::new()
            .with_boot_clock(Duration::from_millis(93_784_500))
            .with_load_average([1.25, 0.98, 0.75])
            .with_uname(UnameInfo {
                sysname: "Linux".to_string(),
                release: "5.10.198-android13-4-gd4a3b1a2c3f4".to_string(),
                version: "#1 SMP PREEMPT Mon Jan 8 12:00:00 UTC 2024".to_string(),
                machine: "aarch64".to_string(),
            })
    }
}

fn unsupported<T>(value: Option<T>) -> io::Result<T> {
    value.ok_or_else(|| io::ErrorKind::Unsupported.into())
}

impl SystemCalls for MockSyscalls {
    fn boot_clock(&self) -> io::Result<Duration> {
        unsupported(self.boot_clock)
    }

    fn load_average(&self) -> io::Result<[f64; 3]> {
        unsupported(self.load_average)
    }

    fn uname(&self) -> io::Result<UnameInfo> {
        unsupported(self.uname.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::privileged::ReadOnlyCommand;

    #[test]
    fn test_mock_runner_scripted_and_missing() {
        let runner = MockRunner::new();
        runner.respond(&["getenforce"], CommandOutput::success("Enforcing\n"));
        runner.fail(&["getprop", "ro.secure"], io::ErrorKind::PermissionDenied);

        let out = runner.output(&owned(&["getenforce"])).unwrap();
        assert_eq!(out.stdout_lossy(), "Enforcing\n");
        let err = runner.output(&owned(&["getprop", "ro.secure"])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        let err = runner.output(&owned(&["dmesg"])).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn test_mock_runner_stream_ends_with_exit_error() {
        let runner = MockRunner::new();
        runner.respond(
            &["dmesg"],
            CommandOutput {
                stdout: b"partial\n".to_vec(),
                code: Some(1),
            },
        );
        let items: Vec<io::Result<String>> = runner.stream(&owned(&["dmesg"])).unwrap().collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial");
        assert!(items[1].is_err());
    }

    #[test]
    fn test_mock_privileged_rejects_before_logging() {
        let privileged = MockPrivileged::new();
        let bad = ElevatedTarget::File(PathBuf::from("/proc/x;reboot"));
        assert!(matches!(
            privileged.read(&bad),
            Err(AttemptError::RejectedTarget { .. })
        ));
        assert!(privileged.calls().is_empty());

        let dmesg = ElevatedTarget::Command(ReadOnlyCommand::dmesg());
        assert_eq!(privileged.read(&dmesg), Err(AttemptError::NotFound));
        assert_eq!(privileged.describe(&dmesg), "su -c dmesg");
    }

    #[test]
    fn test_mock_syscalls_unset_is_unsupported() {
        let sys = MockSyscalls::new().with_load_average([1.0, 2.0, 3.0]);
        assert_eq!(sys.load_average().unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(
            sys.boot_clock().unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
    }
}
