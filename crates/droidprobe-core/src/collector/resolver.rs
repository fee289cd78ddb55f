//! Tiered source resolution.
//!
//! A logical resource (uptime, the mount table, one thermal zone...) can be
//! blocked by access control on some devices. [`SourceResolver`] walks the
//! resource's ordered strategy chain and returns the first output that is
//! non-empty and acceptable to the caller, tagged with where it came from.
//! When nothing works, every attempt's failure is returned, not just the
//! last one.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collector::lines::LineStream;
use crate::collector::privileged::{ElevatedTarget, PrivilegedReader, ReadOnlyCommand, SuReader};
use crate::collector::strategies::default_chain;
use crate::collector::syscall::{self, NixSyscalls, SyscallFn, SystemCalls};
use crate::collector::tail::{TailWindow, tail_fallible};
use crate::collector::traits::{CommandOutput, CommandRunner, FileSystem, SystemRunner};
use crate::config::ProbeConfig;
use crate::error::AttemptError;

/// Which file of a thermal zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneAttr {
    Type,
    Temp,
}

impl ZoneAttr {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Temp => "temp",
        }
    }
}

/// A logical metric, independent of how it is acquired.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum ResourceId {
    Uptime,
    MemInfo,
    LoadAvg,
    Mounts,
    TcpSockets,
    UdpSockets,
    ProcessStatus { pid: u32 },
    ThermalZone { index: u32, attr: ZoneAttr },
    KernelLog,
    SelinuxMode,
    Property { key: String },
    Uname,
    TraceFile { root: PathBuf, name: String },
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uptime => f.write_str("uptime"),
            Self::MemInfo => f.write_str("meminfo"),
            Self::LoadAvg => f.write_str("loadavg"),
            Self::Mounts => f.write_str("mount-table"),
            Self::TcpSockets => f.write_str("tcp-sockets"),
            Self::UdpSockets => f.write_str("udp-sockets"),
            Self::ProcessStatus { pid } => write!(f, "process-status:{pid}"),
            Self::ThermalZone { index, attr } => {
                write!(f, "thermal-zone:{index}/{}", attr.file_name())
            }
            Self::KernelLog => f.write_str("kernel-log"),
            Self::SelinuxMode => f.write_str("selinux-mode"),
            Self::Property { key } => write!(f, "property:{key}"),
            Self::Uname => f.write_str("uname"),
            Self::TraceFile { root, name } => write!(f, "tracefs:{}/{name}", root.display()),
        }
    }
}

/// One way of acquiring a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStrategy {
    /// Read a file with the caller's own privileges.
    DirectRead(PathBuf),
    /// Run an unprivileged read-only program.
    Command(ReadOnlyCommand),
    /// Read through the [`PrivilegedReader`].
    ElevatedRead(ElevatedTarget),
    /// Ask the kernel directly; possibly an approximation.
    SyscallFallback(SyscallFn),
}

impl SourceStrategy {
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::DirectRead(_) | Self::Command(_) => Provenance::Direct,
            Self::ElevatedRead(_) => Provenance::Elevated,
            Self::SyscallFallback(_) => Provenance::SyscallFallback,
        }
    }

    pub fn is_approximation(&self) -> bool {
        matches!(self, Self::SyscallFallback(f) if f.is_approximation())
    }
}

/// Where a result came from, ordered by decreasing fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Direct,
    Elevated,
    SyscallFallback,
}

impl Provenance {
    /// Provenance of a value assembled from several reads: the least
    /// direct one.
    pub fn combine(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Output accepted from a strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Acquired {
    #[serde(skip)]
    pub raw: String,
    pub provenance: Provenance,
    /// Set when the strategy is a lower-fidelity stand-in.
    pub approximate: bool,
    /// Path, command line or call that produced the output.
    pub source: String,
}

/// A strategy that was tried and did not produce usable output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptFailure {
    pub strategy: String,
    pub provenance: Provenance,
    pub error: AttemptError,
}

impl AttemptFailure {
    fn new(strategy: &SourceStrategy, source: &str, error: AttemptError) -> Self {
        Self {
            strategy: source.to_string(),
            provenance: strategy.provenance(),
            error,
        }
    }
}

/// Result of resolving a one-shot resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Success(Acquired),
    /// Every strategy failed, in the order they were tried.
    Unavailable(Vec<AttemptFailure>),
}

impl ProbeOutcome {
    pub fn success(self) -> Option<Acquired> {
        match self {
            Self::Success(acquired) => Some(acquired),
            Self::Unavailable(_) => None,
        }
    }
}

/// Result of resolving a streamed resource through a tail window.
#[derive(Debug)]
pub enum TailOutcome {
    Lines {
        window: TailWindow,
        provenance: Provenance,
        source: String,
    },
    /// Some source was reachable but produced no lines at all.
    Empty { attempts: Vec<AttemptFailure> },
    /// No source could be read.
    Unavailable { attempts: Vec<AttemptFailure> },
}

/// Resolves resources through ordered strategy chains.
///
/// Commands, privileged reads and syscalls are injected so tests never
/// spawn processes or touch the host.
pub struct SourceResolver<F: FileSystem> {
    fs: F,
    runner: Box<dyn CommandRunner>,
    privileged: Box<dyn PrivilegedReader>,
    syscalls: Box<dyn SystemCalls>,
    config: ProbeConfig,
    overrides: HashMap<ResourceId, Vec<SourceStrategy>>,
}

impl<F: FileSystem> SourceResolver<F> {
    /// Creates a resolver that runs real commands and syscalls.
    pub fn new(fs: F, config: ProbeConfig) -> Self {
        let timeout = config.command_timeout;
        Self {
            fs,
            runner: Box::new(SystemRunner::new(timeout)),
            privileged: Box::new(SuReader::new(
                SystemRunner::new(timeout),
                &config.elevation,
            )),
            syscalls: Box::new(NixSyscalls),
            config,
            overrides: HashMap::new(),
        }
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_privileged(mut self, privileged: impl PrivilegedReader + 'static) -> Self {
        self.privileged = Box::new(privileged);
        self
    }

    pub fn with_syscalls(mut self, syscalls: impl SystemCalls + 'static) -> Self {
        self.syscalls = Box::new(syscalls);
        self
    }

    /// Replaces the strategy chain for one resource.
    pub fn with_chain(mut self, id: ResourceId, chain: Vec<SourceStrategy>) -> Self {
        self.overrides.insert(id, chain);
        self
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// The strategies tried for `id`, in order.
    pub fn chain(&self, id: &ResourceId) -> Vec<SourceStrategy> {
        match self.overrides.get(id) {
            Some(chain) => chain.clone(),
            None => default_chain(id, &self.config),
        }
    }

    /// Resolves `id`, accepting any non-empty output.
    pub fn resolve(&self, id: &ResourceId) -> ProbeOutcome {
        self.resolve_with(id, |_| true)
    }

    /// Resolves `id`, accepting the first non-empty output for which
    /// `accept` returns true.
    ///
    /// Output that `accept` rejects is a soft failure: the next strategy
    /// is tried.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no strategies configured.
    pub fn resolve_with(&self, id: &ResourceId, accept: impl Fn(&str) -> bool) -> ProbeOutcome {
        let chain = self.checked_chain(id);
        let mut attempts = Vec::with_capacity(chain.len());

        for strategy in &chain {
            let source = self.describe(strategy);
            let result = self.attempt(strategy).and_then(|raw| {
                if raw.trim().is_empty() {
                    Err(AttemptError::EmptyOutput)
                } else if !accept(&raw) {
                    Err(AttemptError::Unparseable)
                } else {
                    Ok(raw)
                }
            });

            match result {
                Ok(raw) => {
                    debug!(resource = %id, source = %source, "resolved");
                    return ProbeOutcome::Success(Acquired {
                        raw,
                        provenance: strategy.provenance(),
                        approximate: strategy.is_approximation(),
                        source,
                    });
                }
                Err(error) => {
                    debug!(resource = %id, source = %source, error = %error, "strategy failed");
                    attempts.push(AttemptFailure::new(strategy, &source, error));
                }
            }
        }

        info!(resource = %id, attempts = attempts.len(), "resource unavailable");
        ProbeOutcome::Unavailable(attempts)
    }

    /// Resolves a streamed resource, keeping its last `capacity` lines.
    ///
    /// A strategy that streams at least one line is accepted, even if the
    /// stream fails afterwards. A strategy that is reachable but yields no
    /// lines is recorded and the next one is tried; if none yields lines
    /// the outcome is [`TailOutcome::Empty`] rather than `Unavailable`.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no strategies configured.
    pub fn resolve_tail(&self, id: &ResourceId, capacity: NonZeroUsize) -> TailOutcome {
        let chain = self.checked_chain(id);
        let mut attempts = Vec::with_capacity(chain.len());
        let mut reachable = false;

        for strategy in &chain {
            let source = self.describe(strategy);
            let stream = match self.open_stream(strategy) {
                Ok(stream) => stream,
                Err(error) => {
                    debug!(resource = %id, source = %source, error = %error, "stream failed");
                    attempts.push(AttemptFailure::new(strategy, &source, error));
                    continue;
                }
            };

            let (window, error) = tail_fallible(stream, capacity);
            if !window.is_empty() {
                if let Some(e) = error {
                    warn!(resource = %id, source = %source, error = %e, "stream ended early");
                }
                debug!(resource = %id, source = %source, seen = window.seen(), "tailed");
                return TailOutcome::Lines {
                    window,
                    provenance: strategy.provenance(),
                    source,
                };
            }

            let error = match error {
                Some(e) => AttemptError::from(e),
                None => {
                    reachable = true;
                    AttemptError::EmptyOutput
                }
            };
            attempts.push(AttemptFailure::new(strategy, &source, error));
        }

        if reachable {
            debug!(resource = %id, "source reachable but empty");
            TailOutcome::Empty { attempts }
        } else {
            info!(resource = %id, attempts = attempts.len(), "resource unavailable");
            TailOutcome::Unavailable { attempts }
        }
    }

    fn checked_chain(&self, id: &ResourceId) -> Vec<SourceStrategy> {
        let chain = self.chain(id);
        assert!(
            !chain.is_empty(),
            "no acquisition strategies configured for resource {id}"
        );
        chain
    }

    /// Path, command line or call for diagnostics.
    pub fn describe(&self, strategy: &SourceStrategy) -> String {
        match strategy {
            SourceStrategy::DirectRead(path) => path.display().to_string(),
            SourceStrategy::Command(cmd) => cmd.to_string(),
            SourceStrategy::ElevatedRead(target) => self.privileged.describe(target),
            SourceStrategy::SyscallFallback(f) => f.describe().to_string(),
        }
    }

    fn attempt(&self, strategy: &SourceStrategy) -> Result<String, AttemptError> {
        match strategy {
            SourceStrategy::DirectRead(path) => Ok(self.fs.read_to_string(path)?),
            SourceStrategy::Command(cmd) => {
                let output = self.runner.output(&cmd.argv()?)?;
                command_stdout(output)
            }
            SourceStrategy::ElevatedRead(target) => command_stdout(self.privileged.read(target)?),
            SourceStrategy::SyscallFallback(f) => Ok(syscall::invoke(self.syscalls.as_ref(), *f)?),
        }
    }

    fn open_stream(&self, strategy: &SourceStrategy) -> Result<LineStream<'static>, AttemptError> {
        match strategy {
            SourceStrategy::DirectRead(path) => Ok(self.fs.open_lines(path)?),
            SourceStrategy::Command(cmd) => Ok(self.runner.stream(&cmd.argv()?)?),
            SourceStrategy::ElevatedRead(target) => self.privileged.stream(target),
            SourceStrategy::SyscallFallback(f) => {
                let text = syscall::invoke(self.syscalls.as_ref(), *f)?;
                let lines: Vec<io::Result<String>> = text.lines().map(|l| Ok(l.to_string())).collect();
                Ok(Box::new(lines.into_iter()))
            }
        }
    }
}

fn command_stdout(output: CommandOutput) -> Result<String, AttemptError> {
    if !output.is_success() {
        return Err(AttemptError::CommandFailed { code: output.code });
    }
    Ok(output.stdout_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockPrivileged, MockRunner, MockSyscalls};
    use std::time::Duration;

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn dmesg(program: &str) -> SourceStrategy {
        SourceStrategy::Command(ReadOnlyCommand::Dmesg {
            program: program.to_string(),
        })
    }

    fn resolver(fs: MockFs) -> SourceResolver<MockFs> {
        SourceResolver::new(fs, ProbeConfig::default())
            .with_runner(MockRunner::new())
            .with_privileged(MockPrivileged::new())
            .with_syscalls(MockSyscalls::new())
    }

    #[test]
    fn test_direct_read_wins() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/uptime", "100.00 50.00\n");
        let privileged = MockPrivileged::new();
        let r = resolver(fs).with_privileged(privileged.clone());

        let acquired = r.resolve(&ResourceId::Uptime).success().unwrap();
        assert_eq!(acquired.raw, "100.00 50.00\n");
        assert_eq!(acquired.provenance, Provenance::Direct);
        assert!(!acquired.approximate);
        assert_eq!(acquired.source, "/proc/uptime");
        assert!(privileged.calls().is_empty());
    }

    #[test]
    fn test_stops_at_first_success() {
        let runner = MockRunner::new();
        runner.respond(&["dmesg-a"], CommandOutput::failed(1));
        runner.respond(&["dmesg-b"], CommandOutput::success("hello\n"));
        runner.respond(&["dmesg-c"], CommandOutput::success("unused\n"));

        let r = resolver(MockFs::new())
            .with_runner(runner.clone())
            .with_chain(
                ResourceId::KernelLog,
                vec![dmesg("dmesg-a"), dmesg("dmesg-b"), dmesg("dmesg-c")],
            );

        let acquired = r.resolve(&ResourceId::KernelLog).success().unwrap();
        assert_eq!(acquired.raw, "hello\n");
        assert_eq!(acquired.source, "dmesg-b");
        assert_eq!(
            runner.calls(),
            vec![vec!["dmesg-a".to_string()], vec!["dmesg-b".to_string()]]
        );
    }

    #[test]
    fn test_denied_direct_falls_back_to_elevated() {
        let mut fs = MockFs::new();
        fs.deny("/proc/loadavg");
        let privileged = MockPrivileged::new();
        privileged.allow_file("/proc/loadavg", "0.50 0.40 0.30 2/900 4242\n");
        let r = resolver(fs).with_privileged(privileged.clone());

        let acquired = r.resolve(&ResourceId::LoadAvg).success().unwrap();
        assert_eq!(acquired.provenance, Provenance::Elevated);
        assert_eq!(acquired.source, "su -c cat /proc/loadavg");
        assert_eq!(privileged.calls().len(), 1);
    }

    #[test]
    fn test_syscall_fallback_is_approximate() {
        let mut fs = MockFs::new();
        fs.deny("/proc/uptime");
        let r = resolver(fs)
            .with_syscalls(MockSyscalls::new().with_boot_clock(Duration::from_secs(3600)));

        let acquired = r.resolve(&ResourceId::Uptime).success().unwrap();
        assert_eq!(acquired.provenance, Provenance::SyscallFallback);
        assert!(acquired.approximate);
        assert_eq!(acquired.raw, "3600.00\n");
    }

    #[test]
    fn test_unavailable_keeps_every_failure_in_order() {
        let mut fs = MockFs::new();
        fs.deny("/proc/uptime");
        let r = resolver(fs);

        let ProbeOutcome::Unavailable(attempts) = r.resolve(&ResourceId::Uptime) else {
            panic!("expected unavailable");
        };
        let errors: Vec<_> = attempts.iter().map(|a| a.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                AttemptError::PermissionDenied,
                AttemptError::NotFound,
                AttemptError::Unsupported,
            ]
        );
        assert_eq!(attempts[1].provenance, Provenance::Elevated);
        assert_eq!(attempts[2].strategy, "clock_gettime(CLOCK_BOOTTIME)");
    }

    #[test]
    fn test_empty_and_rejected_output_are_soft_failures() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "   \n");
        let privileged = MockPrivileged::new();
        privileged.allow_file("/proc/meminfo", "not meminfo at all");
        let r = resolver(fs).with_privileged(privileged);

        let outcome = r.resolve_with(&ResourceId::MemInfo, |raw| raw.contains("MemTotal"));
        let ProbeOutcome::Unavailable(attempts) = outcome else {
            panic!("expected unavailable");
        };
        assert_eq!(attempts[0].error, AttemptError::EmptyOutput);
        assert_eq!(attempts[1].error, AttemptError::Unparseable);
    }

    #[test]
    fn test_elevation_disabled_skips_privileged_reader() {
        let mut fs = MockFs::new();
        fs.deny("/proc/meminfo");
        let privileged = MockPrivileged::new();
        let mut config = ProbeConfig::default();
        config.elevation.enabled = false;
        let r = SourceResolver::new(fs, config)
            .with_runner(MockRunner::new())
            .with_privileged(privileged.clone())
            .with_syscalls(MockSyscalls::new());

        assert!(matches!(
            r.resolve(&ResourceId::MemInfo),
            ProbeOutcome::Unavailable(ref a) if a.len() == 1
        ));
        assert!(privileged.calls().is_empty());
    }

    #[test]
    #[should_panic(expected = "no acquisition strategies")]
    fn test_empty_chain_is_a_programming_error() {
        let r = resolver(MockFs::new()).with_chain(ResourceId::Uptime, Vec::new());
        let _ = r.resolve(&ResourceId::Uptime);
    }

    #[test]
    fn test_tail_takes_last_lines() {
        let runner = MockRunner::new();
        runner.respond(&["dmesg"], CommandOutput::success("a\nb\nc\nd\n"));
        let r = resolver(MockFs::new()).with_runner(runner);

        let TailOutcome::Lines {
            window,
            provenance,
            source,
        } = r.resolve_tail(&ResourceId::KernelLog, cap(2))
        else {
            panic!("expected lines");
        };
        assert_eq!(window.into_lines(), vec!["c", "d"]);
        assert_eq!(provenance, Provenance::Direct);
        assert_eq!(source, "dmesg");
    }

    #[test]
    fn test_tail_failed_command_falls_through_to_elevated() {
        let runner = MockRunner::new();
        runner.respond(&["dmesg"], CommandOutput::failed(1));
        let privileged = MockPrivileged::new();
        privileged.respond(
            ElevatedTarget::Command(ReadOnlyCommand::dmesg()),
            CommandOutput::success("[    0.000000] Booting Linux\n"),
        );
        let r = resolver(MockFs::new())
            .with_runner(runner)
            .with_privileged(privileged);

        let TailOutcome::Lines { provenance, .. } = r.resolve_tail(&ResourceId::KernelLog, cap(5))
        else {
            panic!("expected lines");
        };
        assert_eq!(provenance, Provenance::Elevated);
    }

    #[test]
    fn test_tail_empty_is_distinct_from_unavailable() {
        let runner = MockRunner::new();
        runner.respond(&["dmesg"], CommandOutput::success(""));
        let r = resolver(MockFs::new()).with_runner(runner);
        let TailOutcome::Empty { attempts } = r.resolve_tail(&ResourceId::KernelLog, cap(5)) else {
            panic!("expected empty");
        };
        assert_eq!(attempts[0].error, AttemptError::EmptyOutput);

        let r = resolver(MockFs::new());
        assert!(matches!(
            r.resolve_tail(&ResourceId::KernelLog, cap(5)),
            TailOutcome::Unavailable { .. }
        ));
    }

    #[test]
    fn test_resource_id_display() {
        assert_eq!(ResourceId::Mounts.to_string(), "mount-table");
        assert_eq!(
            ResourceId::ProcessStatus { pid: 42 }.to_string(),
            "process-status:42"
        );
        let zone = ResourceId::ThermalZone {
            index: 3,
            attr: ZoneAttr::Temp,
        };
        assert_eq!(zone.to_string(), "thermal-zone:3/temp");
    }

    #[test]
    fn test_provenance_combine() {
        assert_eq!(
            Provenance::Direct.combine(Provenance::Elevated),
            Provenance::Elevated
        );
        assert_eq!(
            Provenance::SyscallFallback.combine(Provenance::Direct),
            Provenance::SyscallFallback
        );
    }
}
