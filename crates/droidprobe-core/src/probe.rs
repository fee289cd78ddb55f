//! Probes: one resolver + parser pairing per report section.

use std::num::NonZeroUsize;
use tracing::debug;

use crate::collector::parsed::Parsed;
use crate::collector::procfs::{
    parse_loadavg, parse_meminfo, parse_mounts, parse_process_status, parse_socket_table,
    parse_uname, parse_uptime,
};
use crate::collector::resolver::{
    AttemptFailure, ProbeOutcome, Provenance, ResourceId, SourceResolver, TailOutcome,
};
use crate::collector::sysfs::parser::parse_first_line;
use crate::collector::sysfs::{ThermalScan, parse_selinux_mode, parse_trace_clock};
use crate::collector::traits::FileSystem;
use crate::error::AttemptError;
use crate::report::{
    PropertyValue, Protocol, Record, SectionData, SectionOutcome, TraceSetting, TracefsInfo,
    TracefsRoot,
};

/// Properties shown by the `props` probe, with display labels.
pub const PROPERTY_KEYS: &[(&str, &str)] = &[
    ("ro.product.model", "Model"),
    ("ro.product.manufacturer", "Manufacturer"),
    ("ro.product.device", "Device"),
    ("ro.build.version.release", "Android version"),
    ("ro.build.version.sdk", "SDK level"),
    ("ro.build.fingerprint", "Build fingerprint"),
];

/// Tracefs mount points, preferred first.
const TRACEFS_ROOTS: &[&str] = &["kernel/tracing", "kernel/debug/tracing"];

/// A single report section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Uname,
    Uptime,
    MemInfo,
    LoadAvg,
    /// `all: false` keeps only root and the well-known Android partitions.
    Mounts { all: bool },
    Sockets { protocol: Protocol, limit: usize },
    /// Up to `limit` readable processes in ascending pid order.
    Processes { limit: usize },
    Thermal,
    KernelLog { lines: NonZeroUsize },
    Selinux,
    Properties,
    Tracefs,
}

impl Probe {
    /// Default section name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uname => "kernel",
            Self::Uptime => "uptime",
            Self::MemInfo => "memory",
            Self::LoadAvg => "loadavg",
            Self::Mounts { .. } => "mounts",
            Self::Sockets {
                protocol: Protocol::Tcp,
                ..
            } => "tcp",
            Self::Sockets {
                protocol: Protocol::Udp,
                ..
            } => "udp",
            Self::Processes { .. } => "processes",
            Self::Thermal => "thermal",
            Self::KernelLog { .. } => "kernel-log",
            Self::Selinux => "selinux",
            Self::Properties => "properties",
            Self::Tracefs => "tracefs",
        }
    }

    /// Runs the probe. Never panics on unavailable or malformed sources.
    pub fn collect<F: FileSystem>(&self, resolver: &SourceResolver<F>) -> SectionOutcome {
        match self {
            Self::Uname => one_shot(resolver, ResourceId::Uname, parse_uname, Record::Uname),
            Self::Uptime => one_shot(resolver, ResourceId::Uptime, parse_uptime, Record::Uptime),
            Self::MemInfo => one_shot(resolver, ResourceId::MemInfo, parse_meminfo, Record::MemInfo),
            Self::LoadAvg => one_shot(resolver, ResourceId::LoadAvg, parse_loadavg, Record::LoadAvg),
            Self::Mounts { all } => one_shot(resolver, ResourceId::Mounts, parse_mounts, |entries| {
                let total = entries.len();
                let entries = if *all {
                    entries
                } else {
                    entries.into_iter().filter(|e| e.is_interesting()).collect()
                };
                Record::Mounts {
                    entries,
                    total,
                    filtered: !*all,
                }
            }),
            Self::Sockets { protocol, limit } => {
                let id = match protocol {
                    Protocol::Tcp => ResourceId::TcpSockets,
                    Protocol::Udp => ResourceId::UdpSockets,
                };
                one_shot(resolver, id, parse_socket_table, |mut entries| {
                    let total = entries.len();
                    entries.truncate(*limit);
                    Record::Sockets {
                        protocol: *protocol,
                        entries,
                        total,
                    }
                })
            }
            Self::Processes { limit } => collect_processes(resolver, *limit),
            Self::Thermal => collect_thermal(resolver),
            Self::KernelLog { lines } => collect_kernel_log(resolver, *lines),
            Self::Selinux => one_shot(
                resolver,
                ResourceId::SelinuxMode,
                |raw| Parsed::new(parse_selinux_mode(raw), Vec::new()),
                Record::Selinux,
            ),
            Self::Properties => collect_properties(resolver),
            Self::Tracefs => collect_tracefs(resolver),
        }
    }
}

/// Resolves `id`, accepting only output `parse` can make a record of.
fn one_shot<F, T>(
    resolver: &SourceResolver<F>,
    id: ResourceId,
    parse: impl Fn(&str) -> Parsed<T>,
    wrap: impl FnOnce(T) -> Record,
) -> SectionOutcome
where
    F: FileSystem,
{
    let acquired = match resolver.resolve_with(&id, |raw| parse(raw).is_usable()) {
        ProbeOutcome::Success(acquired) => acquired,
        ProbeOutcome::Unavailable(attempts) => return SectionOutcome::Failed { attempts },
    };
    let parsed = parse(&acquired.raw);
    let Some(record) = parsed.record else {
        return SectionOutcome::Failed {
            attempts: vec![AttemptFailure {
                strategy: acquired.source,
                provenance: acquired.provenance,
                error: AttemptError::Unparseable,
            }],
        };
    };
    if !parsed.skipped.is_empty() {
        debug!(resource = %id, skipped = parsed.skipped.len(), "skipped malformed lines");
    }
    SectionOutcome::Ok(SectionData::from_acquired(wrap(record), acquired).with_skipped(parsed.skipped))
}

fn direct_failure(strategy: impl Into<String>, error: AttemptError) -> AttemptFailure {
    AttemptFailure {
        strategy: strategy.into(),
        provenance: Provenance::Direct,
        error,
    }
}

fn collect_processes<F: FileSystem>(resolver: &SourceResolver<F>, limit: usize) -> SectionOutcome {
    let proc_root = &resolver.config().proc_root;
    let entries = match resolver.fs().read_dir(proc_root) {
        Ok(entries) => entries,
        Err(e) => {
            return SectionOutcome::Failed {
                attempts: vec![direct_failure(proc_root.display().to_string(), e.into())],
            };
        }
    };

    let mut pids: Vec<u32> = entries
        .iter()
        .filter_map(|p| p.file_name()?.to_str()?.parse().ok())
        .collect();
    pids.sort_unstable();

    let mut processes = Vec::new();
    let mut provenance = Provenance::Direct;
    let mut unreadable = 0usize;
    let mut scanned = 0usize;
    for pid in pids {
        if processes.len() >= limit {
            break;
        }
        scanned += 1;
        let id = ResourceId::ProcessStatus { pid };
        match resolver.resolve_with(&id, |raw| parse_process_status(raw).is_usable()) {
            ProbeOutcome::Success(acquired) => {
                if let Some(mut status) = parse_process_status(&acquired.raw).record {
                    status.pid.get_or_insert(pid);
                    provenance = provenance.combine(acquired.provenance);
                    processes.push(status);
                }
            }
            ProbeOutcome::Unavailable(_) => unreadable += 1,
        }
    }

    if processes.is_empty() {
        let pattern = proc_root.join("*/status").display().to_string();
        return SectionOutcome::Failed {
            attempts: vec![direct_failure(pattern, AttemptError::NoEntries { scanned })],
        };
    }

    let source = proc_root.join("<pid>/status").display().to_string();
    let data = SectionData::new(Record::Processes(processes), provenance, false, source);
    if unreadable > 0 {
        SectionOutcome::Ok(data.with_note(format!("{unreadable} processes not readable")))
    } else {
        SectionOutcome::Ok(data)
    }
}

fn collect_thermal<F: FileSystem>(resolver: &SourceResolver<F>) -> SectionOutcome {
    let mut scan = ThermalScan::new(resolver);
    let mut readings = Vec::new();
    let mut unreadable = Vec::new();
    for item in scan.by_ref() {
        match item {
            Ok(reading) => readings.push(reading),
            Err(zone) => unreadable.push(zone),
        }
    }

    if readings.is_empty() {
        let mut attempts: Vec<AttemptFailure> = unreadable
            .into_iter()
            .chain(scan.blocked().cloned())
            .flat_map(|z| z.attempts)
            .collect();
        if attempts.is_empty() {
            let pattern = resolver.config().sys_path("class/thermal/thermal_zone*");
            attempts.push(direct_failure(
                pattern.display().to_string(),
                AttemptError::NoEntries {
                    scanned: scan.scanned() as usize,
                },
            ));
        }
        return SectionOutcome::Failed { attempts };
    }

    let provenance = readings
        .iter()
        .fold(Provenance::Direct, |p, r| p.combine(r.provenance));
    let elevated_via: Vec<String> = readings
        .iter()
        .flat_map(|r| r.elevated_via.iter().cloned())
        .collect();
    let source = resolver
        .config()
        .sys_path("class/thermal")
        .display()
        .to_string();
    let mut data = SectionData::new(Record::Thermal(readings), provenance, false, source)
        .with_elevated_via(elevated_via);
    for zone in unreadable {
        let reason = zone
            .attempts
            .first()
            .map_or_else(|| "unreadable".to_string(), |a| a.error.to_string());
        data = data.with_note(format!("thermal_zone{}: temperature unreadable ({reason})", zone.index));
    }
    SectionOutcome::Ok(data)
}

fn collect_kernel_log<F: FileSystem>(
    resolver: &SourceResolver<F>,
    lines: NonZeroUsize,
) -> SectionOutcome {
    match resolver.resolve_tail(&ResourceId::KernelLog, lines) {
        TailOutcome::Lines {
            window,
            provenance,
            source,
        } => {
            let seen = window.seen();
            let record = Record::KernelLog {
                lines: window.into_lines(),
                seen,
            };
            SectionOutcome::Ok(SectionData::new(record, provenance, false, source))
        }
        TailOutcome::Empty { attempts } => SectionOutcome::Empty { attempts },
        TailOutcome::Unavailable { attempts } => SectionOutcome::Failed { attempts },
    }
}

fn collect_properties<F: FileSystem>(resolver: &SourceResolver<F>) -> SectionOutcome {
    let mut values = Vec::with_capacity(PROPERTY_KEYS.len());
    let mut attempts = Vec::new();
    let mut provenance = Provenance::Direct;

    for &(key, label) in PROPERTY_KEYS {
        let id = ResourceId::Property {
            key: key.to_string(),
        };
        let value = match resolver.resolve_with(&id, |raw| parse_first_line(raw).is_some()) {
            ProbeOutcome::Success(acquired) => {
                provenance = provenance.combine(acquired.provenance);
                parse_first_line(&acquired.raw)
            }
            ProbeOutcome::Unavailable(failed) => {
                attempts.extend(failed);
                None
            }
        };
        values.push(PropertyValue {
            key: key.to_string(),
            label,
            value,
        });
    }

    if values.iter().all(|v| v.value.is_none()) {
        return SectionOutcome::Failed { attempts };
    }
    SectionOutcome::Ok(SectionData::new(
        Record::Properties(values),
        provenance,
        false,
        "getprop".to_string(),
    ))
}

fn collect_tracefs<F: FileSystem>(resolver: &SourceResolver<F>) -> SectionOutcome {
    let fs = resolver.fs();
    let mut roots = Vec::with_capacity(TRACEFS_ROOTS.len());
    let mut provenance = Provenance::Direct;
    let mut elevated_via = Vec::new();

    for rel in TRACEFS_ROOTS {
        let path = resolver.config().sys_path(rel);
        if !fs.exists(&path) {
            roots.push(TracefsRoot::absent(path));
            continue;
        }

        let mut read = |name: &str, parse: fn(&str) -> Option<String>| {
            let id = ResourceId::TraceFile {
                root: path.clone(),
                name: name.to_string(),
            };
            let ProbeOutcome::Success(acquired) =
                resolver.resolve_with(&id, |raw| parse(raw).is_some())
            else {
                return None;
            };
            provenance = provenance.combine(acquired.provenance);
            if acquired.provenance == Provenance::Elevated {
                elevated_via.push(acquired.source.clone());
            }
            Some(TraceSetting {
                value: parse(&acquired.raw)?,
                provenance: acquired.provenance,
            })
        };
        let current_tracer = read("current_tracer", parse_first_line);
        let trace_clock = read("trace_clock", parse_trace_clock);

        let looks_like_tracefs =
            fs.exists(&path.join("current_tracer")) && fs.exists(&path.join("available_tracers"));
        roots.push(TracefsRoot {
            path,
            present: true,
            looks_like_tracefs,
            current_tracer,
            trace_clock,
        });
    }

    let present: Vec<String> = roots
        .iter()
        .filter(|r| r.present)
        .map(|r| r.path.display().to_string())
        .collect();
    if present.is_empty() {
        let attempts = roots
            .iter()
            .map(|r| direct_failure(r.path.display().to_string(), AttemptError::NotFound))
            .collect();
        return SectionOutcome::Failed { attempts };
    }

    let info = TracefsInfo { roots };
    SectionOutcome::Ok(
        SectionData::new(Record::Tracefs(info), provenance, false, present.join(", "))
            .with_elevated_via(elevated_via),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockFs, MockPrivileged, MockRunner, MockSyscalls};
    use crate::collector::traits::CommandOutput;
    use crate::config::ProbeConfig;
    use std::time::Duration;

    fn resolver(fs: MockFs) -> SourceResolver<MockFs> {
        SourceResolver::new(fs, ProbeConfig::default())
            .with_runner(MockRunner::new())
            .with_privileged(MockPrivileged::new())
            .with_syscalls(MockSyscalls::android())
    }

    fn data(outcome: SectionOutcome) -> SectionData {
        match outcome {
            SectionOutcome::Ok(data) => data,
            other => panic!("expected usable section, got {other:?}"),
        }
    }

    #[test]
    fn test_uptime_direct() {
        let d = data(Probe::Uptime.collect(&resolver(MockFs::typical_android())));
        assert_eq!(d.provenance, Provenance::Direct);
        assert!(!d.degraded);
        let Record::Uptime(up) = d.record else { panic!() };
        assert_eq!(up.uptime_seconds, 93784.5);
    }

    #[test]
    fn test_loadavg_syscall_fallback_is_degraded() {
        let d = data(Probe::LoadAvg.collect(&resolver(MockFs::locked_down())));
        assert_eq!(d.provenance, Provenance::SyscallFallback);
        assert!(d.approximate);
        assert!(d.degraded);
        let Record::LoadAvg(load) = d.record else { panic!() };
        assert_eq!(load.load1, 1.25);
        assert_eq!(load.running, None);
    }

    #[test]
    fn test_garbage_direct_source_falls_through() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/uptime", "garbage\n");
        let r = SourceResolver::new(fs, ProbeConfig::default())
            .with_runner(MockRunner::new())
            .with_privileged(MockPrivileged::new())
            .with_syscalls(MockSyscalls::new().with_boot_clock(Duration::from_secs(42)));

        let d = data(Probe::Uptime.collect(&r));
        assert_eq!(d.provenance, Provenance::SyscallFallback);
        let Record::Uptime(up) = d.record else { panic!() };
        assert_eq!(up.uptime_seconds, 42.0);
        assert_eq!(up.idle_seconds, None);
    }

    #[test]
    fn test_meminfo_keeps_skipped_lines() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/meminfo", "MemTotal: 1000 kB\nBogus line\nMemFree: 200 kB\n");
        let d = data(Probe::MemInfo.collect(&resolver(fs)));
        assert_eq!(d.skipped.len(), 1);
        let Record::MemInfo(info) = d.record else { panic!() };
        assert_eq!(info.get("MemTotal"), Some(1000));
    }

    #[test]
    fn test_mounts_filter_and_fallback_view() {
        let r = resolver(MockFs::locked_down());
        let d = data(Probe::Mounts { all: false }.collect(&r));
        assert_eq!(d.source, "/proc/self/mounts");
        let Record::Mounts {
            entries,
            total,
            filtered,
        } = d.record
        else {
            panic!()
        };
        assert_eq!(total, 11);
        assert!(filtered);
        assert!(entries.iter().all(|e| e.is_interesting()));
        assert_eq!(entries.len(), 7);

        let d = data(Probe::Mounts { all: true }.collect(&r));
        let Record::Mounts { entries, .. } = d.record else { panic!() };
        assert_eq!(entries.len(), 11);
    }

    #[test]
    fn test_sockets_limit_and_skips() {
        let r = resolver(MockFs::typical_android());
        let probe = Probe::Sockets {
            protocol: Protocol::Tcp,
            limit: 2,
        };
        let d = data(probe.collect(&r));
        assert_eq!(d.skipped.len(), 1);
        let Record::Sockets { entries, total, .. } = d.record else { panic!() };
        assert_eq!(total, 3);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].state.as_str(), "LISTEN");
    }

    #[test]
    fn test_sockets_blocked_reports_attempts() {
        let r = resolver(MockFs::locked_down());
        let outcome = Probe::Sockets {
            protocol: Protocol::Udp,
            limit: 20,
        }
        .collect(&r);
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].error, AttemptError::PermissionDenied);
        assert_eq!(attempts[1].provenance, Provenance::Elevated);
    }

    #[test]
    fn test_processes_ascending_and_limited() {
        let r = resolver(MockFs::typical_android());
        let d = data(Probe::Processes { limit: 3 }.collect(&r));
        let Record::Processes(ps) = d.record else { panic!() };
        let pids: Vec<_> = ps.iter().map(|p| p.pid).collect();
        assert_eq!(pids, vec![Some(1), Some(2), Some(612)]);
        assert_eq!(ps[2].threads, Some(27));
    }

    #[test]
    fn test_processes_skip_unreadable() {
        let r = resolver(MockFs::locked_down());
        let d = data(Probe::Processes { limit: 30 }.collect(&r));
        let Record::Processes(ps) = &d.record else { panic!() };
        assert_eq!(ps.len(), 1);
        assert_eq!(ps[0].name.as_deref(), Some("com.example.app"));
        assert_eq!(d.notes, vec!["2 processes not readable"]);
    }

    #[test]
    fn test_processes_none_readable() {
        let mut fs = MockFs::new();
        fs.add_dir("/proc/1");
        fs.deny("/proc/1/status");
        let outcome = Probe::Processes { limit: 5 }.collect(&resolver(fs));
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts[0].error, AttemptError::NoEntries { scanned: 1 });
    }

    #[test]
    fn test_thermal_with_unreadable_zone() {
        let d = data(Probe::Thermal.collect(&resolver(MockFs::locked_down())));
        let Record::Thermal(zones) = &d.record else { panic!() };
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].index, 2);
        assert_eq!(d.notes.len(), 1);
        assert!(d.notes[0].starts_with("thermal_zone1:"));
    }

    #[test]
    fn test_thermal_through_unsearchable_dir() {
        let mut fs = MockFs::new();
        fs.add_thermal_zone(0, "cpu", "45000");
        fs.deny("/sys/class/thermal");
        let privileged = MockPrivileged::new();
        privileged.allow_file("/sys/class/thermal/thermal_zone0/temp", "45000\n");
        let r = resolver(fs).with_privileged(privileged);

        let d = data(Probe::Thermal.collect(&r));
        assert_eq!(d.provenance, Provenance::Elevated);
        assert_eq!(d.elevated_via, vec!["su -c cat /sys/class/thermal/thermal_zone0/temp"]);
        let Record::Thermal(zones) = &d.record else { panic!() };
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].celsius, 45.0);
    }

    #[test]
    fn test_thermal_unsearchable_dir_reports_attempts() {
        let mut fs = MockFs::new();
        fs.add_thermal_zone(0, "cpu", "45000");
        fs.deny("/sys/class/thermal");
        let outcome = Probe::Thermal.collect(&resolver(fs));
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts[0].error, AttemptError::PermissionDenied);
        assert_eq!(attempts[1].provenance, Provenance::Elevated);
    }

    #[test]
    fn test_thermal_no_zones() {
        let outcome = Probe::Thermal.collect(&resolver(MockFs::new()));
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts[0].error, AttemptError::NoEntries { scanned: 0 });
    }

    #[test]
    fn test_kernel_log_tail() {
        let runner = MockRunner::new();
        let log: String = (0..100).map(|i| format!("[{i:>5}.000000] line {i}\n")).collect();
        runner.respond(&["dmesg"], CommandOutput::success(log));
        let r = resolver(MockFs::new()).with_runner(runner);

        let lines = NonZeroUsize::new(3).unwrap();
        let d = data(Probe::KernelLog { lines }.collect(&r));
        let Record::KernelLog { lines, seen } = d.record else { panic!() };
        assert_eq!(seen, 100);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].ends_with("line 99"));
    }

    #[test]
    fn test_kernel_log_empty_is_not_failure() {
        let runner = MockRunner::new();
        runner.respond(&["dmesg"], CommandOutput::success(""));
        let r = resolver(MockFs::new()).with_runner(runner);
        let lines = NonZeroUsize::new(10).unwrap();
        let outcome = Probe::KernelLog { lines }.collect(&r);
        assert!(matches!(outcome, SectionOutcome::Empty { .. }));
        assert!(!outcome.is_usable());
    }

    #[test]
    fn test_selinux_falls_back_to_getenforce() {
        let runner = MockRunner::new();
        runner.respond(&["getenforce"], CommandOutput::success("Enforcing\n"));
        let r = resolver(MockFs::locked_down()).with_runner(runner);
        let d = data(Probe::Selinux.collect(&r));
        assert_eq!(d.record, Record::Selinux(crate::collector::sysfs::SelinuxMode::Enforcing));
        assert_eq!(d.source, "getenforce");
    }

    #[test]
    fn test_properties_partial() {
        let runner = MockRunner::new();
        runner.respond(&["getprop", "ro.product.model"], CommandOutput::success("Pixel 7\n"));
        runner.respond(&["getprop", "ro.build.version.sdk"], CommandOutput::success("34\n"));
        runner.respond(&["getprop", "ro.product.device"], CommandOutput::success("\n"));
        let r = resolver(MockFs::new()).with_runner(runner);

        let d = data(Probe::Properties.collect(&r));
        assert!(d.degraded);
        let Record::Properties(props) = d.record else { panic!() };
        assert_eq!(props.len(), PROPERTY_KEYS.len());
        assert_eq!(props[0].value.as_deref(), Some("Pixel 7"));
        assert_eq!(props[2].value, None);
        assert_eq!(props[4].value.as_deref(), Some("34"));
    }

    #[test]
    fn test_properties_none_available() {
        let outcome = Probe::Properties.collect(&resolver(MockFs::new()));
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts.len(), PROPERTY_KEYS.len());
    }

    fn setting(value: &str, provenance: Provenance) -> Option<TraceSetting> {
        Some(TraceSetting {
            value: value.to_string(),
            provenance,
        })
    }

    #[test]
    fn test_tracefs_present() {
        let d = data(Probe::Tracefs.collect(&resolver(MockFs::typical_android())));
        assert!(!d.degraded);
        assert_eq!(d.source, "/sys/kernel/tracing");
        let Record::Tracefs(info) = d.record else { panic!() };
        assert_eq!(info.roots.len(), 2);
        let root = &info.roots[0];
        assert_eq!(root.path, std::path::PathBuf::from("/sys/kernel/tracing"));
        assert!(root.present);
        assert!(root.looks_like_tracefs);
        assert_eq!(root.current_tracer, setting("nop", Provenance::Direct));
        assert_eq!(root.trace_clock, setting("boot", Provenance::Direct));
        assert!(!info.roots[1].present);
    }

    #[test]
    fn test_tracefs_reports_both_roots_with_own_provenance() {
        let mut fs = MockFs::typical_android();
        fs.deny("/sys/kernel/tracing/trace_clock");
        fs.add_file("/sys/kernel/debug/tracing/current_tracer", "function\n");
        let privileged = MockPrivileged::new();
        privileged.allow_file("/sys/kernel/tracing/trace_clock", "local [boot]\n");
        let r = resolver(fs).with_privileged(privileged);

        let d = data(Probe::Tracefs.collect(&r));
        assert_eq!(d.provenance, Provenance::Elevated);
        assert_eq!(d.source, "/sys/kernel/tracing, /sys/kernel/debug/tracing");
        assert_eq!(d.elevated_via, vec!["su -c cat /sys/kernel/tracing/trace_clock"]);
        let Record::Tracefs(info) = d.record else { panic!() };

        let tracing = &info.roots[0];
        assert_eq!(tracing.current_tracer, setting("nop", Provenance::Direct));
        assert_eq!(tracing.trace_clock, setting("boot", Provenance::Elevated));

        let debug = &info.roots[1];
        assert!(debug.present);
        assert!(!debug.looks_like_tracefs);
        assert_eq!(debug.current_tracer, setting("function", Provenance::Direct));
        assert_eq!(debug.trace_clock, None);
    }

    #[test]
    fn test_tracefs_blocked_and_absent() {
        let d = data(Probe::Tracefs.collect(&resolver(MockFs::locked_down())));
        assert!(d.degraded);
        let Record::Tracefs(info) = d.record else { panic!() };
        assert_eq!(info.roots[0].current_tracer, None);

        let outcome = Probe::Tracefs.collect(&resolver(MockFs::new()));
        let SectionOutcome::Failed { attempts } = outcome else { panic!() };
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[1].strategy, "/sys/kernel/debug/tracing");
    }

    #[test]
    fn test_uname_from_syscall_is_exact() {
        let d = data(Probe::Uname.collect(&resolver(MockFs::new())));
        assert_eq!(d.provenance, Provenance::SyscallFallback);
        assert!(!d.approximate);
        assert!(!d.degraded);
    }
}
