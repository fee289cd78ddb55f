//! Plain-text rendering of a [`Report`].
//!
//! Every section gets a header and a rule. Usable sections are followed by
//! notes when the value came through elevation, is approximate, or has
//! unknown fields. Failed sections list each attempt and, when it helps,
//! a hint on how to get further.

use std::fmt::{self, Display, Formatter};

use crate::collector::procfs::MemInfo;
use crate::collector::resolver::{AttemptFailure, Provenance};
use crate::error::AttemptError;
use crate::fmt::{format_kb, format_uptime, or_unknown, truncate};
use crate::report::{Record, Report, Section, SectionData, SectionOutcome, TraceSetting};

/// Meminfo fields shown, in order.
const MEMINFO_FIELDS: &[&str] = &[
    "MemTotal",
    "MemFree",
    "MemAvailable",
    "Buffers",
    "Cached",
    "SwapTotal",
    "SwapFree",
];

/// Displays a report as text.
pub struct TextReport<'a> {
    report: &'a Report,
    /// Command line suggested in elevation hints.
    hint_command: Option<String>,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self {
            report,
            hint_command: None,
        }
    }

    /// Sets the command suggested when a section needs elevated access,
    /// e.g. `su -c "droidprobe mem"`.
    pub fn with_hint_command(mut self, command: impl Into<String>) -> Self {
        self.hint_command = Some(command.into());
        self
    }

    fn section(&self, f: &mut Formatter<'_>, section: &Section) -> fmt::Result {
        writeln!(f, "{}", section.name)?;
        writeln!(f, "{}", "-".repeat(section.name.chars().count().max(8)))?;
        match &section.outcome {
            SectionOutcome::Ok(data) => {
                record(f, &data.record)?;
                notes(f, data)
            }
            SectionOutcome::Empty { attempts } => {
                writeln!(f, "(source reachable but empty)")?;
                attempt_lines(f, attempts)
            }
            SectionOutcome::Failed { attempts } => {
                writeln!(f, "unavailable")?;
                attempt_lines(f, attempts)?;
                if let Some(hint) = self.hint(attempts) {
                    writeln!(f, "  hint: {hint}")?;
                }
                Ok(())
            }
        }
    }

    fn hint(&self, attempts: &[AttemptFailure]) -> Option<String> {
        if !attempts.is_empty() && attempts.iter().all(|a| a.error == AttemptError::NotFound) {
            return Some("not present on this device".to_string());
        }
        let blocked = attempts
            .iter()
            .any(|a| a.provenance != Provenance::Elevated && a.error.suggests_elevation());
        if !blocked {
            return None;
        }
        let elevated_tried = attempts.iter().any(|a| a.provenance == Provenance::Elevated);
        Some(match (&self.hint_command, elevated_tried) {
            (Some(cmd), _) => format!("access is restricted; try running with root: {cmd}"),
            (None, true) => "access is restricted and elevation failed; a rooted device is required".to_string(),
            (None, false) => "access is restricted; rerun without --no-elevate".to_string(),
        })
    }
}

impl Display for TextReport<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, section) in self.report.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            self.section(f, section)?;
        }
        Ok(())
    }
}

fn attempt_lines(f: &mut Formatter<'_>, attempts: &[AttemptFailure]) -> fmt::Result {
    for a in attempts {
        writeln!(f, "  tried {}: {}", a.strategy, a.error)?;
    }
    Ok(())
}

fn notes(f: &mut Formatter<'_>, data: &SectionData) -> fmt::Result {
    if data.approximate {
        writeln!(f, "  note: approximate, used {}", data.source)?;
    } else if data.provenance == Provenance::Elevated {
        writeln!(f, "  note: required elevated access (via {})", elevated_source(data))?;
    }
    if data.degraded && !data.approximate {
        writeln!(f, "  note: some fields are unknown")?;
    }
    if !data.skipped.is_empty() {
        writeln!(f, "  note: {} malformed lines skipped", data.skipped.len())?;
    }
    for note in &data.notes {
        writeln!(f, "  note: {note}")?;
    }
    Ok(())
}

fn record(f: &mut Formatter<'_>, record: &Record) -> fmt::Result {
    match record {
        Record::Uname(u) => {
            writeln!(f, "{:<8} {}", "system", or_unknown(u.sysname.as_deref()))?;
            writeln!(f, "{:<8} {}", "release", or_unknown(u.release.as_deref()))?;
            writeln!(f, "{:<8} {}", "version", or_unknown(u.version.as_deref()))?;
            writeln!(f, "{:<8} {}", "machine", or_unknown(u.machine.as_deref()))
        }
        Record::Uptime(u) => {
            writeln!(f, "up   {}", format_uptime(u.uptime_seconds))?;
            if let Some(idle) = u.idle_seconds {
                writeln!(f, "idle {idle:.2}s")?;
            }
            Ok(())
        }
        Record::MemInfo(info) => meminfo(f, info),
        Record::LoadAvg(l) => {
            write!(f, "load {:.2} {:.2} {:.2}", l.load1, l.load5, l.load15)?;
            if let (Some(running), Some(total)) = (l.running, l.total) {
                write!(f, "  running {running}/{total}")?;
            }
            if let Some(pid) = l.last_pid {
                write!(f, "  last pid {pid}")?;
            }
            writeln!(f)
        }
        Record::Mounts {
            entries,
            total,
            filtered,
        } => {
            writeln!(f, "{:<28} {:<24} {:<8} OPTIONS", "SOURCE", "TARGET", "TYPE")?;
            for m in entries {
                writeln!(
                    f,
                    "{:<28} {:<24} {:<8} {}",
                    truncate(&m.source, 28),
                    truncate(&m.target, 24),
                    m.fs_type,
                    truncate(&m.options, 40)
                )?;
            }
            if *filtered {
                writeln!(f, "({} of {} mounts shown, --all for everything)", entries.len(), total)?;
            }
            Ok(())
        }
        Record::Sockets {
            protocol,
            entries,
            total,
        } => {
            writeln!(f, "{:>4}  {:<21} {:<21} STATE", "SL", "LOCAL", "REMOTE")?;
            for s in entries {
                writeln!(
                    f,
                    "{:>4}  {:<21} {:<21} {}",
                    s.slot,
                    s.local.to_string(),
                    s.remote.to_string(),
                    s.state
                )?;
            }
            if entries.len() < *total {
                writeln!(f, "({} of {} {} sockets shown)", entries.len(), total, protocol.as_str())?;
            }
            Ok(())
        }
        Record::Processes(ps) => {
            writeln!(f, "{:>7} {:>7} {:>4}  {:<24} STATE", "PID", "TGID", "THR", "NAME")?;
            for p in ps {
                writeln!(
                    f,
                    "{:>7} {:>7} {:>4}  {:<24} {}",
                    or_unknown(p.pid),
                    or_unknown(p.tgid),
                    or_unknown(p.threads),
                    truncate(&or_unknown(p.name.as_deref()), 24),
                    or_unknown(p.state.as_deref())
                )?;
            }
            Ok(())
        }
        Record::Thermal(zones) => {
            for z in zones {
                writeln!(
                    f,
                    "zone{:<3} {:<24} {:>6.1} C",
                    z.index,
                    truncate(&or_unknown(z.zone_type.as_deref()), 24),
                    z.celsius
                )?;
            }
            Ok(())
        }
        Record::KernelLog { lines, seen } => {
            for line in lines {
                writeln!(f, "{line}")?;
            }
            writeln!(f, "(last {} of {} lines)", lines.len(), seen)
        }
        Record::Selinux(mode) => writeln!(f, "{}", mode.as_str()),
        Record::Properties(props) => {
            for p in props {
                let value = p.value.as_deref().unwrap_or("(not available)");
                writeln!(f, "{:<18} {}", p.label, value)?;
            }
            Ok(())
        }
        Record::Tracefs(t) => {
            for root in &t.roots {
                if !root.present {
                    writeln!(f, "{}  (not present)", root.path.display())?;
                    continue;
                }
                writeln!(f, "{}", root.path.display())?;
                writeln!(
                    f,
                    "  looks like     {}",
                    if root.looks_like_tracefs { "tracefs" } else { "unknown" }
                )?;
                writeln!(f, "  current tracer {}", trace_setting(root.current_tracer.as_ref()))?;
                writeln!(f, "  trace clock    {}", trace_setting(root.trace_clock.as_ref()))?;
            }
            Ok(())
        }
    }
}

fn trace_setting(setting: Option<&TraceSetting>) -> String {
    match setting {
        Some(s) if s.provenance == Provenance::Elevated => format!("{} (via su)", s.value),
        Some(s) => s.value.clone(),
        None => or_unknown(None::<&str>),
    }
}

/// Where an elevated section came from: the commands actually run when
/// known, else the section source.
fn elevated_source(data: &SectionData) -> String {
    match data.elevated_via.as_slice() {
        [] => data.source.clone(),
        [one] => one.clone(),
        [first, second] => format!("{first}, {second}"),
        [first, rest @ ..] => format!("{first} and {} more", rest.len()),
    }
}

fn meminfo(f: &mut Formatter<'_>, info: &MemInfo) -> fmt::Result {
    for &key in MEMINFO_FIELDS {
        if let Some(kb) = info.get(key) {
            writeln!(f, "{key:<14} {kb:>12} kB  ({})", format_kb(kb))?;
        }
    }
    if let Some(pct) = info.available_percent() {
        writeln!(f, "Available      {pct:>11.1}%")?;
    }
    Ok(())
}
