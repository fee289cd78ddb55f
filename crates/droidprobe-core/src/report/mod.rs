//! Structured reports assembled from independent probe sections.
//!
//! A [`Report`] always holds every requested section, in the requested
//! order, each marked as usable, empty or failed. Provenance and
//! degradation flags travel with every usable section.

mod aggregator;
pub mod render;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::collector::parsed::SkippedLine;
use crate::collector::procfs::{LoadAvg, MemInfo, MountEntry, ProcessStatus, SocketEntry, Uname, Uptime};
use crate::collector::resolver::{Acquired, AttemptFailure, Provenance};
use crate::collector::sysfs::{SelinuxMode, ThermalReading};

pub use aggregator::Aggregator;
pub use render::TextReport;

/// Socket table flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

/// One system property lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyValue {
    pub key: String,
    pub label: &'static str,
    pub value: Option<String>,
}

/// A tracefs control file value and how it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSetting {
    pub value: String,
    pub provenance: Provenance,
}

/// One candidate tracefs mount point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracefsRoot {
    pub path: PathBuf,
    /// False only when the directory is known to be absent.
    pub present: bool,
    /// `current_tracer` and `available_tracers` are both present.
    pub looks_like_tracefs: bool,
    pub current_tracer: Option<TraceSetting>,
    pub trace_clock: Option<TraceSetting>,
}

impl TracefsRoot {
    pub fn absent(path: PathBuf) -> Self {
        Self {
            path,
            present: false,
            looks_like_tracefs: false,
            current_tracer: None,
            trace_clock: None,
        }
    }

    fn has_unknown_fields(&self) -> bool {
        self.present && (self.current_tracer.is_none() || self.trace_clock.is_none())
    }
}

/// What the tracefs check found, one entry per candidate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracefsInfo {
    pub roots: Vec<TracefsRoot>,
}

/// The typed payload of a usable section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Record {
    Uname(Uname),
    Uptime(Uptime),
    MemInfo(MemInfo),
    LoadAvg(LoadAvg),
    Mounts {
        entries: Vec<MountEntry>,
        /// Entries in the table before filtering.
        total: usize,
        filtered: bool,
    },
    Sockets {
        protocol: Protocol,
        entries: Vec<SocketEntry>,
        total: usize,
    },
    Processes(Vec<ProcessStatus>),
    Thermal(Vec<ThermalReading>),
    KernelLog {
        lines: Vec<String>,
        /// Lines produced by the source, including those not retained.
        seen: u64,
    },
    Selinux(SelinuxMode),
    Properties(Vec<PropertyValue>),
    Tracefs(TracefsInfo),
}

impl Record {
    /// True when some expected field could not be resolved.
    pub fn has_unknown_fields(&self) -> bool {
        match self {
            Self::Uname(u) => {
                u.sysname.is_none() || u.release.is_none() || u.version.is_none() || u.machine.is_none()
            }
            Self::Uptime(u) => u.idle_seconds.is_none(),
            Self::LoadAvg(l) => l.running.is_none() || l.total.is_none() || l.last_pid.is_none(),
            Self::Processes(ps) => ps.iter().any(ProcessStatus::has_unknown_fields),
            Self::Thermal(zones) => zones.iter().any(|z| z.zone_type.is_none()),
            Self::Properties(props) => props.iter().any(|p| p.value.is_none()),
            Self::Tracefs(t) => t.roots.iter().any(TracefsRoot::has_unknown_fields),
            Self::MemInfo(_)
            | Self::Mounts { .. }
            | Self::Sockets { .. }
            | Self::KernelLog { .. }
            | Self::Selinux(_) => false,
        }
    }
}

/// A usable section with its acquisition metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionData {
    pub record: Record,
    pub provenance: Provenance,
    /// Produced by a lower-fidelity stand-in for the primary source.
    pub approximate: bool,
    /// Approximate, or some expected fields are unknown.
    pub degraded: bool,
    pub source: String,
    /// Elevated commands behind a section assembled from several reads.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elevated_via: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl SectionData {
    pub fn new(record: Record, provenance: Provenance, approximate: bool, source: String) -> Self {
        let degraded = approximate || record.has_unknown_fields();
        Self {
            record,
            provenance,
            approximate,
            degraded,
            source,
            elevated_via: Vec::new(),
            skipped: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn from_acquired(record: Record, acquired: Acquired) -> Self {
        Self::new(record, acquired.provenance, acquired.approximate, acquired.source)
    }

    pub fn with_skipped(mut self, skipped: Vec<SkippedLine>) -> Self {
        self.skipped = skipped;
        self
    }

    pub fn with_elevated_via(mut self, sources: impl IntoIterator<Item = String>) -> Self {
        for source in sources {
            if !self.elevated_via.contains(&source) {
                self.elevated_via.push(source);
            }
        }
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// How one section turned out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionOutcome {
    Ok(SectionData),
    /// The source was reachable but had nothing in it.
    Empty { attempts: Vec<AttemptFailure> },
    /// No strategy produced usable output.
    Failed { attempts: Vec<AttemptFailure> },
}

impl SectionOutcome {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn data(&self) -> Option<&SectionData> {
        match self {
            Self::Ok(data) => Some(data),
            Self::Empty { .. } | Self::Failed { .. } => None,
        }
    }

    pub fn attempts(&self) -> &[AttemptFailure] {
        match self {
            Self::Ok(_) => &[],
            Self::Empty { attempts } | Self::Failed { attempts } => attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub name: String,
    #[serde(flatten)]
    pub outcome: SectionOutcome,
}

/// A point-in-time snapshot of the requested sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub collected_at: DateTime<Utc>,
    pub sections: Vec<Section>,
}

impl Report {
    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// True when at least one section is usable.
    pub fn has_usable_output(&self) -> bool {
        self.sections.iter().any(|s| s.outcome.is_usable())
    }
}
