//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string
//! inputs, and they never fail outright: malformed lines are reported in
//! [`Parsed::skipped`] and parsing continues.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddrV4};

use serde::{Serialize, Serializer};

use crate::collector::parsed::{Parsed, SkippedLine};

/// Parsed data from `/proc/uptime`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Uptime {
    pub uptime_seconds: f64,
    /// Absent when the value came from the boot clock.
    pub idle_seconds: Option<f64>,
}

/// Parses `/proc/uptime` content: `<uptime> <idle>`.
pub fn parse_uptime(content: &str) -> Parsed<Uptime> {
    let mut skipped = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(first) = fields.next() else {
            continue;
        };
        match first.parse::<f64>() {
            Ok(uptime_seconds) if uptime_seconds.is_finite() && uptime_seconds >= 0.0 => {
                let idle_seconds = fields
                    .next()
                    .and_then(|s| s.parse::<f64>().ok())
                    .filter(|v| v.is_finite() && *v >= 0.0);
                let record = Uptime {
                    uptime_seconds,
                    idle_seconds,
                };
                return Parsed::new(Some(record), skipped);
            }
            _ => skipped.push(SkippedLine::new(idx + 1, line, "uptime is not a number")),
        }
    }

    Parsed::new(None, skipped)
}

/// The only unit `/proc/meminfo` values are accepted in.
pub const MEMINFO_UNIT: &str = "kB";

/// Parsed data from `/proc/meminfo`: field name to kilobytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemInfo {
    pub fields: BTreeMap<String, u64>,
}

impl MemInfo {
    pub fn get(&self, key: &str) -> Option<u64> {
        self.fields.get(key).copied()
    }

    /// `MemAvailable` as a percentage of `MemTotal`.
    pub fn available_percent(&self) -> Option<f64> {
        let total = self.get("MemTotal").filter(|t| *t > 0)?;
        let avail = self.get("MemAvailable")?;
        Some(avail as f64 * 100.0 / total as f64)
    }
}

/// Parses `/proc/meminfo` content.
///
/// Lines have the form `Key: value unit`. Lines whose unit is not `kB`
/// (including unitless counters such as `HugePages_Total`) are ignored.
/// Lines without a `Key:` label or with a non-integer value are skipped.
/// The first occurrence of a key wins.
pub fn parse_meminfo(content: &str) -> Parsed<MemInfo> {
    let mut info = MemInfo::default();
    let mut skipped = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((key, rest)) = line.split_once(':') else {
            skipped.push(SkippedLine::new(idx + 1, line, "missing 'Key:' label"));
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            skipped.push(SkippedLine::new(idx + 1, line, "invalid key"));
            continue;
        }

        let mut tokens = rest.split_whitespace();
        let Some(value) = tokens.next().and_then(|v| v.parse::<u64>().ok()) else {
            skipped.push(SkippedLine::new(idx + 1, line, "value is not an integer"));
            continue;
        };
        if tokens.next() != Some(MEMINFO_UNIT) {
            continue;
        }
        info.fields.entry(key.to_string()).or_insert(value);
    }

    let record = (!info.fields.is_empty()).then_some(info);
    Parsed::new(record, skipped)
}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    /// Runnable scheduling entities. Absent from syscall fallbacks.
    pub running: Option<u32>,
    pub total: Option<u32>,
    pub last_pid: Option<u32>,
}

/// Parses `/proc/loadavg` content.
///
/// Format: `0.15 0.10 0.05 1/150 1234`. The three averages are required;
/// the run-queue pair and last pid are optional.
pub fn parse_loadavg(content: &str) -> Parsed<LoadAvg> {
    let mut skipped = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        let loads: Vec<f64> = parts
            .iter()
            .take(3)
            .map_while(|s| s.parse::<f64>().ok())
            .collect();
        let [load1, load5, load15] = loads[..] else {
            skipped.push(SkippedLine::new(idx + 1, line, "expected three load averages"));
            continue;
        };

        // Format: running/total
        let (running, total) = match parts.get(3).and_then(|s| s.split_once('/')) {
            Some((r, t)) => (r.parse().ok(), t.parse().ok()),
            None => (None, None),
        };
        let last_pid = parts.get(4).and_then(|s| s.parse().ok());

        let record = LoadAvg {
            load1,
            load5,
            load15,
            running,
            total,
            last_pid,
        };
        return Parsed::new(Some(record), skipped);
    }

    Parsed::new(None, skipped)
}

/// One line of `/proc/mounts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountEntry {
    pub source: String,
    pub target: String,
    pub fs_type: String,
    pub options: String,
    pub dump: u32,
    pub pass: u32,
}

/// Mount point prefixes worth showing by default on Android.
const INTERESTING_PREFIXES: &[&str] = &[
    "/data", "/system", "/vendor", "/product", "/odm", "/apex", "/storage", "/sdcard",
];

impl MountEntry {
    /// Root or one of the well-known Android partitions.
    pub fn is_interesting(&self) -> bool {
        self.target == "/"
            || INTERESTING_PREFIXES
                .iter()
                .any(|p| self.target.starts_with(p))
    }

    pub fn is_read_only(&self) -> bool {
        self.options.split(',').any(|o| o == "ro")
    }
}

/// Parses `/proc/mounts` content (six whitespace-separated columns).
pub fn parse_mounts(content: &str) -> Parsed<Vec<MountEntry>> {
    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 6 {
            skipped.push(SkippedLine::new(idx + 1, line, "expected six columns"));
            continue;
        }
        let (Ok(dump), Ok(pass)) = (parts[4].parse(), parts[5].parse()) else {
            skipped.push(SkippedLine::new(idx + 1, line, "dump/pass are not integers"));
            continue;
        };
        entries.push(MountEntry {
            source: unescape_octal(parts[0]),
            target: unescape_octal(parts[1]),
            fs_type: parts[2].to_string(),
            options: parts[3].to_string(),
            dump,
            pass,
        });
    }

    let record = (!entries.is_empty()).then_some(entries);
    Parsed::new(record, skipped)
}

/// Decodes the kernel's `\ooo` escapes (`\040` for space, `\011` for tab...).
fn unescape_octal(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..=i + 3].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let code = (bytes[i + 1] - b'0') as u32 * 64
                + (bytes[i + 2] - b'0') as u32 * 8
                + (bytes[i + 3] - b'0') as u32;
            if let Ok(byte) = u8::try_from(code) {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// TCP connection state from the `st` column of `/proc/net/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SocketState {
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Listen,
    Closing,
    /// A code outside the known set. Kept, never an error.
    Unknown(u8),
}

impl SocketState {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::Established,
            0x02 => Self::SynSent,
            0x03 => Self::SynRecv,
            0x04 => Self::FinWait1,
            0x05 => Self::FinWait2,
            0x06 => Self::TimeWait,
            0x07 => Self::Close,
            0x08 => Self::CloseWait,
            0x09 => Self::LastAck,
            0x0A => Self::Listen,
            0x0B => Self::Closing,
            other => Self::Unknown(other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Established => "ESTABLISHED",
            Self::SynSent => "SYN_SENT",
            Self::SynRecv => "SYN_RECV",
            Self::FinWait1 => "FIN_WAIT1",
            Self::FinWait2 => "FIN_WAIT2",
            Self::TimeWait => "TIME_WAIT",
            Self::Close => "CLOSE",
            Self::CloseWait => "CLOSE_WAIT",
            Self::LastAck => "LAST_ACK",
            Self::Listen => "LISTEN",
            Self::Closing => "CLOSING",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for SocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SocketState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One socket from `/proc/net/tcp` or `/proc/net/udp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketEntry {
    /// The `sl` sequence number.
    pub slot: u32,
    pub state: SocketState,
    pub local: SocketAddrV4,
    pub remote: SocketAddrV4,
}

/// Parses `/proc/net/tcp` or `/proc/net/udp` content.
///
/// The first line is a column header and is skipped. Each following line
/// starts with `sl: local_address rem_address st`, where addresses are
/// `AAAAAAAA:PPPP` hex with the IPv4 address in little-endian byte order.
/// Returns `None` only when there is not even a header line.
pub fn parse_socket_table(content: &str) -> Parsed<Vec<SocketEntry>> {
    let mut lines = content.lines().enumerate();
    let mut skipped = Vec::new();

    if !lines.any(|(_, l)| !l.trim().is_empty()) {
        return Parsed::new(None, skipped);
    }

    let mut entries = Vec::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_socket_line(line) {
            Ok(entry) => entries.push(entry),
            Err(reason) => skipped.push(SkippedLine::new(idx + 1, line, reason)),
        }
    }

    Parsed::new(Some(entries), skipped)
}

fn parse_socket_line(line: &str) -> Result<SocketEntry, &'static str> {
    let mut fields = line.split_whitespace();
    let slot = fields
        .next()
        .and_then(|s| s.strip_suffix(':'))
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or("missing 'sl:' sequence number")?;
    let local = decode_endpoint(fields.next().ok_or("missing local address")?)?;
    let remote = decode_endpoint(fields.next().ok_or("missing remote address")?)?;
    let state = fields
        .next()
        .filter(|s| s.len() == 2)
        .and_then(|s| u8::from_str_radix(s, 16).ok())
        .map(SocketState::from_code)
        .ok_or("state is not a two-digit hex code")?;

    Ok(SocketEntry {
        slot,
        state,
        local,
        remote,
    })
}

/// Decodes `0100007F:1F90` into `127.0.0.1:8080`.
fn decode_endpoint(s: &str) -> Result<SocketAddrV4, &'static str> {
    let (addr, port) = s.split_once(':').ok_or("address is missing ':port'")?;
    if addr.len() == 32 {
        return Err("IPv6 address (not decoded)");
    }
    if addr.len() != 8 || port.len() != 4 {
        return Err("address is not fixed-width hex");
    }
    let raw = u32::from_str_radix(addr, 16).map_err(|_| "address is not hex")?;
    let port = u16::from_str_radix(port, 16).map_err(|_| "port is not hex")?;
    Ok(SocketAddrV4::new(Ipv4Addr::from(raw.to_le_bytes()), port))
}

/// Extracts `expected` keys from a `Key: value` block.
///
/// Keys may be separated from values by a colon or by whitespace. The first
/// occurrence of each key wins and unrecognized keys are ignored. Lines
/// with no separator at all are skipped. The record is `None` only when
/// none of the expected keys appear.
pub fn parse_status_block<'k>(
    content: &str,
    expected: &[&'k str],
) -> Parsed<BTreeMap<&'k str, String>> {
    let mut found: BTreeMap<&'k str, String> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let split = trimmed
            .split_once(':')
            .or_else(|| trimmed.split_once(char::is_whitespace));
        let Some((key, value)) = split else {
            skipped.push(SkippedLine::new(idx + 1, line, "no key/value separator"));
            continue;
        };
        let key = key.trim();
        if let Some(&wanted) = expected.iter().find(|k| **k == key) {
            found
                .entry(wanted)
                .or_insert_with(|| value.trim().to_string());
        }
    }

    let record = (!found.is_empty()).then_some(found);
    Parsed::new(record, skipped)
}

/// Fields read from `/proc/[pid]/status`. `None` means the key was never
/// observed (rendered as "?").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStatus {
    pub pid: Option<u32>,
    pub name: Option<String>,
    pub state: Option<String>,
    pub tgid: Option<i32>,
    pub threads: Option<u32>,
}

impl ProcessStatus {
    pub fn has_unknown_fields(&self) -> bool {
        self.pid.is_none()
            || self.name.is_none()
            || self.state.is_none()
            || self.tgid.is_none()
            || self.threads.is_none()
    }
}

const STATUS_KEYS: &[&str] = &["Name", "State", "Pid", "Tgid", "Threads"];

/// Parses `/proc/[pid]/status` content.
pub fn parse_process_status(content: &str) -> Parsed<ProcessStatus> {
    parse_status_block(content, STATUS_KEYS).map(|fields| ProcessStatus {
        pid: fields.get("Pid").and_then(|s| s.parse().ok()),
        name: fields.get("Name").filter(|s| !s.is_empty()).cloned(),
        state: fields.get("State").filter(|s| !s.is_empty()).cloned(),
        tgid: fields.get("Tgid").and_then(|s| s.parse().ok()),
        threads: fields.get("Threads").and_then(|s| s.parse().ok()),
    })
}

/// Kernel identification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Uname {
    pub sysname: Option<String>,
    pub release: Option<String>,
    pub version: Option<String>,
    pub machine: Option<String>,
}

const UNAME_KEYS: &[&str] = &["sysname", "release", "version", "machine"];

/// Parses the `key:\tvalue` rendering of `uname(2)`.
pub fn parse_uname(content: &str) -> Parsed<Uname> {
    parse_status_block(content, UNAME_KEYS).map(|fields| Uname {
        sysname: fields.get("sysname").cloned(),
        release: fields.get("release").cloned(),
        version: fields.get("version").cloned(),
        machine: fields.get("machine").cloned(),
    })
}
