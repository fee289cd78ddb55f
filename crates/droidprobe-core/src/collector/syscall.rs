//! OS-level information calls used when text sources are blocked.
//!
//! Results are rendered back into the text grammar of the resource they
//! stand in for, so the same parser handles every acquisition path.

use std::fmt::Write as _;
use std::io;
use std::time::Duration;

use serde::Serialize;

/// A syscall-backed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyscallFn {
    /// `clock_gettime(CLOCK_BOOTTIME)`: time since boot including suspend.
    /// Has no idle counter.
    BootClock,
    /// `sysinfo(2)` load averages. Has no run-queue or last-pid figures.
    LoadAverage,
    /// `uname(2)`.
    Uname,
}

impl SyscallFn {
    /// Whether the result is a lower-fidelity stand-in for a text source.
    pub fn is_approximation(self) -> bool {
        match self {
            Self::BootClock | Self::LoadAverage => true,
            Self::Uname => false,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::BootClock => "clock_gettime(CLOCK_BOOTTIME)",
            Self::LoadAverage => "sysinfo()",
            Self::Uname => "uname()",
        }
    }
}

/// Kernel identification as reported by `uname(2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnameInfo {
    pub sysname: String,
    pub release: String,
    pub version: String,
    pub machine: String,
}

/// The syscall surface the resolver depends on.
pub trait SystemCalls: Send + Sync {
    fn boot_clock(&self) -> io::Result<Duration>;
    fn load_average(&self) -> io::Result<[f64; 3]>;
    fn uname(&self) -> io::Result<UnameInfo>;
}

/// Invokes `f` and renders its result as text.
///
/// | call        | rendered as                            |
/// |-------------|----------------------------------------|
/// | BootClock   | `"<seconds>\n"` (uptime without idle)  |
/// | LoadAverage | `"<l1> <l5> <l15>\n"`                  |
/// | Uname       | `key:\tvalue` status block             |
pub fn invoke(sys: &dyn SystemCalls, f: SyscallFn) -> io::Result<String> {
    match f {
        SyscallFn::BootClock => {
            let up = sys.boot_clock()?;
            Ok(format!("{:.2}\n", up.as_secs_f64()))
        }
        SyscallFn::LoadAverage => {
            let [l1, l5, l15] = sys.load_average()?;
            Ok(format!("{l1:.2} {l5:.2} {l15:.2}\n"))
        }
        SyscallFn::Uname => {
            let u = sys.uname()?;
            let mut out = String::new();
            for (key, value) in [
                ("sysname", &u.sysname),
                ("release", &u.release),
                ("version", &u.version),
                ("machine", &u.machine),
            ] {
                let _ = writeln!(out, "{key}:\t{value}");
            }
            Ok(out)
        }
    }
}

/// `SystemCalls` backed by `nix`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NixSyscalls;

#[cfg(any(target_os = "linux", target_os = "android"))]
impl SystemCalls for NixSyscalls {
    fn boot_clock(&self) -> io::Result<Duration> {
        use nix::time::{ClockId, clock_gettime};
        let ts = clock_gettime(ClockId::CLOCK_BOOTTIME)?;
        Ok(Duration::new(ts.tv_sec() as u64, ts.tv_nsec() as u32))
    }

    fn load_average(&self) -> io::Result<[f64; 3]> {
        let info = nix::sys::sysinfo::sysinfo()?;
        let (l1, l5, l15) = info.load_average();
        Ok([l1, l5, l15])
    }

    fn uname(&self) -> io::Result<UnameInfo> {
        nix_uname()
    }
}

#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
impl SystemCalls for NixSyscalls {
    fn boot_clock(&self) -> io::Result<Duration> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn load_average(&self) -> io::Result<[f64; 3]> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn uname(&self) -> io::Result<UnameInfo> {
        nix_uname()
    }
}

#[cfg(not(unix))]
impl SystemCalls for NixSyscalls {
    fn boot_clock(&self) -> io::Result<Duration> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn load_average(&self) -> io::Result<[f64; 3]> {
        Err(io::ErrorKind::Unsupported.into())
    }

    fn uname(&self) -> io::Result<UnameInfo> {
        Err(io::ErrorKind::Unsupported.into())
    }
}

#[cfg(unix)]
fn nix_uname() -> io::Result<UnameInfo> {
    let u = nix::sys::utsname::uname()?;
    let text = |s: &std::ffi::OsStr| s.to_string_lossy().into_owned();
    Ok(UnameInfo {
        sysname: text(u.sysname()),
        release: text(u.release()),
        version: text(u.version()),
        machine: text(u.machine()),
    })
}
