//! Probe configuration.
//!
//! Everything here has a sensible default for a stock Android/Linux device.
//! The CLI overrides individual fields from flags and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default upper bound on thermal zone indices to probe.
pub const DEFAULT_THERMAL_MAX_ZONES: u32 = 64;

/// How elevated reads are performed.
///
/// The wrapper is invoked as `<program> <flag> "<read-only command>"`,
/// e.g. `su -c "cat /proc/meminfo"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationConfig {
    pub enabled: bool,
    pub program: String,
    pub flag: String,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: "su".to_string(),
            flag: "-c".to_string(),
        }
    }
}

/// Configuration shared by the resolver and all probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Root of the process/kernel virtual filesystem.
    pub proc_root: PathBuf,
    /// Root of the device/driver virtual filesystem.
    pub sys_root: PathBuf,
    pub elevation: ElevationConfig,
    /// Thermal zones are probed from index 0 up to (excluding) this bound.
    pub thermal_max_zones: u32,
    /// Per-command deadline for one-shot command reads. `None` blocks
    /// until the command exits.
    pub command_timeout: Option<Duration>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            elevation: ElevationConfig::default(),
            thermal_max_zones: DEFAULT_THERMAL_MAX_ZONES,
            command_timeout: None,
        }
    }
}

impl ProbeConfig {
    /// Checks values that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thermal_max_zones == 0 {
            return Err(ConfigError::ZeroThermalBound);
        }
        let program = self.elevation.program.trim();
        if program.is_empty() {
            return Err(ConfigError::EmptyElevationProgram);
        }
        if !is_shell_safe(program) {
            return Err(ConfigError::UnsafeElevationProgram {
                program: program.to_string(),
            });
        }
        Ok(())
    }

    pub fn proc_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.proc_root.join(rel)
    }

    pub fn sys_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.sys_root.join(rel)
    }
}

/// Returns true when `s` only contains characters that are inert inside a
/// shell command line: ASCII alphanumerics and `/ . _ -`.
pub fn is_shell_safe(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b'.' | b'_' | b'-'))
}

/// Parses an entry/line count argument.
///
/// Zero, negative and non-numeric values are rejected. Values above `max`
/// are capped to `max`.
pub fn parse_count(value: &str, max: usize) -> Result<usize, ConfigError> {
    let invalid = || ConfigError::InvalidCount {
        value: value.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.starts_with('-') {
        return Err(invalid());
    }
    // Digit strings too long for usize are still "large values"; cap them.
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return match trimmed.parse::<usize>() {
            Ok(0) => Err(invalid()),
            Ok(n) => Ok(n.min(max)),
            Err(_) => Ok(max),
        };
    }
    Err(invalid())
}
