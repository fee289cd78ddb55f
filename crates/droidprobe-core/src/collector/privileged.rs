//! Read-only command descriptions and the privileged reader boundary.
//!
//! The elevation wrapper (`su -c ...`) executes an arbitrary shell line, so
//! nothing here accepts free-form commands. Targets are a closed set: a file
//! to `cat`, or one of the read-only programs in [`ReadOnlyCommand`]. Every
//! interpolated token is checked with [`is_shell_safe`] before it reaches the
//! wrapper.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::collector::lines::LineStream;
use crate::collector::traits::{CommandOutput, CommandRunner};
use crate::config::{ElevationConfig, is_shell_safe};
use crate::error::AttemptError;

/// A program that only reports state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ReadOnlyCommand {
    /// Kernel ring buffer dump. `program` allows absolute paths such as
    /// `/system/bin/dmesg`.
    Dmesg { program: String },
    /// Current SELinux mode.
    Getenforce,
    /// A single system property.
    Getprop { key: String },
}

impl ReadOnlyCommand {
    pub fn dmesg() -> Self {
        Self::Dmesg {
            program: "dmesg".to_string(),
        }
    }

    /// Argument vector for direct execution.
    pub fn argv(&self) -> Result<Vec<String>, AttemptError> {
        self.validate()?;
        Ok(match self {
            Self::Dmesg { program } => vec![program.clone()],
            Self::Getenforce => vec!["getenforce".to_string()],
            Self::Getprop { key } => vec!["getprop".to_string(), key.clone()],
        })
    }

    /// Shell line for use inside the elevation wrapper.
    pub fn shell_line(&self) -> Result<String, AttemptError> {
        Ok(self.argv()?.join(" "))
    }

    fn validate(&self) -> Result<(), AttemptError> {
        match self {
            Self::Dmesg { program } if !is_shell_safe(program) => Err(rejected(format!(
                "program '{program}' contains unsafe characters"
            ))),
            Self::Getprop { key } if !is_property_key(key) => {
                Err(rejected(format!("property key '{key}' is not valid")))
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Display for ReadOnlyCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dmesg { program } => write!(f, "{program}"),
            Self::Getenforce => write!(f, "getenforce"),
            Self::Getprop { key } => write!(f, "getprop {key}"),
        }
    }
}

/// Property keys are dotted identifiers such as `ro.build.version.sdk`.
pub fn is_property_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}

/// What an elevated read may target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum ElevatedTarget {
    /// Read a file with `cat`.
    File(PathBuf),
    /// Run a read-only program.
    Command(ReadOnlyCommand),
}

impl ElevatedTarget {
    /// The command line handed to the elevation wrapper.
    pub fn shell_line(&self) -> Result<String, AttemptError> {
        match self {
            Self::File(path) => Ok(format!("cat {}", checked_path(path)?)),
            Self::Command(cmd) => cmd.shell_line(),
        }
    }
}

fn checked_path(path: &Path) -> Result<&str, AttemptError> {
    let s = path
        .to_str()
        .ok_or_else(|| rejected("path is not valid UTF-8".to_string()))?;
    if !path.is_absolute() {
        return Err(rejected(format!("path '{s}' is not absolute")));
    }
    if !is_shell_safe(s) || s.contains("..") {
        return Err(rejected(format!("path '{s}' contains unsafe characters")));
    }
    Ok(s)
}

fn rejected(reason: String) -> AttemptError {
    AttemptError::RejectedTarget { reason }
}

/// Reads system state through a higher-privilege execution context.
///
/// Implementations must only ever read. The target type has no way to
/// express a write, and implementations must not widen it: the output of
/// the wrapped command is captured from stdout and nothing is written to
/// its stdin.
pub trait PrivilegedReader: Send + Sync {
    /// Runs the target to completion under elevation.
    fn read(&self, target: &ElevatedTarget) -> Result<CommandOutput, AttemptError>;

    /// Streams the target's stdout line by line under elevation.
    fn stream(&self, target: &ElevatedTarget) -> Result<LineStream<'static>, AttemptError>;

    /// Human-readable description used in provenance and diagnostics.
    fn describe(&self, target: &ElevatedTarget) -> String;
}

/// `PrivilegedReader` that wraps targets in `<program> <flag> "<line>"`,
/// `su -c "cat /proc/meminfo"` by default.
pub struct SuReader<R: CommandRunner> {
    runner: R,
    program: String,
    flag: String,
}

impl<R: CommandRunner> SuReader<R> {
    pub fn new(runner: R, elevation: &ElevationConfig) -> Self {
        Self {
            runner,
            program: elevation.program.clone(),
            flag: elevation.flag.clone(),
        }
    }

    fn argv(&self, target: &ElevatedTarget) -> Result<Vec<String>, AttemptError> {
        if !is_shell_safe(&self.program) {
            return Err(rejected(format!(
                "elevation program '{}' contains unsafe characters",
                self.program
            )));
        }
        Ok(vec![
            self.program.clone(),
            self.flag.clone(),
            target.shell_line()?,
        ])
    }
}

impl<R: CommandRunner> PrivilegedReader for SuReader<R> {
    fn read(&self, target: &ElevatedTarget) -> Result<CommandOutput, AttemptError> {
        let argv = self.argv(target)?;
        Ok(self.runner.output(&argv)?)
    }

    fn stream(&self, target: &ElevatedTarget) -> Result<LineStream<'static>, AttemptError> {
        let argv = self.argv(target)?;
        Ok(self.runner.stream(&argv)?)
    }

    fn describe(&self, target: &ElevatedTarget) -> String {
        match target.shell_line() {
            Ok(line) => format!("{} {} {}", self.program, self.flag, line),
            Err(_) => format!("{} {} <rejected>", self.program, self.flag),
        }
    }
}
