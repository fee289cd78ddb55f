//! Error types shared by the resolver, the probes and the CLI.

use std::io;

use serde::Serialize;
use thiserror::Error;

/// Why a single acquisition strategy did not produce usable output.
///
/// These never escape the resolver as hard errors. They are collected per
/// attempt and carried inside [`ProbeOutcome::Unavailable`] so the report
/// can explain what was tried.
///
/// [`ProbeOutcome::Unavailable`]: crate::collector::ProbeOutcome::Unavailable
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptError {
    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("empty output")]
    EmptyOutput,

    #[error("output did not match the expected format")]
    Unparseable,

    #[error("command exited with status {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    CommandFailed { code: Option<i32> },

    #[error("timed out")]
    TimedOut,

    #[error("not supported on this platform")]
    Unsupported,

    #[error("rejected target: {reason}")]
    RejectedTarget { reason: String },

    #[error("no readable entries among {scanned} candidates")]
    NoEntries { scanned: usize },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl AttemptError {
    /// True when retrying with elevated access could plausibly help.
    pub fn suggests_elevation(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::EmptyOutput | Self::NoEntries { .. }
        )
    }
}

/// A streamed command that exited unsuccessfully after its output ended.
///
/// Carried inside an `io::Error` so line streams keep a single item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("command exited with status {code:?}")]
pub struct ExitStatusError {
    pub code: Option<i32>,
}

impl From<io::Error> for AttemptError {
    fn from(e: io::Error) -> Self {
        if let Some(exit) = e
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<ExitStatusError>())
        {
            return Self::CommandFailed { code: exit.code };
        }
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::TimedOut => Self::TimedOut,
            io::ErrorKind::Unsupported => Self::Unsupported,
            io::ErrorKind::InvalidInput => Self::RejectedTarget {
                reason: e.to_string(),
            },
            _ => Self::Io {
                message: e.to_string(),
            },
        }
    }
}

/// Invalid configuration or argument values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("expected a positive integer, got '{value}'")]
    InvalidCount { value: String },

    #[error("thermal zone bound must be at least 1")]
    ZeroThermalBound,

    #[error("elevation program must not be empty")]
    EmptyElevationProgram,

    #[error("unsafe elevation program '{program}'")]
    UnsafeElevationProgram { program: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds_map_to_attempt_errors() {
        let nf = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(AttemptError::from(nf), AttemptError::NotFound);

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "no");
        assert_eq!(AttemptError::from(denied), AttemptError::PermissionDenied);

        let other = io::Error::other("boom");
        assert!(matches!(AttemptError::from(other), AttemptError::Io { .. }));
    }

    #[test]
    fn test_command_failed_display() {
        let e = AttemptError::CommandFailed { code: Some(1) };
        assert_eq!(e.to_string(), "command exited with status 1");
        let e = AttemptError::CommandFailed { code: None };
        assert_eq!(e.to_string(), "command exited with status signal");
    }

    #[test]
    fn test_exit_status_survives_io_wrapping() {
        let e = io::Error::other(ExitStatusError { code: Some(1) });
        assert_eq!(
            AttemptError::from(e),
            AttemptError::CommandFailed { code: Some(1) }
        );
    }

    #[test]
    fn test_suggests_elevation() {
        assert!(AttemptError::PermissionDenied.suggests_elevation());
        assert!(!AttemptError::Unsupported.suggests_elevation());
    }
}
