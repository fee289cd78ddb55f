//! Mock implementations for testing.
//!
//! Provides `MockFs` for simulating `/proc` and `/sys`, scripted command,
//! privileged-reader and syscall mocks, and canned device scenarios.

mod commands;
mod filesystem;
pub mod scenarios;

pub use commands::{MockPrivileged, MockRunner, MockSyscalls};
pub use filesystem::MockFs;
