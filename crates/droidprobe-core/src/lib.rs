//! droidprobe-core - read-only system inspection for Android/Linux devices.
//!
//! Provides:
//! - `collector` - source resolution (direct read, elevated read, syscall
//!   fallback), line parsers for procfs/sysfs formats, bounded tail window
//! - `probe` - one resolver + parser pairing per report section
//! - `report` - report model, aggregator and text rendering
//! - `config` - probe configuration and count-argument parsing
//! - `error` - per-attempt and configuration errors
//! - `fmt` - shared formatting helpers (uptime, sizes, truncation)

pub mod collector;
pub mod config;
pub mod error;
pub mod fmt;
pub mod probe;
pub mod report;
