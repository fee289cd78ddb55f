//! Readers for the `/sys` device tree: thermal zones, SELinux and tracefs.

pub mod parser;
pub mod thermal;

pub use parser::{SelinuxMode, parse_selinux_mode, parse_temperature, parse_trace_clock};
pub use thermal::{ThermalReading, ThermalScan, UnreadableZone};
