//! Resilient acquisition of kernel-exposed state.
//!
//! This module reads `/proc` and `/sys` resources that may be blocked by
//! access control, falls back through elevated reads and syscalls, and
//! parses what it gets into typed records. Everything that touches the
//! host sits behind a trait so the whole pipeline runs against mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SourceResolver                         │
//! │   ResourceId ──► strategy chain (strategies.rs)             │
//! │                                                             │
//! │   DirectRead     Command       ElevatedRead   SyscallFallback
//! │       │             │               │               │       │
//! │  ┌────▼─────┐ ┌─────▼───────┐ ┌─────▼──────────┐ ┌──▼─────┐ │
//! │  │FileSystem│ │CommandRunner│ │PrivilegedReader│ │Syscalls│ │
//! │  └────┬─────┘ └─────┬───────┘ └─────┬──────────┘ └──┬─────┘ │
//! └───────┼─────────────┼───────────────┼───────────────┼───────┘
//!         │             │               │               │
//!   RealFs/MockFs  SystemRunner/   SuReader/       NixSyscalls/
//!                  MockRunner      MockPrivileged  MockSyscalls
//!
//!   raw text ──► procfs / sysfs parsers ──► Parsed<T>
//!   line stream ──► TailWindow (last N lines)
//! ```
//!
//! # Usage
//!
//! ## Production (Android/Linux)
//!
//! ```ignore
//! use droidprobe_core::collector::{RealFs, ResourceId, SourceResolver};
//! use droidprobe_core::config::ProbeConfig;
//!
//! let resolver = SourceResolver::new(RealFs::new(), ProbeConfig::default());
//! let outcome = resolver.resolve(&ResourceId::MemInfo);
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use droidprobe_core::collector::{MockFs, MockPrivileged, MockRunner, MockSyscalls};
//! use droidprobe_core::collector::{Provenance, ResourceId, SourceResolver};
//! use droidprobe_core::config::ProbeConfig;
//!
//! let resolver = SourceResolver::new(MockFs::typical_android(), ProbeConfig::default())
//!     .with_runner(MockRunner::new())
//!     .with_privileged(MockPrivileged::new())
//!     .with_syscalls(MockSyscalls::new());
//! let acquired = resolver.resolve(&ResourceId::Uptime).success().unwrap();
//! assert_eq!(acquired.provenance, Provenance::Direct);
//! ```

pub mod lines;
pub mod mock;
pub mod parsed;
pub mod privileged;
pub mod procfs;
pub mod resolver;
pub mod strategies;
pub mod syscall;
pub mod sysfs;
pub mod tail;
pub mod traits;

pub use mock::{MockFs, MockPrivileged, MockRunner, MockSyscalls};
pub use parsed::{Parsed, SkippedLine};
pub use privileged::{ElevatedTarget, PrivilegedReader, ReadOnlyCommand, SuReader};
pub use resolver::{
    Acquired, AttemptFailure, ProbeOutcome, Provenance, ResourceId, SourceResolver,
    SourceStrategy, TailOutcome, ZoneAttr,
};
pub use syscall::{NixSyscalls, SyscallFn, SystemCalls};
pub use tail::{TailWindow, tail};
pub use traits::{CommandOutput, CommandRunner, FileSystem, RealFs, SystemRunner};
