//! Default acquisition chains, cheapest and least privileged first.
//!
//! | resource        | chain                                              |
//! |-----------------|----------------------------------------------------|
//! | uptime          | `<proc>/uptime` → elevated → `CLOCK_BOOTTIME`       |
//! | meminfo         | `<proc>/meminfo` → elevated                        |
//! | loadavg         | `<proc>/loadavg` → elevated → `sysinfo()`          |
//! | mount-table     | `<proc>/mounts`, `self/mounts`, `1/mounts` → elevated |
//! | tcp/udp sockets | `<proc>/net/{tcp,udp}` → elevated                  |
//! | process-status  | `<proc>/<pid>/status` only                         |
//! | thermal-zone    | `<sys>/class/thermal/thermal_zoneN/*` → elevated   |
//! | kernel-log      | `dmesg` → `/system/bin/dmesg` → elevated `dmesg`   |
//! | selinux-mode    | `<sys>/fs/selinux/enforce` → `getenforce` → elevated |
//! | property        | `getprop <key>`                                    |
//! | uname           | `uname()`                                          |
//! | tracefs file    | `<root>/<file>` → elevated                         |
//!
//! Elevated entries are left out when elevation is disabled.

use std::path::PathBuf;

use crate::collector::privileged::{ElevatedTarget, ReadOnlyCommand};
use crate::collector::resolver::{ResourceId, SourceStrategy};
use crate::collector::syscall::SyscallFn;
use crate::config::ProbeConfig;

/// Android ships `dmesg` here even when it is not on `PATH`.
pub const SYSTEM_DMESG: &str = "/system/bin/dmesg";

/// Builds the default chain for `id` under `config`.
pub fn default_chain(id: &ResourceId, config: &ProbeConfig) -> Vec<SourceStrategy> {
    let mut chain = ChainBuilder::new(config);
    match id {
        ResourceId::Uptime => chain
            .file(config.proc_path("uptime"))
            .syscall(SyscallFn::BootClock),
        ResourceId::MemInfo => chain.file(config.proc_path("meminfo")),
        ResourceId::LoadAvg => chain
            .file(config.proc_path("loadavg"))
            .syscall(SyscallFn::LoadAverage),
        ResourceId::Mounts => chain
            .direct(config.proc_path("mounts"))
            .direct(config.proc_path("self/mounts"))
            .direct(config.proc_path("1/mounts"))
            .elevated_file(config.proc_path("mounts")),
        ResourceId::TcpSockets => chain.file(config.proc_path("net/tcp")),
        ResourceId::UdpSockets => chain.file(config.proc_path("net/udp")),
        ResourceId::ProcessStatus { pid } => chain.direct(config.proc_path(format!("{pid}/status"))),
        ResourceId::ThermalZone { index, attr } => chain.file(
            config
                .sys_path("class/thermal")
                .join(format!("thermal_zone{index}"))
                .join(attr.file_name()),
        ),
        ResourceId::KernelLog => chain
            .command(ReadOnlyCommand::dmesg())
            .command(ReadOnlyCommand::Dmesg {
                program: SYSTEM_DMESG.to_string(),
            })
            .elevated_command(ReadOnlyCommand::dmesg()),
        ResourceId::SelinuxMode => chain
            .direct(config.sys_path("fs/selinux/enforce"))
            .command(ReadOnlyCommand::Getenforce)
            .elevated_command(ReadOnlyCommand::Getenforce),
        ResourceId::Property { key } => chain.command(ReadOnlyCommand::Getprop { key: key.clone() }),
        ResourceId::Uname => chain.syscall(SyscallFn::Uname),
        ResourceId::TraceFile { root, name } => chain.file(root.join(name)),
    };
    chain.build()
}

struct ChainBuilder {
    elevate: bool,
    strategies: Vec<SourceStrategy>,
}

impl ChainBuilder {
    fn new(config: &ProbeConfig) -> Self {
        Self {
            elevate: config.elevation.enabled,
            strategies: Vec::with_capacity(4),
        }
    }

    /// Direct read followed by an elevated read of the same file.
    fn file(&mut self, path: PathBuf) -> &mut Self {
        self.direct(path.clone()).elevated_file(path)
    }

    fn direct(&mut self, path: PathBuf) -> &mut Self {
        self.strategies.push(SourceStrategy::DirectRead(path));
        self
    }

    fn elevated_file(&mut self, path: PathBuf) -> &mut Self {
        if self.elevate {
            self.strategies
                .push(SourceStrategy::ElevatedRead(ElevatedTarget::File(path)));
        }
        self
    }

    fn command(&mut self, cmd: ReadOnlyCommand) -> &mut Self {
        self.strategies.push(SourceStrategy::Command(cmd));
        self
    }

    fn elevated_command(&mut self, cmd: ReadOnlyCommand) -> &mut Self {
        if self.elevate {
            self.strategies
                .push(SourceStrategy::ElevatedRead(ElevatedTarget::Command(cmd)));
        }
        self
    }

    fn syscall(&mut self, f: SyscallFn) -> &mut Self {
        self.strategies.push(SourceStrategy::SyscallFallback(f));
        self
    }

    fn build(self) -> Vec<SourceStrategy> {
        self.strategies
    }
}
