//! droidprobe - read-only system inspection for Android/Linux devices.
//!
//! Each subcommand runs one or more probes through the source resolver
//! (direct read, elevated read, syscall fallback) and prints a text or
//! JSON report. Nothing on the device is ever modified.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{Level, debug, error};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use droidprobe_core::collector::{RealFs, SourceResolver};
use droidprobe_core::config::{ProbeConfig, parse_count};
use droidprobe_core::probe::Probe;
use droidprobe_core::report::{Aggregator, Protocol, Report, TextReport};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

const EXIT_UNAVAILABLE: u8 = 1;
const EXIT_CONFIG: u8 = 2;

/// Read-only system inspection for Android/Linux devices.
#[derive(Parser)]
#[command(name = "droidprobe", about = "Read-only Android/Linux system inspection", version = VERSION)]
struct Args {
    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, global = true, default_value = "/proc", value_name = "PATH")]
    proc_path: PathBuf,

    /// Path to /sys filesystem (for testing/mocking).
    #[arg(long, global = true, default_value = "/sys", value_name = "PATH")]
    sys_path: PathBuf,

    /// Program used for elevated reads, invoked as `<PROGRAM> -c "<command>"`.
    #[arg(long = "su", global = true, env = "DROIDPROBE_SU", default_value = "su", value_name = "PROGRAM")]
    su_program: String,

    /// Never fall back to elevated reads.
    #[arg(long, global = true)]
    no_elevate: bool,

    /// Highest thermal zone index to probe (exclusive).
    #[arg(long, global = true, default_value_t = 64, value_name = "N")]
    max_zones: u32,

    /// Kill one-shot commands that run longer than this. Blocks by default.
    #[arg(long, global = true, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Print the report as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Compact overview: kernel, uptime, memory, thermal, optional kernel log.
    Report {
        /// Append the last N kernel log lines (max 200).
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "30", value_parser = report_dmesg_count)]
        dmesg: Option<usize>,
    },
    /// Kernel name, release, version and machine.
    Uname,
    /// Time since boot.
    Uptime,
    /// Memory usage from meminfo.
    Mem,
    /// Load averages.
    Loadavg,
    /// Mounted filesystems.
    Mounts {
        /// Show every mount, not only the Android partitions.
        #[arg(long)]
        all: bool,
    },
    /// IPv4 TCP and UDP socket tables.
    Net {
        /// Entries per table (default 20, max 200).
        #[arg(value_name = "LIMIT", default_value = "20", value_parser = net_count)]
        limit: usize,
    },
    /// Processes with their thread counts.
    Threads {
        /// Processes to list (default 30, max 200).
        #[arg(value_name = "LIMIT", default_value = "30", value_parser = threads_count)]
        limit: usize,
    },
    /// Thermal zone temperatures.
    Thermal,
    /// Last lines of the kernel log.
    Dmesg {
        /// Lines to keep (default 50, max 500).
        #[arg(value_name = "LINES", default_value = "50", value_parser = dmesg_count)]
        lines: usize,
    },
    /// SELinux enforcement mode.
    Selinux,
    /// Device and build properties.
    Props,
    /// Whether tracefs is mounted and how it is configured.
    Tracefs,
}

fn count_parser(value: &str, max: usize) -> Result<usize, String> {
    parse_count(value, max).map_err(|e| e.to_string())
}

fn dmesg_count(value: &str) -> Result<usize, String> {
    count_parser(value, 500)
}

fn report_dmesg_count(value: &str) -> Result<usize, String> {
    count_parser(value, 200)
}

fn net_count(value: &str) -> Result<usize, String> {
    count_parser(value, 200)
}

fn threads_count(value: &str) -> Result<usize, String> {
    count_parser(value, 200)
}

/// Builds the log filter. A non-empty `RUST_LOG` wins outright; otherwise
/// `level` applies to the droidprobe targets.
fn log_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    if let Some(filter) = rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
    {
        return filter;
    }
    let mut filter = EnvFilter::default();
    for target in ["droidprobe", "droidprobe_core"] {
        if let Ok(directive) = format!("{target}={level}").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is WARN so that stdout carries only the report.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(level, rust_log.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_config(args: &Args) -> ProbeConfig {
    let mut config = ProbeConfig {
        proc_root: args.proc_path.clone(),
        sys_root: args.sys_path.clone(),
        thermal_max_zones: args.max_zones,
        command_timeout: args.timeout_ms.map(Duration::from_millis),
        ..ProbeConfig::default()
    };
    config.elevation.enabled = !args.no_elevate;
    config.elevation.program = args.su_program.trim().to_string();
    config
}

/// Sections for a subcommand, in display order.
fn probes(command: &Command) -> Vec<Probe> {
    match command {
        Command::Report { dmesg } => {
            let mut probes = vec![Probe::Uname, Probe::Uptime, Probe::MemInfo, Probe::Thermal];
            if let Some(lines) = dmesg.and_then(NonZeroUsize::new) {
                probes.push(Probe::KernelLog { lines });
            }
            probes
        }
        Command::Uname => vec![Probe::Uname],
        Command::Uptime => vec![Probe::Uptime],
        Command::Mem => vec![Probe::MemInfo],
        Command::Loadavg => vec![Probe::LoadAvg],
        Command::Mounts { all } => vec![Probe::Mounts { all: *all }],
        Command::Net { limit } => vec![
            Probe::Sockets {
                protocol: Protocol::Tcp,
                limit: *limit,
            },
            Probe::Sockets {
                protocol: Protocol::Udp,
                limit: *limit,
            },
        ],
        Command::Threads { limit } => vec![Probe::Processes { limit: *limit }],
        Command::Thermal => vec![Probe::Thermal],
        Command::Dmesg { lines } => NonZeroUsize::new(*lines)
            .map(|lines| vec![Probe::KernelLog { lines }])
            .unwrap_or_default(),
        Command::Selinux => vec![Probe::Selinux],
        Command::Props => vec![Probe::Properties],
        Command::Tracefs => vec![Probe::Tracefs],
    }
}

/// Command line suggested when a section is blocked by access control.
fn hint_command(program: &str) -> String {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    format!("{program} -c \"droidprobe {}\"", argv.join(" "))
}

fn print_report(report: &Report, json: bool, hint: String) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", TextReport::new(report).with_hint_command(hint));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let config = build_config(&args);
    if let Err(e) = config.validate() {
        eprintln!("droidprobe: {e}");
        return ExitCode::from(EXIT_CONFIG);
    }
    debug!(
        "Config: proc={}, sys={}, elevate={}, su={}, max_zones={}",
        config.proc_root.display(),
        config.sys_root.display(),
        config.elevation.enabled,
        config.elevation.program,
        config.thermal_max_zones
    );

    let hint = hint_command(&config.elevation.program);
    let resolver = SourceResolver::new(RealFs::new(), config);
    let report = probes(&args.command)
        .into_iter()
        .fold(Aggregator::new(&resolver), Aggregator::probe)
        .run();

    if let Err(e) = print_report(&report, args.json, hint) {
        error!("Failed to serialize report: {}", e);
        return ExitCode::from(EXIT_UNAVAILABLE);
    }

    if report.has_usable_output() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_UNAVAILABLE)
    }
}
