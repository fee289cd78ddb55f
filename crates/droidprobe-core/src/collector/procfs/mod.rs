//! Parsers for the Linux `/proc` filesystem.
//!
//! Each parser turns one kernel text grammar into a typed record and
//! reports the lines it could not use.

pub mod parser;

pub use parser::{
    LoadAvg, MemInfo, MountEntry, ProcessStatus, SocketEntry, SocketState, Uname, Uptime,
    parse_loadavg, parse_meminfo, parse_mounts, parse_process_status, parse_socket_table,
    parse_status_block, parse_uname, parse_uptime,
};
