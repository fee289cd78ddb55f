//! In-memory mock filesystem for testing probes without a real device.
//!
//! `MockFs` simulates `/proc` and `/sys` in memory, including paths that
//! exist but are blocked by access control, so resolver fallbacks can be
//! exercised on any host.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use crate::collector::lines::{LineStream, LossyLines};
use crate::collector::traits::FileSystem;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File(String),
    Dir,
}

/// In-memory filesystem for testing.
///
/// Directory listings come back in path order.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    nodes: BTreeMap<PathBuf, Node>,
    /// Paths that exist but fail with `PermissionDenied`.
    denied: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating missing parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        self.mkdir_parents(path);
        self.nodes.insert(path.to_path_buf(), Node::File(content.into()));
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        self.mkdir_parents(path);
        self.nodes.entry(path.to_path_buf()).or_insert(Node::Dir);
    }

    /// Marks a path as present but unreadable, like a file guarded by
    /// SELinux policy.
    ///
    /// If nothing exists at `path` yet it is added as an empty file. A
    /// denied directory also hides its descendants: looking one up fails
    /// with `PermissionDenied` whether or not it exists.
    pub fn deny(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        if !self.nodes.contains_key(path) {
            self.add_file(path, "");
        }
        self.denied.insert(path.to_path_buf());
    }

    /// Adds `/proc/<pid>/status` for a single-threaded-group process.
    pub fn add_process(&mut self, pid: u32, name: &str, state: &str, threads: u32) {
        let status = format!(
            "Name:\t{name}\nUmask:\t0077\nState:\t{state}\nTgid:\t{pid}\nPid:\t{pid}\nPPid:\t1\nThreads:\t{threads}\n"
        );
        self.add_file(format!("/proc/{pid}/status"), status);
    }

    /// Adds `thermal_zone<index>` with its `type` and `temp` files.
    pub fn add_thermal_zone(&mut self, index: u32, zone_type: &str, temp: &str) {
        let zone = PathBuf::from(format!("/sys/class/thermal/thermal_zone{index}"));
        self.add_file(zone.join("type"), format!("{zone_type}\n"));
        self.add_file(zone.join("temp"), format!("{temp}\n"));
    }

    fn mkdir_parents(&mut self, path: &Path) {
        for dir in path.ancestors().skip(1) {
            if dir.as_os_str().is_empty() {
                continue;
            }
            self.nodes.entry(dir.to_path_buf()).or_insert(Node::Dir);
        }
    }

    /// Fails with `PermissionDenied` when a denied directory sits above
    /// `path`.
    fn search(&self, path: &Path) -> io::Result<()> {
        match path.ancestors().skip(1).find(|dir| self.denied.contains(*dir)) {
            Some(_) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            )),
            None => Ok(()),
        }
    }

    fn lookup(&self, path: &Path) -> io::Result<&Node> {
        self.search(path)?;
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))?;
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                path.display().to_string(),
            ));
        }
        Ok(node)
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.lookup(path)? {
            Node::File(content) => Ok(content.clone()),
            Node::Dir => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                path.display().to_string(),
            )),
        }
    }

    fn try_exists(&self, path: &Path) -> io::Result<bool> {
        self.search(path)?;
        Ok(self.nodes.contains_key(path))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if *self.lookup(path)? != Node::Dir {
            return Err(io::Error::new(
                io::ErrorKind::NotADirectory,
                path.display().to_string(),
            ));
        }
        // Descendants sort directly after `path`; keep only direct children.
        Ok(self
            .nodes
            .range(path.to_path_buf()..)
            .skip(1)
            .map(|(p, _)| p)
            .take_while(|p| p.starts_with(path))
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    fn open_lines(&self, path: &Path) -> io::Result<LineStream<'static>> {
        let content = self.read_to_string(path)?;
        Ok(Box::new(LossyLines::new(Cursor::new(content.into_bytes()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_file_creates_parents() {
        let mut fs = MockFs::new();
        fs.add_thermal_zone(0, "cpu-0-0-usr", "43600");

        for dir in ["/sys", "/sys/class/thermal", "/sys/class/thermal/thermal_zone0"] {
            assert!(fs.exists(Path::new(dir)), "{dir}");
        }
        let temp = fs
            .read_to_string(Path::new("/sys/class/thermal/thermal_zone0/temp"))
            .unwrap();
        assert_eq!(temp, "43600\n");
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_process(1, "init", "S (sleeping)", 1);
        fs.add_process(2, "kthreadd", "S (sleeping)", 1);
        fs.add_file("/proc/uptime", "1.0 1.0\n");

        let proc_entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(
            proc_entries,
            vec![
                PathBuf::from("/proc/1"),
                PathBuf::from("/proc/2"),
                PathBuf::from("/proc/uptime"),
            ]
        );

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).unwrap();
        assert_eq!(proc1_entries, vec![PathBuf::from("/proc/1/status")]);
    }

    #[test]
    fn test_mock_fs_deny() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/net/tcp", "header\n");
        fs.deny("/proc/net/tcp");
        fs.deny("/sys/fs/selinux/enforce");

        assert!(fs.exists(Path::new("/proc/net/tcp")));
        assert!(fs.exists(Path::new("/sys/fs/selinux/enforce")));
        let err = fs.read_to_string(Path::new("/proc/net/tcp")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.open_lines(Path::new("/proc/net/tcp")).is_err());
    }

    #[test]
    fn test_mock_fs_denied_dir_hides_children() {
        let mut fs = MockFs::new();
        fs.add_thermal_zone(0, "cpu", "45000");
        fs.deny("/sys/class/thermal");

        let zone0 = Path::new("/sys/class/thermal/thermal_zone0");
        let zone7 = Path::new("/sys/class/thermal/thermal_zone7");
        for path in [zone0, zone7] {
            let err = fs.try_exists(path).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
            assert!(fs.exists(path));
        }
        let err = fs.read_to_string(&zone0.join("temp")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.read_dir(Path::new("/sys/class/thermal")).is_err());
        assert!(!fs.exists(Path::new("/sys/kernel/tracing")));
    }

    #[test]
    fn test_mock_fs_open_lines() {
        let mut fs = MockFs::new();
        fs.add_file("/var/log/kmsg", "one\r\ntwo\n");
        let lines: Vec<String> = fs
            .open_lines(Path::new("/var/log/kmsg"))
            .unwrap()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_mock_fs_missing_and_wrong_kind() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/uptime", "1.0 1.0\n");
        let kind = |r: io::Result<()>| r.unwrap_err().kind();

        assert_eq!(
            kind(fs.read_to_string(Path::new("/nonexistent")).map(drop)),
            io::ErrorKind::NotFound
        );
        assert_eq!(
            kind(fs.read_to_string(Path::new("/proc")).map(drop)),
            io::ErrorKind::IsADirectory
        );
        assert_eq!(
            kind(fs.read_dir(Path::new("/proc/uptime")).map(drop)),
            io::ErrorKind::NotADirectory
        );
    }
}
