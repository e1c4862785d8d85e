// elevd — POSIX Backend
//
// procfs-backed implementation of the OS capability contract. Every lookup
// re-reads live kernel state; nothing is cached, so results track a
// fast-changing process/socket table at the cost of a rescan per call.
// The proc root is injectable so tests can fabricate process and socket
// tables in a tempdir instead of depending on the live system.

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::proc_net;
use super::{add_install_cookie_path, OsBackend};

/// `OsBackend` for POSIX systems with a procfs (Linux being the primary
/// target). Holds no mutable state: safe to share across request threads.
pub struct PosixBackend {
    proc_root: PathBuf,
}

impl PosixBackend {
    pub fn new() -> Self {
        Self::with_proc_root("/proc")
    }

    /// Backend over an alternate procfs root, for tests that fabricate
    /// `/proc` contents.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }

    /// Numeric entries under the proc root, i.e. the live pid set at scan
    /// time. Entries that vanish mid-scan are skipped by the callers.
    fn scan_pids(&self) -> io::Result<Vec<u32>> {
        let mut pids = Vec::new();
        for entry in std::fs::read_dir(&self.proc_root)? {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() {
                if pid > 0 {
                    pids.push(pid);
                }
            }
        }
        Ok(pids)
    }

    /// Lowest pid whose `/proc/<pid>/fd` holds a descriptor for the given
    /// socket inode. Lowest-pid tie-break keeps the answer deterministic
    /// when several processes share one socket after a fork.
    fn pid_owning_socket_inode(&self, inode: u64) -> io::Result<Option<u32>> {
        let target = format!("socket:[{inode}]");
        let mut owner: Option<u32> = None;
        for pid in self.scan_pids()? {
            let fd_dir = self.proc_root.join(pid.to_string()).join("fd");
            // Unreadable fd dirs mean the process exited or is off-limits;
            // either way it cannot be reported as the owner.
            let entries = match std::fs::read_dir(&fd_dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for fd in entries.flatten() {
                match std::fs::read_link(fd.path()) {
                    Ok(link) if link.as_os_str() == target.as_str() => {
                        owner = Some(owner.map_or(pid, |best| best.min(pid)));
                    }
                    _ => {}
                }
            }
        }
        Ok(owner)
    }

    fn read_net_table(&self, v6: bool) -> io::Result<Vec<proc_net::SockEntry>> {
        let name = if v6 { "tcp6" } else { "tcp" };
        let path = self.proc_root.join("net").join(name);
        let content = std::fs::read_to_string(path)?;
        Ok(proc_net::parse_table(&content, v6))
    }
}

impl Default for PosixBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl OsBackend for PosixBackend {
    fn sleep(&self, ms: u64) {
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn self_parent_pid(&self) -> io::Result<u32> {
        Ok(std::os::unix::process::parent_id())
    }

    fn parent_pid_of(&self, pid: u32) -> io::Result<Option<u32>> {
        let status_path = self.proc_root.join(pid.to_string()).join("status");
        let content = match std::fs::read_to_string(&status_path) {
            Ok(content) => content,
            // The pid vanished between the caller observing it and this
            // lookup. Expected race, not a failure.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("PPid:") {
                return rest.trim().parse::<u32>().map(Some).map_err(|e| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unparseable PPid for pid {pid}: {e}"),
                    )
                });
            }
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("no PPid field in {}", status_path.display()),
        ))
    }

    fn pid_of_name(&self, name: &str) -> io::Result<Option<u32>> {
        let mut found: Option<u32> = None;
        for pid in self.scan_pids()? {
            let comm_path = self.proc_root.join(pid.to_string()).join("comm");
            let comm = match std::fs::read_to_string(comm_path) {
                Ok(comm) => comm,
                Err(_) => continue,
            };
            if comm.trim_end_matches('\n') == name {
                found = Some(found.map_or(pid, |best| best.min(pid)));
            }
        }
        Ok(found)
    }

    fn pid_matching_endpoints(
        &self,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> io::Result<Option<u32>> {
        // Exact-tuple matching only: a family mismatch can never match a
        // table row, and wildcard addresses are not treated specially.
        if local.is_ipv4() != remote.is_ipv4() {
            return Ok(None);
        }
        let entries = self.read_net_table(!local.is_ipv4())?;
        let matched = entries
            .iter()
            .find(|entry| entry.local == local && entry.remote == remote);
        match matched {
            Some(entry) => self.pid_owning_socket_inode(entry.inode),
            None => Ok(None),
        }
    }

    fn tor_cookie_paths(&self, tor_path: &str, username: &str) -> Vec<PathBuf> {
        let mut result = Vec::new();
        add_install_cookie_path(tor_path, &mut result);
        if !username.is_empty() {
            result.push(
                Path::new("/home")
                    .join(username)
                    .join(".tor")
                    .join("control_auth_cookie"),
            );
        }
        result.push(PathBuf::from("/run/tor/control.authcookie"));
        result.push(PathBuf::from("/var/run/tor/control.authcookie"));
        result.push(PathBuf::from("/var/lib/tor/control_auth_cookie"));
        result
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
