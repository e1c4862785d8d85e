// elevd — Caller Identity
//
// Resolves the unprivileged process connecting over the Unix domain socket
// from its peer-credential pid, for audit logging only. This is not
// authentication: the helper trusts socket permissions for access control
// and merely records who asked.

use std::path::PathBuf;

/// Identity of the process on the other end of the socket.
#[derive(Debug, Clone)]
pub struct CallerInfo {
    /// Process ID reported by the kernel's peer credentials.
    pub pid: u32,
    /// Resolved executable path, when `/proc/<pid>/exe` is readable. The
    /// caller may exit between connect and lookup, so this is best-effort.
    pub exe_path: Option<PathBuf>,
}

impl CallerInfo {
    pub fn from_pid(pid: u32) -> Self {
        let exe_path = std::fs::read_link(format!("/proc/{pid}/exe")).ok();
        Self { pid, exe_path }
    }
}

impl std::fmt::Display for CallerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.exe_path {
            Some(path) => write!(f, "pid:{} exe:{}", self.pid, path.display()),
            None => write!(f, "pid:{} exe:?", self.pid),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
