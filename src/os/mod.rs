// elevd — OS Capability Contract
//
// Abstraction over the OS primitives the elevated helper performs on behalf
// of the unprivileged controller. The dispatcher is written once against
// this trait; one implementation exists per platform family. Lookups that
// legitimately find nothing return `Ok(None)` — absence is a frequent,
// expected outcome (processes exit, sockets close), never a failure.

mod posix;
mod proc_net;

use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub use posix::PosixBackend;

/// Wire sentinel for "no such process". Internal code uses `Option<u32>`;
/// the dispatcher serializes `None` as this value at the string boundary.
pub const PID_NOT_FOUND: i64 = -1;

/// OS primitives every platform backend must supply.
///
/// All methods are synchronous and must be safely callable from multiple
/// threads at once: every lookup re-reads live kernel state and nothing
/// here mutates shared state. No method may hold a lock across a blocking
/// OS call.
pub trait OsBackend: Send + Sync {
    /// Suspend the calling thread for at least `ms` milliseconds without
    /// busy-waiting. Blocks only its own thread, never the whole process.
    fn sleep(&self, ms: u64);

    /// Parent process id of the helper process itself.
    fn self_parent_pid(&self) -> io::Result<u32>;

    /// Parent process id of an arbitrary process. `Ok(None)` when `pid`
    /// no longer exists at call time (racing with process exit is normal).
    fn parent_pid_of(&self, pid: u32) -> io::Result<Option<u32>>;

    /// First process whose command name equals `name` exactly (case
    /// sensitivity follows the OS convention). When several processes share
    /// the name, the lowest pid wins so repeated calls over an unchanged
    /// process table stay deterministic.
    fn pid_of_name(&self, name: &str) -> io::Result<Option<u32>>;

    /// Process id owning the live socket whose local/remote tuples equal
    /// `local`/`remote` exactly (matching address family, no wildcard
    /// matching). `Ok(None)` when no live entry matches — the connection
    /// may have closed between observation and lookup.
    ///
    /// No generic heuristic exists above the platform layer, so the shared
    /// default finds nothing; platform backends override it.
    fn pid_matching_endpoints(
        &self,
        local: SocketAddr,
        remote: SocketAddr,
    ) -> io::Result<Option<u32>> {
        let _ = (local, remote);
        Ok(None)
    }

    /// Candidate locations of a Tor control authentication cookie for the
    /// given install path and acting username, most specific first. Pure
    /// path construction: nothing here touches the filesystem, and callers
    /// must probe each candidate themselves.
    ///
    /// The shared default knows only the install-relative layout
    /// (`<dir(tor_path)>/data/control_auth_cookie`); platform backends
    /// extend it with their system-wide conventions.
    fn tor_cookie_paths(&self, tor_path: &str, username: &str) -> Vec<PathBuf> {
        let _ = username;
        let mut result = Vec::new();
        add_install_cookie_path(tor_path, &mut result);
        result
    }
}

/// Append the install-relative cookie candidate, if an install path is known.
fn add_install_cookie_path(tor_path: &str, result: &mut Vec<PathBuf>) {
    if tor_path.is_empty() {
        return;
    }
    if let Some(dir) = Path::new(tor_path).parent() {
        result.push(dir.join("data").join("control_auth_cookie"));
    }
}

// ─── In-Memory Mock for Testing ──────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
