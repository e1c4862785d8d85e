// elevd — Command Dispatcher
//
// Single synchronous entry point for the elevated helper: resolves a named
// command against the fixed catalog, converts the caller-supplied string
// parameters into the shapes the OS primitive expects (failing fast before
// any OS call), invokes the primitive, and writes outputs back into the
// same map. Outputs are staged and merged only on success, so a failure
// never leaves partial results behind. The request id is opaque: it is
// carried for the caller's correlation and never interpreted here.

mod error;

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::os::{OsBackend, PID_NOT_FOUND};

pub use error::DispatchError;

/// Caller-supplied parameter map, mutated in place to carry results back.
/// Keys are unique within one request; insertion order is irrelevant.
pub type Params = HashMap<String, String>;

/// The fixed, versioned command catalog. Adding a command means adding an
/// entry here, a handler arm below, and a primitive on `OsBackend` — there
/// is no dynamic registration.
pub const SUPPORTED_COMMANDS: &[&str] = &[
    "sleep",
    "getParentPid",
    "findProcessByName",
    "findOwnerByEndpoint",
    "torCookiePaths",
];

/// Routes commands to one injected `OsBackend`. Constructed once at helper
/// startup and handed to the transport layer; holds no per-request state,
/// so one instance serves concurrent callers.
pub struct Dispatcher {
    backend: Arc<dyn OsBackend>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn OsBackend>) -> Self {
        Self { backend }
    }

    /// Execute one command synchronously. On success `params` holds any
    /// output values; on failure `params` is left exactly as received.
    pub fn dispatch(
        &self,
        id: &str,
        command: &str,
        params: &mut Params,
    ) -> Result<(), DispatchError> {
        tracing::debug!(request = id, command, "dispatching");
        let outputs = match command {
            "sleep" => self.cmd_sleep(params),
            "getParentPid" => self.cmd_get_parent_pid(params),
            "findProcessByName" => self.cmd_find_process_by_name(params),
            "findOwnerByEndpoint" => self.cmd_find_owner_by_endpoint(params),
            "torCookiePaths" => self.cmd_tor_cookie_paths(params),
            other => Err(DispatchError::UnknownCommand(other.to_string())),
        };
        match outputs {
            Ok(outputs) => {
                params.extend(outputs);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(request = id, command, error = %e, "command failed");
                Err(e)
            }
        }
    }

    fn cmd_sleep(&self, params: &Params) -> Result<Vec<(String, String)>, DispatchError> {
        let ms = require_u64(params, "ms")?;
        self.backend.sleep(ms);
        Ok(Vec::new())
    }

    fn cmd_get_parent_pid(&self, params: &Params) -> Result<Vec<(String, String)>, DispatchError> {
        let parent = match params.get("pid") {
            Some(raw) => {
                let pid = parse_u32(raw, "pid")?;
                self.backend.parent_pid_of(pid)?
            }
            None => Some(self.backend.self_parent_pid()?),
        };
        Ok(vec![("pid".to_string(), pid_value(parent))])
    }

    fn cmd_find_process_by_name(
        &self,
        params: &Params,
    ) -> Result<Vec<(String, String)>, DispatchError> {
        let name = require(params, "name")?;
        let pid = self.backend.pid_of_name(name)?;
        Ok(vec![("pid".to_string(), pid_value(pid))])
    }

    fn cmd_find_owner_by_endpoint(
        &self,
        params: &Params,
    ) -> Result<Vec<(String, String)>, DispatchError> {
        let local = require_endpoint(params, "localAddr", "localPort")?;
        let remote = require_endpoint(params, "remoteAddr", "remotePort")?;
        let pid = self.backend.pid_matching_endpoints(local, remote)?;
        Ok(vec![("pid".to_string(), pid_value(pid))])
    }

    fn cmd_tor_cookie_paths(
        &self,
        params: &Params,
    ) -> Result<Vec<(String, String)>, DispatchError> {
        let path = require(params, "path")?;
        let username = require(params, "username")?;
        let candidates = self.backend.tor_cookie_paths(path, username);
        let joined = candidates
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(vec![("paths".to_string(), joined)])
    }
}

// ─── Parameter Extraction ────────────────────────────────────────────────────

/// Not-found serialization at the string boundary.
fn pid_value(pid: Option<u32>) -> String {
    match pid {
        Some(pid) => pid.to_string(),
        None => PID_NOT_FOUND.to_string(),
    }
}

fn require<'a>(params: &'a Params, key: &str) -> Result<&'a str, DispatchError> {
    params
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| DispatchError::InvalidParameters(format!("missing '{key}'")))
}

fn require_u64(params: &Params, key: &str) -> Result<u64, DispatchError> {
    require(params, key)?
        .parse::<u64>()
        .map_err(|_| DispatchError::InvalidParameters(format!("'{key}' is not a number")))
}

fn parse_u32(raw: &str, key: &str) -> Result<u32, DispatchError> {
    raw.parse::<u32>()
        .map_err(|_| DispatchError::InvalidParameters(format!("'{key}' is not a process id")))
}

fn require_endpoint(
    params: &Params,
    addr_key: &str,
    port_key: &str,
) -> Result<SocketAddr, DispatchError> {
    let addr = require(params, addr_key)?
        .parse::<IpAddr>()
        .map_err(|_| DispatchError::InvalidParameters(format!("'{addr_key}' is not an address")))?;
    let port = require(params, port_key)?
        .parse::<u16>()
        .map_err(|_| DispatchError::InvalidParameters(format!("'{port_key}' is not a port")))?;
    Ok(SocketAddr::new(addr, port))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::mock::MockBackend;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn dispatcher(backend: MockBackend) -> Dispatcher {
        Dispatcher::new(Arc::new(backend))
    }

    #[test]
    fn test_unknown_command_leaves_params_untouched() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("name", "tor")]);
        let before = p.clone();
        let err = d.dispatch("1", "reticulate", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownCommand(_)));
        assert_eq!(p, before, "failure must not write output keys");
    }

    #[test]
    fn test_sleep_invokes_backend_and_writes_nothing() {
        let backend = Arc::new(MockBackend::new());
        let d = Dispatcher::new(backend.clone());
        let mut p = params(&[("ms", "50")]);
        let before = p.clone();
        d.dispatch("1", "sleep", &mut p).unwrap();
        assert_eq!(p, before, "sleep produces no output parameters");
        assert_eq!(*backend.sleeps.lock().unwrap(), vec![50]);
    }

    #[test]
    fn test_sleep_rejects_non_numeric_ms() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("ms", "soon")]);
        let before = p.clone();
        let err = d.dispatch("1", "sleep", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn test_find_process_by_name_found() {
        let mut backend = MockBackend::new();
        backend.names.insert("tor".to_string(), 4242);
        let d = dispatcher(backend);
        let mut p = params(&[("name", "tor")]);
        d.dispatch("2", "findProcessByName", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("4242"));
    }

    #[test]
    fn test_find_process_by_name_absent_is_sentinel_success() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("name", "doesnotexist123")]);
        d.dispatch("2", "findProcessByName", &mut p).unwrap();
        assert_eq!(
            p.get("pid").map(String::as_str),
            Some("-1"),
            "absence is a sentinel, never a failure"
        );
    }

    #[test]
    fn test_find_process_by_name_missing_key() {
        let d = dispatcher(MockBackend::new());
        let mut p = Params::new();
        let err = d.dispatch("2", "findProcessByName", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(_)));
        assert!(p.is_empty());
    }

    #[test]
    fn test_get_parent_pid_of_self() {
        let backend = MockBackend {
            self_parent: 1000,
            ..MockBackend::new()
        };
        let d = dispatcher(backend);
        let mut p = Params::new();
        d.dispatch("3", "getParentPid", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("1000"));
    }

    #[test]
    fn test_get_parent_pid_by_pid() {
        let mut backend = MockBackend::new();
        backend.parents.insert(555, 500);
        let d = dispatcher(backend);
        let mut p = params(&[("pid", "555")]);
        d.dispatch("3", "getParentPid", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("500"));
    }

    #[test]
    fn test_get_parent_pid_of_vanished_process() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("pid", "99999")]);
        d.dispatch("3", "getParentPid", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("-1"));
    }

    #[test]
    fn test_get_parent_pid_rejects_garbage_pid() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("pid", "-5")]);
        let err = d.dispatch("3", "getParentPid", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(_)));
    }

    #[test]
    fn test_find_owner_by_endpoint_found() {
        let mut backend = MockBackend::new();
        backend.endpoints.insert(
            (
                "127.0.0.1:9050".parse().unwrap(),
                "0.0.0.0:0".parse().unwrap(),
            ),
            777,
        );
        let d = dispatcher(backend);
        let mut p = params(&[
            ("localAddr", "127.0.0.1"),
            ("localPort", "9050"),
            ("remoteAddr", "0.0.0.0"),
            ("remotePort", "0"),
        ]);
        d.dispatch("4", "findOwnerByEndpoint", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("777"));
    }

    #[test]
    fn test_find_owner_by_endpoint_no_match_is_sentinel() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[
            ("localAddr", "10.0.0.1"),
            ("localPort", "1"),
            ("remoteAddr", "10.0.0.2"),
            ("remotePort", "2"),
        ]);
        d.dispatch("4", "findOwnerByEndpoint", &mut p).unwrap();
        assert_eq!(p.get("pid").map(String::as_str), Some("-1"));
    }

    #[test]
    fn test_find_owner_by_endpoint_bad_port_no_partial_output() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[
            ("localAddr", "127.0.0.1"),
            ("localPort", "not-a-port"),
            ("remoteAddr", "0.0.0.0"),
            ("remotePort", "0"),
        ]);
        let before = p.clone();
        let err = d.dispatch("4", "findOwnerByEndpoint", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidParameters(_)));
        assert_eq!(p, before, "no OS call output may leak on a failure path");
    }

    #[test]
    fn test_backend_io_failure_surfaces_as_operation_failed() {
        let backend = MockBackend {
            fail_io: true,
            ..MockBackend::new()
        };
        let d = dispatcher(backend);
        let mut p = params(&[("name", "tor")]);
        let before = p.clone();
        let err = d.dispatch("5", "findProcessByName", &mut p).unwrap_err();
        assert!(matches!(err, DispatchError::OperationFailed(_)));
        assert_eq!(p, before);
    }

    #[test]
    fn test_tor_cookie_paths_uses_default_candidates() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("path", "/opt/tor/bin/tor"), ("username", "alice")]);
        d.dispatch("6", "torCookiePaths", &mut p).unwrap();
        assert_eq!(
            p.get("paths").map(String::as_str),
            Some("/opt/tor/bin/data/control_auth_cookie")
        );
    }

    #[test]
    fn test_tor_cookie_paths_can_be_empty() {
        let d = dispatcher(MockBackend::new());
        let mut p = params(&[("path", ""), ("username", "")]);
        d.dispatch("6", "torCookiePaths", &mut p).unwrap();
        assert_eq!(p.get("paths").map(String::as_str), Some(""));
    }

    #[test]
    fn test_catalog_matches_dispatch_arms() {
        let d = dispatcher(MockBackend::new());
        for command in SUPPORTED_COMMANDS {
            let mut p = Params::new();
            let result = d.dispatch("7", command, &mut p);
            // Every catalog entry must resolve past command lookup: the
            // only acceptable failure with empty params is a parameter one.
            match result {
                Ok(()) => {}
                Err(DispatchError::InvalidParameters(_)) => {}
                Err(other) => panic!("catalog entry {command} failed lookup: {other}"),
            }
        }
    }
}
