// elevd — Unix Domain Socket Service
//
// The thin transport in front of the dispatcher: listens on an owner-only
// Unix socket for newline-delimited JSON command frames from the
// unprivileged controller and writes one response line per request. Each
// connection runs in its own task; each dispatch runs on the blocking pool
// so a long `sleep` never stalls the accept loop or other callers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use crate::dispatch::Dispatcher;

use super::caller::CallerInfo;
use super::protocol::{HelperRequest, HelperResponse};

/// UDS front end over one shared dispatcher.
pub struct HelperService {
    dispatcher: Arc<Dispatcher>,
    socket_path: PathBuf,
}

impl HelperService {
    pub fn new(dispatcher: Dispatcher, socket_path: PathBuf) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            socket_path,
        }
    }

    /// Default socket path: `$XDG_RUNTIME_DIR/elevd/elevd.sock`, falling
    /// back to `/run/elevd/elevd.sock` for the usual root-service case.
    pub fn default_socket_path() -> PathBuf {
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/run"));
        runtime_dir.join("elevd").join("elevd.sock")
    }

    /// Serve until the process is terminated. Individual command failures
    /// are reported to their caller and never tear the service down.
    pub async fn run(&self) -> crate::Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        // Owner-only: the controller reaches us through socket ownership,
        // nothing else on the system should.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        tracing::info!(
            socket = %self.socket_path.display(),
            "elevated helper listening"
        );

        loop {
            let (stream, _addr) = listener.accept().await?;
            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, dispatcher).await {
                    tracing::error!(error = %e, "connection handler error");
                }
            });
        }
    }
}

/// Serve one connection: read frames line by line, answer in order.
async fn handle_connection(
    stream: tokio::net::UnixStream,
    dispatcher: Arc<Dispatcher>,
) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        if let Ok(cred) = stream.peer_cred() {
            let pid = cred.pid().unwrap_or(0) as u32;
            let caller = CallerInfo::from_pid(pid);
            tracing::info!(%caller, "controller connected");
        }
    }

    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let dispatcher = Arc::clone(&dispatcher);
        // Dispatch is synchronous by contract; run it off the async
        // workers so it blocks only its own request.
        let response = tokio::task::spawn_blocking(move || process_request(&dispatcher, &line))
            .await
            .unwrap_or_else(|e| HelperResponse::malformed(format!("dispatch task failed: {e}")));
        let mut json = serde_json::to_string(&response)?;
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Decode one frame and run it through the dispatcher.
fn process_request(dispatcher: &Dispatcher, raw: &str) -> HelperResponse {
    let request: HelperRequest = match serde_json::from_str(raw) {
        Ok(request) => request,
        Err(e) => return HelperResponse::malformed(format!("undecodable frame: {e}")),
    };

    let HelperRequest {
        id,
        command,
        mut params,
    } = request;

    match dispatcher.dispatch(&id, &command, &mut params) {
        Ok(()) => HelperResponse::success(id, params),
        Err(e) => HelperResponse::failure(id, &e),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::os::mock::MockBackend;

    fn test_dispatcher() -> Dispatcher {
        let mut backend = MockBackend::new();
        backend.names.insert("tor".to_string(), 4242);
        Dispatcher::new(Arc::new(backend))
    }

    #[test]
    fn test_request_round_trip_success() {
        let d = test_dispatcher();
        let raw = r#"{"id":"2","command":"findProcessByName","params":{"name":"tor"}}"#;
        let resp = process_request(&d, raw);
        assert!(resp.ok);
        assert_eq!(resp.id, "2");
        assert_eq!(resp.params.get("pid").map(String::as_str), Some("4242"));
    }

    #[test]
    fn test_not_found_is_success_with_sentinel() {
        let d = test_dispatcher();
        let raw = r#"{"id":"2","command":"findProcessByName","params":{"name":"doesnotexist123"}}"#;
        let resp = process_request(&d, raw);
        assert!(resp.ok, "not-found must not be reported as a failure");
        assert_eq!(resp.params.get("pid").map(String::as_str), Some("-1"));
    }

    #[test]
    fn test_unknown_command_reported() {
        let d = test_dispatcher();
        let raw = r#"{"id":"3","command":"flushDns","params":{}}"#;
        let resp = process_request(&d, raw);
        assert!(!resp.ok);
        assert_eq!(resp.id, "3", "id passes through unchanged");
        assert_eq!(resp.error.unwrap().kind, "unknownCommand");
    }

    #[test]
    fn test_invalid_parameters_reported_without_output() {
        let d = test_dispatcher();
        let raw = r#"{"id":"4","command":"sleep","params":{"ms":"never"}}"#;
        let resp = process_request(&d, raw);
        assert!(!resp.ok);
        assert!(resp.params.is_empty());
        assert_eq!(resp.error.unwrap().kind, "invalidParameters");
    }

    #[test]
    fn test_undecodable_frame_is_malformed() {
        let d = test_dispatcher();
        let resp = process_request(&d, "not json at all");
        assert!(!resp.ok);
        assert_eq!(resp.error.unwrap().kind, super::super::protocol::KIND_MALFORMED);
    }

    #[test]
    fn test_default_socket_path_shape() {
        let path = HelperService::default_socket_path();
        assert!(path.to_string_lossy().ends_with("elevd/elevd.sock"));
    }
}
