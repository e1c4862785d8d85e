// elevd — Command Protocol Types
//
// Wire frames for the helper's command protocol: one JSON object per line,
// request in / response out. The transport only decodes the mapping; the
// dispatcher owns command semantics. The request id is an opaque token
// echoed back so the unprivileged caller can correlate responses.

use serde::{Deserialize, Serialize};

use crate::dispatch::{DispatchError, Params};

/// One inbound command frame.
#[derive(Debug, Deserialize)]
pub struct HelperRequest {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub params: Params,
}

/// One outbound response frame. On failure `params` is empty: a failed
/// command never returns partial output.
#[derive(Debug, Serialize)]
pub struct HelperResponse {
    pub id: String,
    pub ok: bool,
    pub params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HelperError>,
}

#[derive(Debug, Serialize)]
pub struct HelperError {
    pub kind: String,
    pub message: String,
}

/// Error kind for frames that never reached the dispatcher.
pub const KIND_MALFORMED: &str = "malformedRequest";

impl HelperResponse {
    pub fn success(id: String, params: Params) -> Self {
        Self {
            id,
            ok: true,
            params,
            error: None,
        }
    }

    pub fn failure(id: String, error: &DispatchError) -> Self {
        Self {
            id,
            ok: false,
            params: Params::new(),
            error: Some(HelperError {
                kind: error.kind().to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// Response to a frame that could not be decoded; the id is empty
    /// because it never parsed.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            ok: false,
            params: Params::new(),
            error: Some(HelperError {
                kind: KIND_MALFORMED.to_string(),
                message: message.into(),
            }),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
