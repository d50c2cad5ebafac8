//! Message types and the port set connecting guest and host.
//!
//! Four bounded channels make up the boundary: output (guest→host),
//! requests (guest→host), responses (host→guest) and exit (guest→host).
//! The guest holds one end of each; the bridge holds the mirror ends.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::marshal::StructuredError;

/// A capability call emitted by the guest.
///
/// `tag` is whatever correlation value the guest chose. The bridge echoes
/// it back verbatim and never inspects or generates one — correlation is
/// owned by the guest, not the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsRequest {
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub tag: Value,
}

/// The settled outcome of one capability call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsOutcome {
    Ok(Value),
    Error(StructuredError),
}

impl FsOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FsOutcome::Ok(_))
    }
}

/// The reply to one [`FsRequest`]. Delivered at most once per request.
///
/// Serializes flat: `{"method": …, "tag": …, "ok": …}` on success,
/// `{"method": …, "tag": …, "error": {"message": …, "code": …}}` on
/// failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsResponse {
    pub method: String,
    pub tag: Value,
    #[serde(flatten)]
    pub outcome: FsOutcome,
}

/// Guest-side ends of the message ports.
pub struct GuestPorts {
    /// Fire-and-forget console output, rendered in emission order.
    pub output: mpsc::Sender<String>,
    /// Capability calls; each accepted one gets exactly one reply on
    /// `responses`.
    pub requests: mpsc::Sender<FsRequest>,
    /// Replies to `requests`, in completion order — correlate by tag.
    pub responses: mpsc::Receiver<FsResponse>,
    /// Terminal signal. The first one observed becomes the process
    /// status; the ports are dead afterwards.
    pub exit: mpsc::Sender<i32>,
}

/// Host-side ends, owned by the bridge.
pub(crate) struct HostPorts {
    pub output: mpsc::Receiver<String>,
    pub requests: mpsc::Receiver<FsRequest>,
    pub responses: mpsc::Sender<FsResponse>,
    pub exit: mpsc::Receiver<i32>,
}

/// Builds the four bounded channels connecting one guest to its host.
pub(crate) fn wire(capacity: usize) -> (GuestPorts, HostPorts) {
    let (output_tx, output_rx) = mpsc::channel(capacity);
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (response_tx, response_rx) = mpsc::channel(capacity);
    let (exit_tx, exit_rx) = mpsc::channel(capacity);

    (
        GuestPorts {
            output: output_tx,
            requests: request_tx,
            responses: response_rx,
            exit: exit_tx,
        },
        HostPorts {
            output: output_rx,
            requests: request_rx,
            responses: response_tx,
            exit: exit_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response_serializes_flat() {
        let response = FsResponse {
            method: "read_file".to_string(),
            tag: json!(7),
            outcome: FsOutcome::Ok(json!("contents")),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({ "method": "read_file", "tag": 7, "ok": "contents" })
        );
    }

    #[test]
    fn test_error_response_serializes_flat() {
        let response = FsResponse {
            method: "read_file".to_string(),
            tag: json!("req-1"),
            outcome: FsOutcome::Error(StructuredError::unknown_method("nope")),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], "ENOSYS");
        assert_eq!(value["tag"], "req-1");
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: FsRequest =
            serde_json::from_value(json!({ "method": "read_file" })).unwrap();
        assert_eq!(request.method, "read_file");
        assert!(request.args.is_empty());
        assert_eq!(request.tag, Value::Null);
    }

    #[test]
    fn test_response_roundtrip_preserves_tag_shape() {
        // Tags are opaque: objects, arrays and strings all come back as sent.
        let tag = json!({ "seq": 42, "origin": "guest" });
        let response = FsResponse {
            method: "write_file".to_string(),
            tag: tag.clone(),
            outcome: FsOutcome::Ok(Value::Null),
        };
        let text = serde_json::to_string(&response).unwrap();
        let back: FsResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back.tag, tag);
        assert!(back.outcome.is_ok());
    }

    #[tokio::test]
    async fn test_wire_connects_guest_to_host() {
        let (mut guest, mut host) = wire(4);

        guest.output.send("hello".to_string()).await.unwrap();
        assert_eq!(host.output.recv().await.unwrap(), "hello");

        host.responses
            .send(FsResponse {
                method: "exists".to_string(),
                tag: json!(1),
                outcome: FsOutcome::Ok(json!(true)),
            })
            .await
            .unwrap();
        let reply = guest.responses.recv().await.unwrap();
        assert_eq!(reply.method, "exists");
    }
}
