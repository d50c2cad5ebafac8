//! Marshaling of native failures into boundary-safe error values.
//!
//! Whatever goes wrong inside a capability call — an OS error, a bad
//! argument list, an unknown method name — crosses back into the guest as
//! a [`StructuredError`]: plain serializable data, never a handle, a
//! backtrace, or a panic.

use std::io;

use serde::{Deserialize, Serialize};

/// A native failure in a shape safe to hand to the guest.
///
/// `code` carries the conventional errno mnemonic when the failure maps
/// onto one, so guest logic can branch on `"ENOENT"` instead of parsing
/// message text. Failures with no structured mapping keep their message
/// and drop the code rather than guessing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl StructuredError {
    /// Marshals an OS-level I/O failure.
    pub fn from_io(err: &io::Error) -> Self {
        Self {
            message: err.to_string(),
            code: io_code(err.kind()).map(str::to_string),
        }
    }

    /// Protocol error: the request named an operation outside the
    /// capability table.
    pub fn unknown_method(method: &str) -> Self {
        Self {
            message: format!("unknown capability method: {method}"),
            code: Some("ENOSYS".to_string()),
        }
    }

    /// Protocol error: the argument list did not match the operation's
    /// signature.
    pub fn bad_args(method: &str, detail: &str) -> Self {
        Self {
            message: format!("{method}: {detail}"),
            code: Some("EINVAL".to_string()),
        }
    }

    /// A configured per-call timeout elapsed before the operation settled.
    pub fn timed_out(method: &str, secs: u64) -> Self {
        Self {
            message: format!("{method} did not settle within {secs}s"),
            code: Some("ETIMEDOUT".to_string()),
        }
    }

    /// Fallback for failure shapes with no structured mapping. The
    /// message always survives the boundary; nothing degrades to silence.
    pub fn generic(detail: impl Into<String>) -> Self {
        Self {
            message: detail.into(),
            code: None,
        }
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Errno mnemonic for the error kinds guests commonly branch on.
fn io_code(kind: io::ErrorKind) -> Option<&'static str> {
    use io::ErrorKind::*;
    match kind {
        NotFound => Some("ENOENT"),
        PermissionDenied => Some("EACCES"),
        AlreadyExists => Some("EEXIST"),
        NotADirectory => Some("ENOTDIR"),
        IsADirectory => Some("EISDIR"),
        DirectoryNotEmpty => Some("ENOTEMPTY"),
        InvalidInput => Some("EINVAL"),
        TimedOut => Some("ETIMEDOUT"),
        Interrupted => Some("EINTR"),
        BrokenPipe => Some("EPIPE"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_enoent() {
        let err = io::Error::new(io::ErrorKind::NotFound, "no such file");
        let marshaled = StructuredError::from_io(&err);
        assert_eq!(marshaled.code.as_deref(), Some("ENOENT"));
        assert!(marshaled.message.contains("no such file"));
    }

    #[test]
    fn test_permission_denied_maps_to_eacces() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let marshaled = StructuredError::from_io(&err);
        assert_eq!(marshaled.code.as_deref(), Some("EACCES"));
    }

    #[test]
    fn test_unmapped_kind_keeps_message_drops_code() {
        let err = io::Error::new(io::ErrorKind::Other, "something odd");
        let marshaled = StructuredError::from_io(&err);
        assert_eq!(marshaled.code, None);
        assert!(marshaled.message.contains("something odd"));
    }

    #[test]
    fn test_unknown_method_is_enosys() {
        let marshaled = StructuredError::unknown_method("format_disk");
        assert_eq!(marshaled.code.as_deref(), Some("ENOSYS"));
        assert!(marshaled.message.contains("format_disk"));
    }

    #[test]
    fn test_bad_args_is_einval() {
        let marshaled = StructuredError::bad_args("read_file", "expected a path string");
        assert_eq!(marshaled.code.as_deref(), Some("EINVAL"));
        assert!(marshaled.message.starts_with("read_file:"));
    }

    #[test]
    fn test_generic_never_drops_the_message() {
        let marshaled = StructuredError::generic("capability task failed: panicked");
        assert_eq!(marshaled.code, None);
        assert_eq!(marshaled.message, "capability task failed: panicked");
    }

    #[test]
    fn test_serialization_omits_missing_code() {
        let json = serde_json::to_value(StructuredError::generic("oops")).unwrap();
        assert_eq!(json, serde_json::json!({ "message": "oops" }));
    }

    #[test]
    fn test_serialization_roundtrip_with_code() {
        let original = StructuredError::unknown_method("nope");
        let json = serde_json::to_string(&original).unwrap();
        let back: StructuredError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
