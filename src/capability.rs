//! The closed table of named OS operations reachable from the guest.
//!
//! All I/O in this module uses `tokio::fs` so a slow disk never blocks
//! the async runtime.

use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use crate::marshal::StructuredError;

/// Pass-through adapter over the OS filesystem primitives.
///
/// Each operation takes positional JSON arguments and settles to a JSON
/// value or a marshaled error. No retries, no caching, and no validation
/// beyond matching the argument shapes — everything else is the OS
/// primitive's own business. Operations are independently safe to run
/// concurrently; the adapter imposes no locking of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityAdapter;

impl CapabilityAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Executes `method` against the OS.
    ///
    /// Unknown names are rejected here, not resolved reflectively: the
    /// reachable surface is exactly the arms of this match. Every failure
    /// comes back as a value for the caller to deliver.
    pub async fn call(&self, method: &str, args: &[Value]) -> Result<Value, StructuredError> {
        match method {
            "read_file" => {
                let path = path_arg(method, args)?;
                let contents = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                Ok(Value::String(contents))
            }
            "write_file" => {
                let (path, contents) = path_and_contents(method, args)?;
                tokio::fs::write(&path, contents.as_bytes())
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                Ok(Value::Null)
            }
            "append_file" => {
                let (path, contents) = path_and_contents(method, args)?;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                file.write_all(contents.as_bytes())
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                file.flush()
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                Ok(Value::Null)
            }
            "exists" => {
                let path = path_arg(method, args)?;
                let exists = tokio::fs::try_exists(&path)
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                Ok(Value::Bool(exists))
            }
            "list_dir" => {
                let path = path_arg(method, args)?;
                let mut entries = tokio::fs::read_dir(&path)
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?;
                let mut listed = Vec::new();
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| StructuredError::from_io(&e))?
                {
                    let meta = entry
                        .metadata()
                        .await
                        .map_err(|e| StructuredError::from_io(&e))?;
                    listed.push(json!({
                        "name": entry.file_name().to_string_lossy(),
                        "is_dir": meta.is_dir(),
                        "size": meta.len(),
                    }));
                }
                Ok(Value::Array(listed))
            }
            _ => Err(StructuredError::unknown_method(method)),
        }
    }
}

fn path_arg(method: &str, args: &[Value]) -> Result<String, StructuredError> {
    match args.first() {
        Some(Value::String(path)) => Ok(path.clone()),
        _ => Err(StructuredError::bad_args(
            method,
            "expected a path string as the first argument",
        )),
    }
}

fn path_and_contents(method: &str, args: &[Value]) -> Result<(String, String), StructuredError> {
    let path = path_arg(method, args)?;
    match args.get(1) {
        Some(Value::String(contents)) => Ok((path, contents.clone())),
        _ => Err(StructuredError::bad_args(
            method,
            "expected string contents as the second argument",
        )),
    }
}
