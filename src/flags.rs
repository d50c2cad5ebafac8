//! The one-shot startup value handed to the guest.

use std::collections::HashMap;

use chrono::Local;
use serde::Serialize;

/// Immutable snapshot the guest starts from.
///
/// Collected once by the host shell before the guest is constructed and
/// never mutated afterwards; the guest owns it after handoff. Serializable
/// so guests that speak JSON internally can pass it straight through.
#[derive(Debug, Clone, Serialize)]
pub struct InitFlags {
    /// Command-line arguments, program name excluded.
    pub args: Vec<String>,
    /// Startup instant as milliseconds since the Unix epoch.
    pub time_ms: i64,
    /// Local offset from UTC in minutes (UTC+02:00 → 120).
    pub zone_offset_minutes: i32,
    /// Full environment snapshot at startup.
    pub env: HashMap<String, String>,
}

impl InitFlags {
    /// Collects flags from the live process environment.
    pub fn collect() -> Self {
        let now = Local::now();
        Self {
            args: std::env::args().skip(1).collect(),
            time_ms: now.timestamp_millis(),
            zone_offset_minutes: now.offset().local_minus_utc() / 60,
            env: std::env::vars().collect(),
        }
    }
}
