use async_trait::async_trait;

use crate::flags::InitFlags;
use crate::ports::GuestPorts;

/// The sandboxed program.
///
/// Implementations hold the guest's own logic; the host only knows that a
/// guest is constructed with [`InitFlags`] and speaks through its ports.
/// A guest that wants to touch the world — print, read a file, set the
/// process status — emits a message and, for capability calls, awaits the
/// reply carrying its own correlation tag.
///
/// Exactly one guest runs per host, per process lifetime.
#[async_trait]
pub trait Guest: Send + 'static {
    /// Runs the guest to completion.
    ///
    /// Returning (and thereby dropping `ports`) is the natural-completion
    /// signal the host watches for. An `Err` is logged by the shell; it
    /// does not change the termination status by itself.
    async fn run(self, flags: InitFlags, ports: GuestPorts) -> anyhow::Result<()>
    where
        Self: Sized;
}
