//! Portico hosts a sandboxed, side-effect-free guest program inside an
//! OS process and brokers every real-world effect — console output,
//! filesystem access, the process exit status — through typed async
//! message ports.
//!
//! The guest is opaque: anything implementing [`Guest`] can be hosted.
//! It receives a one-shot [`InitFlags`] snapshot (argv, startup instant,
//! timezone offset, environment) and a [`GuestPorts`] set; from then on
//! its only way to touch the world is to emit messages and read the
//! correlated replies. Failures inside OS calls come back as
//! [`StructuredError`] values the guest can branch on — the host never
//! crashes on a guest's behalf, and never terminates the process except
//! through the guest's own exit signal.
//!
//! ```rust,no_run
//! use portico::{Guest, GuestPorts, Host, InitFlags};
//!
//! struct Hello;
//!
//! #[async_trait::async_trait]
//! impl Guest for Hello {
//!     async fn run(self, flags: InitFlags, ports: GuestPorts) -> anyhow::Result<()> {
//!         ports.output.send(format!("args: {:?}", flags.args)).await?;
//!         ports.exit.send(0).await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     Host::default().run_and_exit(Hello).await
//! }
//! ```

mod bridge;
mod capability;
mod config;
mod console;
mod context;
mod flags;
mod guest;
mod host;
mod marshal;
mod ports;

pub use bridge::Termination;
pub use capability::CapabilityAdapter;
pub use config::HostConfig;
pub use context::HostContext;
pub use flags::InitFlags;
pub use guest::Guest;
pub use host::Host;
pub use marshal::StructuredError;
pub use ports::{FsOutcome, FsRequest, FsResponse, GuestPorts};
