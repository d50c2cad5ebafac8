//! The process shell around one guest instance.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::bridge::{MessageBridge, Termination};
use crate::config::HostConfig;
use crate::console;
use crate::context::HostContext;
use crate::flags::InitFlags;
use crate::guest::Guest;
use crate::ports;

/// Owns everything with a process-wide footprint: the one-shot working
/// directory change, the flags snapshot, the console sink, and the final
/// exit status. Exactly one guest runs per host, and per process
/// lifetime.
pub struct Host {
    config: HostConfig,
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    /// Runs `guest` to its terminal state, with flags collected from the
    /// live process environment and console output on stdout.
    pub async fn run<G: Guest>(self, guest: G) -> anyhow::Result<Termination> {
        self.run_with(guest, InitFlags::collect(), tokio::io::stdout())
            .await
    }

    /// Runs `guest` and exits the process with the resulting status.
    ///
    /// The status is the guest's exit signal, or 0 when the guest
    /// completes without one. Host-side setup failures exit 1.
    pub async fn run_and_exit<G: Guest>(self, guest: G) -> ! {
        let status = match self.run(guest).await {
            Ok(termination) => termination.status(),
            Err(e) => {
                error!("host error: {e:#}");
                1
            }
        };
        std::process::exit(status);
    }

    /// Full wiring with injectable flags and console sink.
    pub async fn run_with<G, W>(
        self,
        guest: G,
        flags: InitFlags,
        sink: W,
    ) -> anyhow::Result<Termination>
    where
        G: Guest,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        if let Some(dir) = &self.config.working_dir {
            // One-shot process-global change; nothing mutates it later.
            std::env::set_current_dir(dir)?;
        }
        let ctx = Arc::new(HostContext::detect(&self.config)?);
        info!("host starting in {}", ctx.cwd().display());

        let (guest_ports, host_ports) = ports::wire(self.config.port_capacity);
        let (console_tx, console_rx) = mpsc::channel(self.config.port_capacity);
        let console_task = tokio::spawn(console::run(console_rx, sink));

        let guest_task = tokio::spawn(guest.run(flags, guest_ports));

        let bridge = MessageBridge::new(ctx, &self.config);
        let termination = bridge.run(host_ports, console_tx).await;

        match &termination {
            Termination::Exited(code) => {
                info!("guest exited with status {code}");
                // The guest's lifecycle ended at its exit signal; whatever
                // its task is still doing will not be heard.
                guest_task.abort();
            }
            Termination::CompletedDefault => {
                info!("guest completed without an exit signal");
                match guest_task.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("guest returned an error: {e:#}"),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => error!("guest task failed: {e}"),
                }
            }
        }

        // The console sender is gone once the bridge returns; wait for
        // the writer to drain and flush before reporting the terminal
        // state.
        let _ = console_task.await;

        Ok(termination)
    }
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}
