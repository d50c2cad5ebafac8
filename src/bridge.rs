//! The message bridge: answers everything the guest emits.
//!
//! One bridge runs per guest. It owns the host side of the port set,
//! dispatches each capability request as its own task (overlapping
//! requests run concurrently, settle in any order, and never block each
//! other or console output), and delivers exactly one response per
//! accepted request, success or marshaled error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{Id as TaskId, JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::capability::CapabilityAdapter;
use crate::config::HostConfig;
use crate::context::HostContext;
use crate::marshal::StructuredError;
use crate::ports::{FsOutcome, FsRequest, FsResponse, HostPorts};

/// How a guest instance reached its terminal state.
///
/// Returned by the bridge so the shell can decide the process status.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The guest emitted an exit signal; its code becomes the process
    /// status.
    Exited(i32),
    /// The guest finished all of its work without ever signaling exit.
    CompletedDefault,
}

impl Termination {
    /// Process exit status for this terminal state.
    pub fn status(&self) -> i32 {
        match self {
            Termination::Exited(code) => *code,
            Termination::CompletedDefault => 0,
        }
    }
}

/// What the bridge remembers about a dispatched request: exactly the
/// method and tag needed to answer it. Removed exactly once, when the
/// task settles — the one place the exactly-once reply guarantee lives.
type InFlight = HashMap<TaskId, (String, Value)>;

pub(crate) struct MessageBridge {
    ctx: Arc<HostContext>,
    adapter: CapabilityAdapter,
    limit: Option<Arc<Semaphore>>,
    timeout: Option<Duration>,
}

impl MessageBridge {
    pub fn new(ctx: Arc<HostContext>, config: &HostConfig) -> Self {
        Self {
            ctx,
            adapter: CapabilityAdapter::new(),
            limit: config.max_in_flight.map(|n| Arc::new(Semaphore::new(n))),
            timeout: config.request_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Runs until the guest reaches a terminal state.
    ///
    /// Output events are forwarded to the console in emission order.
    /// Requests are dispatched concurrently and answered as they settle.
    /// The first exit signal is terminal; when the guest instead drops
    /// its ports, remaining in-flight calls are run to completion and the
    /// default termination is reported.
    pub async fn run(self, mut ports: HostPorts, console: mpsc::Sender<String>) -> Termination {
        let mut tasks: JoinSet<FsOutcome> = JoinSet::new();
        let mut in_flight: InFlight = HashMap::new();

        let mut output_open = true;
        let mut requests_open = true;
        let mut exit_open = true;

        loop {
            if !output_open && !requests_open && !exit_open && tasks.is_empty() {
                info!("guest ports closed; no exit signal observed");
                return Termination::CompletedDefault;
            }

            tokio::select! {
                event = ports.output.recv(), if output_open => match event {
                    Some(text) => forward_output(&console, text).await,
                    None => output_open = false,
                },
                request = ports.requests.recv(), if requests_open => match request {
                    Some(request) => self.dispatch(request, &mut tasks, &mut in_flight),
                    None => requests_open = false,
                },
                signal = ports.exit.recv(), if exit_open => match signal {
                    Some(code) => {
                        info!("guest signaled exit({code})");
                        self.drain_terminal(&mut ports, &console).await;
                        if !tasks.is_empty() {
                            // The process is about to terminate with `code`;
                            // whatever is still in flight dies with it.
                            debug!("abandoning {} in-flight capability calls", tasks.len());
                        }
                        return Termination::Exited(code);
                    }
                    None => exit_open = false,
                },
                settled = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    if let Some(settled) = settled {
                        deliver(settled, &mut in_flight, &ports.responses).await;
                    }
                },
            }
        }
    }

    /// Accepts one request: applies the `~` convention to a path-shaped
    /// first argument, then spawns the capability call as its own task.
    /// The request is moved into that task whole — there is no path on
    /// which it is served twice, or dropped unanswered.
    fn dispatch(&self, mut request: FsRequest, tasks: &mut JoinSet<FsOutcome>, in_flight: &mut InFlight) {
        if let Some(Value::String(first)) = request.args.first_mut() {
            *first = self.ctx.resolve_path(first);
        }
        debug!("dispatching {} ({} args)", request.method, request.args.len());

        let FsRequest { method, args, tag } = request;
        let adapter = self.adapter;
        let limit = self.limit.clone();
        let timeout = self.timeout;
        let call_method = method.clone();

        let handle = tasks.spawn(async move {
            let _permit = match limit {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            let call = adapter.call(&call_method, &args);
            let result = match timeout {
                Some(window) => match tokio::time::timeout(window, call).await {
                    Ok(settled) => settled,
                    Err(_) => Err(StructuredError::timed_out(&call_method, window.as_secs())),
                },
                None => call.await,
            };
            match result {
                Ok(value) => FsOutcome::Ok(value),
                Err(err) => FsOutcome::Error(err),
            }
        });
        in_flight.insert(handle.id(), (method, tag));
    }

    /// Flushes what the guest emitted before its exit signal and discards
    /// the rest. Output already queued is forwarded — its emission
    /// happened before the exit. Queued requests must not resurrect a
    /// terminated instance: logged, dropped, never served.
    async fn drain_terminal(&self, ports: &mut HostPorts, console: &mpsc::Sender<String>) {
        while let Ok(text) = ports.output.try_recv() {
            forward_output(console, text).await;
        }
        while let Ok(request) = ports.requests.try_recv() {
            warn!("discarding {} request received after exit", request.method);
        }
        while let Ok(code) = ports.exit.try_recv() {
            warn!("discarding exit({code}) after the first exit signal");
        }
    }
}

/// Sends the single response for a settled task. The in-flight entry is
/// removed here and only here; a task that failed outright still produces
/// its one error response from the stored method and tag.
async fn deliver(
    settled: Result<(TaskId, FsOutcome), JoinError>,
    in_flight: &mut InFlight,
    responses: &mpsc::Sender<FsResponse>,
) {
    let (id, outcome) = match settled {
        Ok((id, outcome)) => (id, outcome),
        Err(join_err) => {
            error!("capability task failed: {join_err}");
            let outcome = FsOutcome::Error(StructuredError::generic(format!(
                "capability task failed: {join_err}"
            )));
            (join_err.id(), outcome)
        }
    };

    let Some((method, tag)) = in_flight.remove(&id) else {
        error!("settled capability task had no in-flight entry");
        return;
    };

    let response = FsResponse { method, tag, outcome };
    if responses.send(response).await.is_err() {
        debug!("guest dropped its response port before delivery");
    }
}

async fn forward_output(console: &mpsc::Sender<String>, text: String) {
    if console.send(text).await.is_err() {
        debug!("console writer gone; dropping output event");
    }
}
