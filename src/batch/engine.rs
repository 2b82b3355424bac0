//! Concurrent batch lookup engine
//!
//! A run works like this:
//! 1. every input line becomes a task `(index, ip)` on one shared queue
//! 2. `concurrency` workers (fewer if there are fewer lines) pull tasks
//!    until the queue is drained
//! 3. each worker validates the line, performs the lookup in its own task
//!    and sends the outcome to the collector
//! 4. the collector (the `run` future itself) writes the outcome into slot
//!    `index`, updates the counters and reports progress
//!
//! The collector is the only owner of the result store and counters, so
//! completions never race. Output order is the slot order, not the order in
//! which lookups finish.

use crate::asn::LookupClient;
use crate::batch::progress::{ProgressObserver, ProgressUpdate};
use crate::batch::{BatchConfig, BatchError, BatchResult};
use crate::results::{CompletedLookup, LookupOutcome, RowShape, RunSummary};
use crate::validate::parse_ip;
use crate::vpn::VpnAsnSet;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

/// Error text for lookups abandoned because the run was cancelled
pub const CANCELLED_ERROR: &str = "Cancelled";

/// Error text for slots left empty by a worker that died
const WORKER_LOST_ERROR: &str = "Worker terminated before recording a result";

struct Task {
    index: usize,
    ip: String,
}

struct Completion {
    index: usize,
    outcome: LookupOutcome,
}

/// Everything a worker needs, cloned once per worker
struct Worker {
    queue: Arc<Mutex<mpsc::Receiver<Task>>>,
    done: mpsc::UnboundedSender<Completion>,
    client: Arc<dyn LookupClient>,
    vpn_set: Option<Arc<VpnAsnSet>>,
    lookup_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        loop {
            let next = {
                let mut queue = self.queue.lock().await;
                queue.recv().await
            };
            let Some(task) = next else {
                break;
            };

            let outcome = self.resolve(&task.ip).await;
            if self
                .done
                .send(Completion {
                    index: task.index,
                    outcome,
                })
                .is_err()
            {
                break;
            }
        }
    }

    async fn resolve(&self, raw: &str) -> LookupOutcome {
        let Some(ip) = parse_ip(raw) else {
            return LookupOutcome::invalid();
        };
        if self.cancel.is_cancelled() {
            return LookupOutcome::failed(CANCELLED_ERROR);
        }

        // A panicking client only takes down this task, not the worker.
        let client = Arc::clone(&self.client);
        let mut handle = tokio::spawn(async move { client.lookup(ip).await });

        let joined = tokio::select! {
            joined = &mut handle => joined,
            () = self.cancel.cancelled() => {
                handle.abort();
                return LookupOutcome::failed(CANCELLED_ERROR);
            }
            () = deadline(self.lookup_timeout) => {
                handle.abort();
                return LookupOutcome::failed(format!(
                    "Lookup timed out after {}",
                    format_duration(self.lookup_timeout.unwrap_or_default())
                ));
            }
        };

        match joined {
            Ok(Ok(record)) => {
                let traffic = self.vpn_set.as_ref().map(|set| set.classify(record.asn()));
                LookupOutcome::Valid { record, traffic }
            }
            Ok(Err(e)) => LookupOutcome::failed(format!("Whois error: {e}")),
            Err(e) => LookupOutcome::failed(format!("Exception: {}", panic_message(e))),
        }
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

fn panic_message(error: JoinError) -> String {
    if error.is_cancelled() {
        return "lookup task cancelled".to_string();
    }
    match error.try_into_panic() {
        Ok(payload) => {
            if let Some(message) = payload.downcast_ref::<&str>() {
                (*message).to_string()
            } else if let Some(message) = payload.downcast_ref::<String>() {
                message.clone()
            } else {
                "lookup panicked".to_string()
            }
        }
        Err(e) => e.to_string(),
    }
}

/// Resolves a batch of IP address strings with a bounded worker pool
pub struct BatchEngine {
    config: BatchConfig,
    client: Arc<dyn LookupClient>,
    vpn_set: Option<Arc<VpnAsnSet>>,
    cancel: CancellationToken,
}

impl BatchEngine {
    /// Create an engine; fails if the configuration is invalid
    pub fn new(config: BatchConfig, client: Arc<dyn LookupClient>) -> Result<Self, BatchError> {
        config.validate()?;
        Ok(Self {
            config,
            client,
            vpn_set: None,
            cancel: CancellationToken::new(),
        })
    }

    /// Enable VPN classification against `vpn_set`
    pub fn with_vpn_set(mut self, vpn_set: VpnAsnSet) -> Self {
        self.vpn_set = Some(Arc::new(vpn_set));
        self
    }

    /// Abandon outstanding lookups when `token` is cancelled.
    ///
    /// Abandoned lines still get a row, marked as cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Whether rows will carry a VPN classification
    pub fn vpn_enabled(&self) -> bool {
        self.vpn_set.is_some()
    }

    /// Row shape produced by this engine
    pub fn shape(&self) -> RowShape {
        RowShape::new(self.config.full_details, self.vpn_enabled())
    }

    /// Resolve every line of `ips`.
    ///
    /// Returns once every line has an outcome. The result holds exactly one
    /// entry per input line, in input order.
    pub async fn run(&self, ips: &[String], progress: &mut dyn ProgressObserver) -> BatchResult {
        let total = ips.len();
        let vpn_enabled = self.vpn_enabled();
        let mut store: Vec<Option<LookupOutcome>> = vec![None; total];
        let mut summary = RunSummary::default();

        if total > 0 {
            let (task_tx, task_rx) = mpsc::channel(total);
            for (index, ip) in ips.iter().enumerate() {
                let task = Task {
                    index,
                    ip: ip.clone(),
                };
                if task_tx.send(task).await.is_err() {
                    break;
                }
            }
            drop(task_tx);

            let queue = Arc::new(Mutex::new(task_rx));
            let (done_tx, mut done_rx) = mpsc::unbounded_channel();

            // Workers beyond the number of tasks would only sit idle.
            let worker_count = self.config.concurrency.min(total);
            log::debug!("Dispatching {} lookups to {} workers", total, worker_count);
            let mut workers = FuturesUnordered::new();
            for _ in 0..worker_count {
                let worker = Worker {
                    queue: Arc::clone(&queue),
                    done: done_tx.clone(),
                    client: Arc::clone(&self.client),
                    vpn_set: self.vpn_set.clone(),
                    lookup_timeout: self.config.lookup_timeout,
                    cancel: self.cancel.clone(),
                };
                workers.push(tokio::spawn(worker.run()));
            }
            drop(done_tx);

            while let Some(Completion { index, outcome }) = done_rx.recv().await {
                let slot = &mut store[index];
                if slot.is_some() {
                    log::warn!("Ignoring duplicate completion for input line {}", index);
                    continue;
                }
                summary.record(&outcome, vpn_enabled);
                progress.on_complete(&ProgressUpdate {
                    completed: summary.total,
                    total,
                    index,
                    ip: &ips[index],
                    outcome: &outcome,
                    summary: &summary,
                });
                *slot = Some(outcome);
            }

            while let Some(joined) = workers.next().await {
                if let Err(e) = joined {
                    log::warn!("Lookup worker terminated abnormally: {}", e);
                }
            }
        }

        let mut completed = Vec::with_capacity(total);
        for (index, (slot, ip)) in store.into_iter().zip(ips).enumerate() {
            let outcome = match slot {
                Some(outcome) => outcome,
                None => {
                    log::warn!("No outcome recorded for {}; marking it failed", ip);
                    let outcome = LookupOutcome::failed(WORKER_LOST_ERROR);
                    summary.record(&outcome, vpn_enabled);
                    progress.on_complete(&ProgressUpdate {
                        completed: summary.total,
                        total,
                        index,
                        ip,
                        outcome: &outcome,
                        summary: &summary,
                    });
                    outcome
                }
            };
            completed.push(CompletedLookup {
                ip: ip.clone(),
                outcome,
            });
        }

        BatchResult::new(completed, summary, self.shape())
    }
}
