//! Progress reporting for batch lookups
//!
//! The engine reports every completion from a single collector, so observers
//! never see interleaved calls and need no locking of their own.

use crate::results::{LookupOutcome, RunSummary};

/// Snapshot handed to an observer after each completed lookup
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate<'a> {
    /// Number of lookups completed so far, including this one
    pub completed: usize,
    /// Number of lookups in the run
    pub total: usize,
    /// Input position of the completed line
    pub index: usize,
    /// The completed input line
    pub ip: &'a str,
    /// Its outcome
    pub outcome: &'a LookupOutcome,
    /// Running counters after this completion
    pub summary: &'a RunSummary,
}

/// Receives one call per completed lookup
pub trait ProgressObserver: Send {
    /// Called after the outcome has been stored and counted
    fn on_complete(&mut self, update: &ProgressUpdate<'_>);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressUpdate<'_>) + Send,
{
    fn on_complete(&mut self, update: &ProgressUpdate<'_>) {
        self(update)
    }
}

/// Observer that discards all updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_complete(&mut self, _update: &ProgressUpdate<'_>) {}
}

/// Observer that prints one line per completed lookup to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleProgress {
    full_details: bool,
}

impl ConsoleProgress {
    /// Show the AS name next to the ASN when `full_details` is set
    pub fn new(full_details: bool) -> Self {
        Self { full_details }
    }
}

impl ProgressObserver for ConsoleProgress {
    fn on_complete(&mut self, update: &ProgressUpdate<'_>) {
        println!("{}", format_progress(update, self.full_details));
    }
}

/// Render the progress line for one completion
pub fn format_progress(update: &ProgressUpdate<'_>, full_details: bool) -> String {
    let counter = format!("[{}/{}]", update.completed, update.total);
    match update.outcome {
        LookupOutcome::Valid { record, traffic } => {
            let type_str = traffic.map(|t| format!(" [{t}]")).unwrap_or_default();
            if full_details {
                format!(
                    "{} {}: ✓ ASN: {} ({}){}",
                    counter,
                    update.ip,
                    record.asn(),
                    record.as_name(),
                    type_str
                )
            } else {
                format!("{} {}: ✓ ASN: {}{}", counter, update.ip, record.asn(), type_str)
            }
        }
        LookupOutcome::Invalid { reason } => format!("{} {}: ✗ {}", counter, update.ip, reason),
        LookupOutcome::LookupFailed { error } => {
            format!("{} {}: ✗ {}", counter, update.ip, error)
        }
    }
}
