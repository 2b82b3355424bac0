//! Bulk lookup of many addresses with a bounded worker pool

pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod result;

use crate::asn::AsnLookup;
use std::sync::Arc;

// Re-export commonly used types
pub use config::{BatchConfig, BatchConfigBuilder, DEFAULT_CONCURRENCY};
pub use engine::{BatchEngine, CANCELLED_ERROR};
pub use error::BatchError;
pub use progress::{format_progress, ConsoleProgress, NoProgress, ProgressObserver, ProgressUpdate};
pub use result::BatchResult;

/// Look up every line of `ips` against Team Cymru with default settings
///
/// Uses a fresh [`AsnLookup`] client and reports no progress. Build a
/// [`BatchEngine`] directly for VPN detection, cancellation or a custom
/// client.
pub async fn run_batch(ips: &[String], config: BatchConfig) -> Result<BatchResult, BatchError> {
    let client = match config.lookup_timeout {
        Some(timeout) => AsnLookup::with_timeout(timeout),
        None => AsnLookup::new(),
    };
    let engine = BatchEngine::new(config, Arc::new(client))?;
    Ok(engine.run(ips, &mut NoProgress).await)
}
