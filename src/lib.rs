//! ASN Finder - bulk IP to ASN lookup
//!
//! This library resolves many IP addresses to their originating Autonomous
//! System concurrently, optionally classifies them against a list of VPN
//! provider ASNs, and exports the results as CSV, JSON, HTML, SQL or a
//! Cloudflare firewall rule.
//!
//! # Examples
//!
//! ```no_run
//! use asn_finder::{AsnLookup, BatchConfig, BatchEngine, NoProgress};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::builder().concurrency(20).full_details(true).build()?;
//! let engine = BatchEngine::new(config, Arc::new(AsnLookup::new()))?;
//!
//! let ips = vec!["8.8.8.8".to_string(), "not-an-ip".to_string()];
//! let result = engine.run(&ips, &mut NoProgress).await;
//! println!("{} succeeded, {} failed", result.summary.succeeded, result.summary.errored);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod asn;
pub mod batch;
pub mod export;
pub mod input;
pub mod logging;
pub mod results;
pub mod settings;
pub mod validate;
pub mod vpn;

// Re-export core types for library users
pub use app::{run, AppError, RunReport};
pub use asn::{canonicalize_asn, AsnLookup, AsnLookupError, AsnRecord, LookupClient};
pub use batch::{
    run_batch, BatchConfig, BatchConfigBuilder, BatchEngine, BatchError, BatchResult,
    ConsoleProgress, NoProgress, ProgressObserver, ProgressUpdate,
};
pub use export::{
    export, CloudflareAction, ExportError, ExportFormat, ExportReport, ExportRequest,
    OutputFormat, SeparateBy,
};
pub use input::{read_ips, InputError};
pub use results::{
    build_rows, summarize, Column, CompletedLookup, LookupOutcome, ResultRow, RowShape,
    RunSummary,
};
pub use settings::{CliOverrides, FileConfig, RunSettings, SettingsError};
pub use validate::{is_valid_ip, parse_ip};
pub use vpn::{TrafficType, VpnAsnSet, VpnDataError};
