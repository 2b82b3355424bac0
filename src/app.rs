//! One complete run: read input, look up, export

use crate::asn::LookupClient;
use crate::batch::{BatchEngine, ProgressObserver};
use crate::export::{
    ensure_exports_dir, export, export_separated, ExportError, ExportReport, SeparatedExport,
};
use crate::input::{read_ips, InputError};
use crate::results::{ResultRow, RowShape, RunSummary};
use crate::settings::{RunSettings, SettingsError};
use crate::vpn::VpnAsnSet;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that end a run
#[derive(Debug, Error)]
pub enum AppError {
    /// The input file could not be read
    #[error(transparent)]
    Input(#[from] InputError),

    /// The settings are invalid
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The main export could not be written
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Counters over all input lines
    pub summary: RunSummary,
    /// One row per input line, in input order
    pub rows: Vec<ResultRow>,
    /// Columns every row carries
    pub shape: RowShape,
    /// The main export; `None` when the input held no addresses
    pub export: Option<ExportReport>,
    /// Files written by a separated export
    pub separated: Vec<SeparatedExport>,
    /// Whether rows were classified against the VPN list
    pub vpn_enabled: bool,
}

impl RunReport {
    fn empty(shape: RowShape, vpn_enabled: bool) -> Self {
        Self {
            summary: RunSummary::default(),
            rows: Vec::new(),
            shape,
            export: None,
            separated: Vec::new(),
            vpn_enabled,
        }
    }
}

fn load_vpn_set(settings: &RunSettings) -> Option<VpnAsnSet> {
    if !settings.detect_vpn {
        return None;
    }
    log::info!("Loading VPN ASN database...");
    let set = VpnAsnSet::load_or_empty(&settings.vpn_data_file);
    if set.is_empty() {
        log::warn!("No VPN ASNs loaded. VPN detection will be disabled.");
        return None;
    }
    log::info!(
        "Loaded {} VPN ASNs from {}",
        set.len(),
        settings.vpn_data_file.display()
    );
    Some(set)
}

/// Execute a run with `settings`, looking addresses up through `client`.
///
/// Fails before any lookup if the input cannot be read, and after all
/// lookups if the main export cannot be written. Per-address failures never
/// fail the run; they end up in the rows and the summary.
pub async fn run(
    settings: &RunSettings,
    client: Arc<dyn LookupClient>,
    cancel: CancellationToken,
    progress: &mut dyn ProgressObserver,
) -> Result<RunReport, AppError> {
    let config = settings.batch_config()?;

    log::info!(
        "Reading IP addresses from '{}'...",
        settings.input_file.display()
    );
    let ips = read_ips(&settings.input_file)?;

    let vpn_set = load_vpn_set(settings);
    let vpn_enabled = vpn_set.is_some();
    let shape = RowShape::new(settings.full_details, vpn_enabled);

    if ips.is_empty() {
        log::info!("No IP addresses found in the input file.");
        return Ok(RunReport::empty(shape, vpn_enabled));
    }

    log::info!("Found {} IP address(es) to process.", ips.len());
    log::info!("Using {} thread(s) for concurrent queries.", config.concurrency);
    if settings.full_details {
        log::info!("Mode: Full details (ASN, AS Name, Country, IP Block, Registry)");
    } else {
        log::info!("Mode: ASN only (default)");
    }
    log::info!(
        "VPN Detection: {}",
        if vpn_enabled { "Enabled" } else { "Disabled" }
    );
    log::info!("Exports directory: {}", settings.exports_dir.display());

    let mut engine = BatchEngine::new(config, client)
        .map_err(SettingsError::from)?
        .with_cancellation(cancel);
    if let Some(set) = vpn_set {
        engine = engine.with_vpn_set(set);
    }
    let result = engine.run(&ips, progress).await;

    ensure_exports_dir(&settings.exports_dir);
    let request = settings.export_request();
    let report = export(&result.rows, result.shape, &request)?;

    let separated = match settings.separate_by {
        Some(by) => match export_separated(&result.rows, result.shape, by, &request) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("Skipping separated export: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(RunReport {
        summary: result.summary,
        rows: result.rows,
        shape: result.shape,
        export: Some(report),
        separated,
        vpn_enabled,
    })
}
