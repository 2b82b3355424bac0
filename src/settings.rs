//! Run settings: config file, command-line overrides and their resolution
//!
//! Values are resolved with the precedence command line > config file >
//! built-in default. The config file is TOML:
//!
//! ```toml
//! [defaults]
//! output_file = "asn_results.csv"
//! output_format = "auto"
//! threads = 10
//! full_details = false
//! detect_vpn = false
//! exports_dir = "exports"
//! vpn_data_file = "data/vpn_hosts.txt"
//! lookup_timeout_secs = 15
//! separate_by = "type"
//!
//! [cloudflare]
//! rule_action = "block"
//! ```

use crate::batch::{BatchConfig, BatchError, DEFAULT_CONCURRENCY};
use crate::export::{
    resolve_output_path, CloudflareAction, ExportRequest, OutputFormat, SeparateBy,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file read when none is given
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
/// Output file name when none is given
pub const DEFAULT_OUTPUT_FILE: &str = "asn_results.csv";
/// Directory receiving all exports
pub const DEFAULT_EXPORTS_DIR: &str = "exports";
/// VPN provider list read when detection is enabled
pub const DEFAULT_VPN_DATA_FILE: &str = "data/vpn_hosts.txt";

/// Invalid resolved settings; raised before any lookup starts
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Thread count below one
    #[error("Invalid thread count {0}: must be at least 1")]
    InvalidThreads(i64),

    /// Zero-second lookup timeout
    #[error("Invalid lookup timeout: must be at least 1 second")]
    InvalidTimeout,

    /// Settings rejected by the batch engine
    #[error(transparent)]
    Batch(#[from] BatchError),
}

/// `[defaults]` section of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
    /// Output file name
    pub output_file: Option<PathBuf>,
    /// Output format or `auto`
    pub output_format: Option<OutputFormat>,
    /// Number of concurrent lookups
    pub threads: Option<i64>,
    /// Include AS name, country, IP block and registry
    pub full_details: Option<bool>,
    /// Classify results against the VPN provider list
    pub detect_vpn: Option<bool>,
    /// Directory receiving all exports
    pub exports_dir: Option<PathBuf>,
    /// VPN provider list
    pub vpn_data_file: Option<PathBuf>,
    /// Upper bound for a single lookup
    pub lookup_timeout_secs: Option<u64>,
    /// Also write one file per value of this column
    pub separate_by: Option<SeparateBy>,
}

/// `[cloudflare]` section of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudflareSection {
    /// Action of generated firewall rules
    pub rule_action: Option<CloudflareAction>,
}

/// Contents of the config file; every value is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// General defaults
    pub defaults: DefaultsSection,
    /// Cloudflare export options
    pub cloudflare: CloudflareSection,
}

impl FileConfig {
    /// Parse config file contents
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load the config file at `path`.
    ///
    /// A missing file yields the empty config. A file that cannot be read or
    /// parsed is reported as a warning and also yields the empty config.
    pub fn load_or_default(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config file at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Error reading config file '{}': {}", path.display(), e);
                return Self::default();
            }
        };

        match Self::parse(&contents) {
            Ok(config) => {
                log::debug!("Loaded config file {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Error reading config file '{}': {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `-o/--output`
    pub output_file: Option<PathBuf>,
    /// `-f/--format`
    pub output_format: Option<OutputFormat>,
    /// `-t/--threads`
    pub threads: Option<i64>,
    /// `--full`; only ever enables
    pub full_details: bool,
    /// `--detect-vpn`; only ever enables
    pub detect_vpn: bool,
    /// `--exports-dir`
    pub exports_dir: Option<PathBuf>,
    /// `--vpn-data`
    pub vpn_data_file: Option<PathBuf>,
    /// `--lookup-timeout-secs`
    pub lookup_timeout_secs: Option<u64>,
    /// `--separate-by`
    pub separate_by: Option<SeparateBy>,
    /// `--cloudflare-action`
    pub cloudflare_action: Option<CloudflareAction>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// File listing the addresses to look up
    pub input_file: PathBuf,
    /// Output file as given; see [`RunSettings::export_request`]
    pub output_file: PathBuf,
    /// Output format or `auto`
    pub output_format: OutputFormat,
    /// Number of concurrent lookups (at least 1)
    pub threads: usize,
    /// Include AS name, country, IP block and registry
    pub full_details: bool,
    /// Classify results against the VPN provider list
    pub detect_vpn: bool,
    /// Directory receiving all exports
    pub exports_dir: PathBuf,
    /// VPN provider list
    pub vpn_data_file: PathBuf,
    /// Upper bound for a single lookup
    pub lookup_timeout: Option<Duration>,
    /// Also write one file per value of this column
    pub separate_by: Option<SeparateBy>,
    /// Action of generated firewall rules
    pub cloudflare_action: CloudflareAction,
}

impl RunSettings {
    /// Resolve settings for `input_file`
    pub fn resolve(
        input_file: PathBuf,
        cli: CliOverrides,
        file: FileConfig,
    ) -> Result<Self, SettingsError> {
        let defaults = file.defaults;

        let threads = cli
            .threads
            .or(defaults.threads)
            .unwrap_or(DEFAULT_CONCURRENCY as i64);
        let threads = usize::try_from(threads)
            .ok()
            .filter(|t| *t >= 1)
            .ok_or(SettingsError::InvalidThreads(threads))?;

        let lookup_timeout = match cli.lookup_timeout_secs.or(defaults.lookup_timeout_secs) {
            Some(0) => return Err(SettingsError::InvalidTimeout),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self {
            input_file,
            output_file: cli
                .output_file
                .or(defaults.output_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
            output_format: cli
                .output_format
                .or(defaults.output_format)
                .unwrap_or_default(),
            threads,
            full_details: cli.full_details || defaults.full_details.unwrap_or(false),
            detect_vpn: cli.detect_vpn || defaults.detect_vpn.unwrap_or(false),
            exports_dir: cli
                .exports_dir
                .or(defaults.exports_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORTS_DIR)),
            vpn_data_file: cli
                .vpn_data_file
                .or(defaults.vpn_data_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VPN_DATA_FILE)),
            lookup_timeout,
            separate_by: cli.separate_by.or(defaults.separate_by),
            cloudflare_action: cli
                .cloudflare_action
                .or(file.cloudflare.rule_action)
                .unwrap_or_default(),
        })
    }

    /// Batch engine configuration for these settings
    pub fn batch_config(&self) -> Result<BatchConfig, SettingsError> {
        let mut builder = BatchConfig::builder()
            .concurrency(self.threads)
            .full_details(self.full_details);
        if let Some(timeout) = self.lookup_timeout {
            builder = builder.lookup_timeout(timeout);
        }
        Ok(builder.build()?)
    }

    /// Destination and format of the main export
    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            path: resolve_output_path(&self.output_file, &self.exports_dir),
            format: self.output_format.resolve(&self.output_file),
            cloudflare_action: self.cloudflare_action,
        }
    }
}
