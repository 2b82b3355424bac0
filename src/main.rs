//! asn-finder - Concurrent bulk IP to ASN lookup with VPN detection.
//!
//! This is the command-line interface for the asn_finder library.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use asn_finder::export::{CloudflareAction, OutputFormat, SeparateBy};
use asn_finder::logging::init_logger;
use asn_finder::settings::{CliOverrides, FileConfig, RunSettings, DEFAULT_CONFIG_FILE};
use asn_finder::{AsnLookup, ConsoleProgress, RunReport};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Get the version string for asn-finder
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the lookup tool.
#[derive(Parser, Debug)]
#[clap(
    version = get_version(),
    about = "Look up ASN information for a list of IP addresses",
    long_about = None,
    after_help = "Examples:
  asn-finder ips.txt
  asn-finder ips.txt -o results.json
  asn-finder ips.txt -o report.html --full
  asn-finder ips.txt -o rules_cloudflare.json --cloudflare-action allow
  asn-finder ips.txt -t 50 --detect-vpn --separate-by type"
)]
struct Args {
    /// File with one IP address per line
    input_file: PathBuf,

    /// Output file, placed inside the exports directory [default: asn_results.csv]
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Output format; auto picks it from the output file name [default: auto]
    #[clap(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file
    #[clap(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Action of the generated Cloudflare rule [default: block]
    #[clap(long, value_enum)]
    cloudflare_action: Option<CloudflareAction>,

    /// Number of concurrent lookups [default: 10]
    #[clap(short, long, allow_negative_numbers = true)]
    threads: Option<i64>,

    /// Include AS name, country, IP block and registry
    #[clap(long)]
    full: bool,

    /// Classify results against the VPN provider ASN list
    #[clap(long)]
    detect_vpn: bool,

    /// VPN provider ASN list [default: data/vpn_hosts.txt]
    #[clap(long)]
    vpn_data: Option<PathBuf>,

    /// Directory receiving all exports [default: exports]
    #[clap(long)]
    exports_dir: Option<PathBuf>,

    /// Give up on a single lookup after this many seconds
    #[clap(long)]
    lookup_timeout_secs: Option<u64>,

    /// Also write one file per value of this column
    #[clap(long, value_enum)]
    separate_by: Option<SeparateBy>,

    /// Enable verbose output (use -vv for resolver internals)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            output_file: self.output.clone(),
            output_format: self.format,
            threads: self.threads,
            full_details: self.full,
            detect_vpn: self.detect_vpn,
            exports_dir: self.exports_dir.clone(),
            vpn_data_file: self.vpn_data.clone(),
            lookup_timeout_secs: self.lookup_timeout_secs,
            separate_by: self.separate_by,
            cloudflare_action: self.cloudflare_action,
        }
    }
}

fn main() {
    let args = Args::parse();
    // A second logger can only exist in tests.
    let _ = init_logger(args.verbose);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(async_main(args));

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn async_main(args: Args) -> Result<()> {
    let file_config = FileConfig::load_or_default(&args.config);
    let settings = RunSettings::resolve(args.input_file.clone(), args.overrides(), file_config)?;

    let client = match settings.lookup_timeout {
        Some(timeout) => AsnLookup::with_timeout(timeout),
        None => AsnLookup::new(),
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted; finishing with the lookups completed so far");
                cancel.cancel();
            }
        });
    }

    let mut progress = ConsoleProgress::new(settings.full_details);
    let report = asn_finder::run(&settings, Arc::new(client), cancel, &mut progress)
        .await
        .context("ASN lookup failed")?;

    display_report(&report);
    Ok(())
}

/// Render the export result and the run summary
fn format_report(report: &RunReport) -> Option<String> {
    let export = report.export.as_ref()?;
    let mut lines = vec![
        String::new(),
        export.message.clone(),
        format!("  Total IPs processed: {}", report.rows.len()),
    ];
    for file in &report.separated {
        lines.push(format!(
            "  Separated: {} ({} records, {})",
            file.path.display(),
            file.records,
            file.value
        ));
    }
    lines.push(String::new());
    lines.push("Summary:".to_string());
    lines.push(format!("  Successful queries: {}", report.summary.succeeded));
    lines.push(format!("  Errors/Invalid: {}", report.summary.errored));
    if report.vpn_enabled {
        lines.push(format!("  VPN ASNs: {}", report.summary.vpn));
        lines.push(format!("  Normal ASNs: {}", report.summary.normal));
    }
    Some(lines.join("\n"))
}

fn display_report(report: &RunReport) {
    match format_report(report) {
        Some(text) => println!("{}", text),
        None => println!("No IP addresses found in the input file."),
    }
}
