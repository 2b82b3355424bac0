//! Writing result rows to disk
//!
//! Every format writes the rows of one run in input order, using the run's
//! column list from [`RowShape::columns`]. Cloudflare is the exception: it
//! reduces the rows to one firewall rule over the distinct AS numbers.

pub mod cloudflare;
pub mod csv;
pub mod html;
pub mod json;
pub mod separate;
pub mod sql;

use crate::results::{ResultRow, RowShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub use cloudflare::{CloudflareAction, CloudflareRule};
pub use separate::{export_separated, SeparateBy, SeparatedExport};

/// Heading of the main HTML and SQL exports
pub const DEFAULT_TITLE: &str = "ASN Lookup Results";

/// Errors raised while writing an export
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output file could not be created or written
    #[error("Error saving {format} file '{}': {source}", path.display())]
    Io {
        /// Output path
        path: PathBuf,
        /// Format being written
        format: ExportFormat,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// CSV serialization failed
    #[error("Error saving CSV file '{}': {source}", path.display())]
    Csv {
        /// Output path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ::csv::Error,
    },

    /// JSON serialization failed
    #[error("Error saving {format} file '{}': {source}", path.display())]
    Json {
        /// Output path
        path: PathBuf,
        /// Format being written
        format: ExportFormat,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The HTML template could not be rendered
    #[error("Error saving HTML file '{}': {source}", path.display())]
    Template {
        /// Output path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: handlebars::RenderError,
    },

    /// A Cloudflare rule needs at least one numeric ASN
    #[error("No valid ASNs found to export")]
    NoValidAsns,

    /// The format name is not one of the supported formats
    #[error("Unsupported output format '{0}' (supported: csv, json, html, sql, cloudflare)")]
    UnsupportedFormat(String),

    /// Rows cannot be separated by a column this run does not carry
    #[error("Cannot separate by {column}: {reason}")]
    ColumnUnavailable {
        /// Requested column header
        column: &'static str,
        /// Which mode would provide it
        reason: &'static str,
    },
}

/// Concrete serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma separated values with a header row
    Csv,
    /// Pretty-printed array of row objects
    Json,
    /// Standalone styled HTML table
    Html,
    /// `CREATE TABLE` plus one `INSERT` per row
    Sql,
    /// Cloudflare firewall rule over the distinct ASNs
    Cloudflare,
}

impl ExportFormat {
    /// Guess the format from the output file name.
    ///
    /// Unknown extensions fall back to CSV.
    pub fn detect(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => ExportFormat::Csv,
            "json" if name.contains("cloudflare") || name.contains("cf") => {
                ExportFormat::Cloudflare
            }
            "json" => ExportFormat::Json,
            "html" | "htm" => ExportFormat::Html,
            "sql" | "db" => ExportFormat::Sql,
            "cf" => ExportFormat::Cloudflare,
            _ if name.contains("cloudflare") => ExportFormat::Cloudflare,
            _ => ExportFormat::Csv,
        }
    }

    /// Lowercase format name
    pub fn name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
            ExportFormat::Sql => "sql",
            ExportFormat::Cloudflare => "cloudflare",
        }
    }

    /// Default file extension, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => ".csv",
            ExportFormat::Json | ExportFormat::Cloudflare => ".json",
            ExportFormat::Html => ".html",
            ExportFormat::Sql => ".sql",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().to_uppercase())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            "sql" => Ok(ExportFormat::Sql),
            "cloudflare" => Ok(ExportFormat::Cloudflare),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Format selection as given by the user: a fixed format or `auto`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pick from the output file name
    #[default]
    Auto,
    /// CSV
    Csv,
    /// JSON
    Json,
    /// HTML
    Html,
    /// SQL
    Sql,
    /// Cloudflare firewall rule
    Cloudflare,
}

impl OutputFormat {
    /// Resolve to a concrete format for `path`
    pub fn resolve(self, path: &Path) -> ExportFormat {
        match self {
            OutputFormat::Auto => ExportFormat::detect(path),
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Html => ExportFormat::Html,
            OutputFormat::Sql => ExportFormat::Sql,
            OutputFormat::Cloudflare => ExportFormat::Cloudflare,
        }
    }
}

/// Where and how to write one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// Destination file, already resolved against the exports directory
    pub path: PathBuf,
    /// Serialization format
    pub format: ExportFormat,
    /// Rule action, used by the Cloudflare format only
    pub cloudflare_action: CloudflareAction,
}

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    /// File written
    pub path: PathBuf,
    /// Format written
    pub format: ExportFormat,
    /// Rows exported
    pub records: usize,
    /// Human-readable summary line
    pub message: String,
}

/// Write `rows` as described by `request`
pub fn export(
    rows: &[ResultRow],
    shape: RowShape,
    request: &ExportRequest,
) -> Result<ExportReport, ExportError> {
    export_titled(rows, shape, request, DEFAULT_TITLE)
}

/// Like [`export`], with `title` heading the HTML and SQL output
pub(crate) fn export_titled(
    rows: &[ResultRow],
    shape: RowShape,
    request: &ExportRequest,
    title: &str,
) -> Result<ExportReport, ExportError> {
    let path = request.path.as_path();
    let format = request.format;
    let columns = shape.columns();
    log::debug!("Writing {} rows to {} as {}", rows.len(), path.display(), format);

    let message = match format {
        ExportFormat::Csv => {
            let file = create_file(path, format)?;
            csv::write_csv(file, rows, &columns).map_err(|source| ExportError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            saved_message(path, format)
        }
        ExportFormat::Json => {
            let mut file = create_file(path, format)?;
            json::write_json(&mut file, rows, &columns).map_err(|source| ExportError::Json {
                path: path.to_path_buf(),
                format,
                source,
            })?;
            finish(file, path, format)?;
            saved_message(path, format)
        }
        ExportFormat::Html => {
            let document =
                html::render_html(rows, &columns, title).map_err(|source| ExportError::Template {
                    path: path.to_path_buf(),
                    source,
                })?;
            write_text(path, format, &document)?;
            saved_message(path, format)
        }
        ExportFormat::Sql => {
            let table = sql::table_name_for(path);
            let script = sql::render_sql(rows, &columns, &table, title);
            write_text(path, format, &script)?;
            format!("{}\n  Table name: {}", saved_message(path, format), table)
        }
        ExportFormat::Cloudflare => {
            let rule = cloudflare::build_rule(rows, request.cloudflare_action)?;
            let mut file = create_file(path, format)?;
            serde_json::to_writer_pretty(&mut file, &rule).map_err(|source| {
                ExportError::Json {
                    path: path.to_path_buf(),
                    format,
                    source,
                }
            })?;
            finish(file, path, format)?;
            format!(
                "✓ ASN lookup completed! Cloudflare rule saved to '{}' ({} action, {} ASNs)",
                path.display(),
                request.cloudflare_action,
                rule.asn_count()
            )
        }
    };

    Ok(ExportReport {
        path: path.to_path_buf(),
        format,
        records: rows.len(),
        message,
    })
}

fn saved_message(path: &Path, format: ExportFormat) -> String {
    format!(
        "✓ ASN lookup completed! Results saved to '{}' ({} format)",
        path.display(),
        format
    )
}

fn io_error(path: &Path, format: ExportFormat, source: io::Error) -> ExportError {
    ExportError::Io {
        path: path.to_path_buf(),
        format,
        source,
    }
}

fn create_file(path: &Path, format: ExportFormat) -> Result<BufWriter<File>, ExportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| io_error(path, format, e))
}

fn finish(mut file: BufWriter<File>, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
    file.flush().map_err(|e| io_error(path, format, e))
}

fn write_text(path: &Path, format: ExportFormat, text: &str) -> Result<(), ExportError> {
    fs::write(path, text).map_err(|e| io_error(path, format, e))
}

/// Create the exports directory if it does not exist yet.
///
/// Failure is logged and otherwise ignored; the export itself reports the
/// error if the directory is really unusable.
pub fn ensure_exports_dir(dir: &Path) {
    if dir.is_dir() {
        return;
    }
    match fs::create_dir_all(dir) {
        Ok(()) => log::info!("Created exports directory: {}/", dir.display()),
        Err(e) => log::warn!(
            "Could not create exports directory '{}': {}",
            dir.display(),
            e
        ),
    }
}

/// Place `output` inside `exports_dir`.
///
/// A bare file name is joined to the directory. A path whose directory lies
/// outside the exports directory is reduced to its file name first. A path
/// already inside is kept.
pub fn resolve_output_path(output: &Path, exports_dir: &Path) -> PathBuf {
    let has_dir = output
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());
    if !has_dir {
        return exports_dir.join(output);
    }

    if absolute(output).starts_with(absolute(exports_dir)) {
        return output.to_path_buf();
    }

    match output.file_name() {
        Some(name) => exports_dir.join(name),
        None => exports_dir.join(output),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        let cases = [
            ("results.csv", ExportFormat::Csv),
            ("RESULTS.CSV", ExportFormat::Csv),
            ("results.json", ExportFormat::Json),
            ("cloudflare_rules.json", ExportFormat::Cloudflare),
            ("cf.json", ExportFormat::Cloudflare),
            ("report.html", ExportFormat::Html),
            ("report.htm", ExportFormat::Html),
            ("dump.sql", ExportFormat::Sql),
            ("dump.db", ExportFormat::Sql),
            ("rules.cf", ExportFormat::Cloudflare),
            ("cloudflare.txt", ExportFormat::Cloudflare),
            ("results.txt", ExportFormat::Csv),
            ("results", ExportFormat::Csv),
        ];
        for (name, expected) in cases {
            assert_eq!(ExportFormat::detect(Path::new(name)), expected, "{name}");
        }
    }

    #[test]
    fn test_detect_ignores_directories() {
        assert_eq!(
            ExportFormat::detect(Path::new("cfg/results.json")),
            ExportFormat::Json
        );
    }

    #[test]
    fn test_explicit_format_wins() {
        assert_eq!(
            OutputFormat::Html.resolve(Path::new("results.csv")),
            ExportFormat::Html
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Path::new("results.sql")),
            ExportFormat::Sql
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "xml".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_resolve_output_path() {
        let exports = Path::new("exports");
        assert_eq!(
            resolve_output_path(Path::new("out.csv"), exports),
            PathBuf::from("exports/out.csv")
        );
        assert_eq!(
            resolve_output_path(Path::new("exports/out.csv"), exports),
            PathBuf::from("exports/out.csv")
        );
        assert_eq!(
            resolve_output_path(Path::new("/tmp/elsewhere/out.csv"), exports),
            PathBuf::from("exports/out.csv")
        );
        assert_eq!(
            resolve_output_path(Path::new("exports/nested/out.csv"), exports),
            PathBuf::from("exports/nested/out.csv")
        );
    }

    #[test]
    fn test_ensure_exports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");
        ensure_exports_dir(&target);
        assert!(target.is_dir());
        ensure_exports_dir(&target);
    }
}
