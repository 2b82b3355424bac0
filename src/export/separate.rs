//! Splitting an export into one file per value of a column

use crate::export::{export_titled, ExportError, ExportRequest, DEFAULT_TITLE};
use crate::results::{Column, ResultRow, RowShape};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Column to group rows by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeparateBy {
    /// VPN classification (requires VPN detection)
    Type,
    /// Country code (requires full details)
    Country,
    /// Registry (requires full details)
    Registry,
    /// AS number
    Asn,
}

impl SeparateBy {
    /// Column holding the grouping value
    pub fn column(&self) -> Column {
        match self {
            SeparateBy::Type => Column::Type,
            SeparateBy::Country => Column::Country,
            SeparateBy::Registry => Column::Registry,
            SeparateBy::Asn => Column::Asn,
        }
    }

    /// Check that rows of `shape` carry the grouping column
    pub fn check(&self, shape: RowShape) -> Result<(), ExportError> {
        let column = self.column();
        if shape.has_column(column) {
            return Ok(());
        }
        let reason = match self {
            SeparateBy::Type => "VPN detection is not enabled",
            _ => "full details are not enabled",
        };
        Err(ExportError::ColumnUnavailable {
            column: column.header(),
            reason,
        })
    }
}

impl fmt::Display for SeparateBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column().header())
    }
}

/// One file written by a separated export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatedExport {
    /// Grouping value the file holds
    pub value: String,
    /// File written
    pub path: PathBuf,
    /// Rows in the file
    pub records: usize,
}

/// Reduce a column value to characters safe in a file name
pub fn safe_file_component(value: &str) -> String {
    let safe: String = value
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ' ') { '_' } else { c })
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if safe.is_empty() {
        "empty".to_string()
    } else {
        safe
    }
}

/// Path of the file holding group `value`, next to `base`
pub fn group_path(base: &Path, value: &str, default_ext: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "results".to_string());
    let ext = base
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_else(|| default_ext.to_string());
    let name = format!("{}_{}{}", stem, safe_file_component(value), ext);
    match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Group `rows` by a column, keeping first-seen order of the values
pub fn group_rows<'a>(rows: &'a [ResultRow], column: Column) -> Vec<(String, Vec<&'a ResultRow>)> {
    let mut groups: Vec<(String, Vec<&ResultRow>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        let value = row.value(column);
        match positions.get(value) {
            Some(&position) => groups[position].1.push(row),
            None => {
                positions.insert(value, groups.len());
                groups.push((value.to_string(), vec![row]));
            }
        }
    }
    groups
}

/// Write one file per distinct value of `by`, next to `base.path`.
///
/// Every file uses the format and action of `base`. A group that cannot be
/// written is logged and skipped; the other groups are still written.
pub fn export_separated(
    rows: &[ResultRow],
    shape: RowShape,
    by: SeparateBy,
    base: &ExportRequest,
) -> Result<Vec<SeparatedExport>, ExportError> {
    by.check(shape)?;

    let mut written = Vec::new();
    for (value, group) in group_rows(rows, by.column()) {
        let group: Vec<ResultRow> = group.into_iter().cloned().collect();
        let request = ExportRequest {
            path: group_path(&base.path, &value, base.format.extension()),
            ..base.clone()
        };
        let title = format!("{DEFAULT_TITLE} - {value}");

        match export_titled(&group, shape, &request, &title) {
            Ok(report) => written.push(SeparatedExport {
                value,
                path: report.path,
                records: report.records,
            }),
            Err(e) => log::warn!("Could not save separated file for {}: {}", value, e),
        }
    }
    Ok(written)
}
