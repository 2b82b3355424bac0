//! Result rows, run counters and the aggregation from lookup outcomes
//!
//! The set of columns is decided once per run from two mode flags (full
//! detail and VPN detection) and captured in a [`RowShape`]. Every row of a
//! run carries the same optional parts, and exporters iterate
//! [`RowShape::columns`] instead of inspecting rows.

use crate::asn::{AsnRecord, NOT_AVAILABLE};
use crate::vpn::TrafficType;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error text recorded for input lines that are not IP literals
pub const INVALID_IP_ERROR: &str = "Invalid IP format";

/// AS name shown in full-detail mode for input lines that are not IP literals
const INVALID_IP_NAME: &str = "Invalid IP";

/// Terminal state of one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// The lookup succeeded
    Valid {
        /// Registration data for the address
        record: AsnRecord,
        /// VPN classification, present only when detection is enabled
        traffic: Option<TrafficType>,
    },
    /// The line is not an IP literal; no lookup was attempted
    Invalid {
        /// Why the line was rejected
        reason: String,
    },
    /// The lookup was attempted and did not produce a record
    LookupFailed {
        /// Human-readable failure description
        error: String,
    },
}

impl LookupOutcome {
    /// Outcome for a line that failed validation
    pub fn invalid() -> Self {
        LookupOutcome::Invalid {
            reason: INVALID_IP_ERROR.to_string(),
        }
    }

    /// Outcome for a failed lookup
    pub fn failed(error: impl Into<String>) -> Self {
        LookupOutcome::LookupFailed {
            error: error.into(),
        }
    }

    /// Whether the lookup produced a record
    pub fn is_success(&self) -> bool {
        matches!(self, LookupOutcome::Valid { .. })
    }

    /// Error text for failed or invalid outcomes
    pub fn error(&self) -> Option<&str> {
        match self {
            LookupOutcome::Valid { .. } => None,
            LookupOutcome::Invalid { reason } => Some(reason),
            LookupOutcome::LookupFailed { error } => Some(error),
        }
    }
}

/// An input line paired with its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedLookup {
    /// The input line as read (trimmed)
    pub ip: String,
    /// What happened to it
    pub outcome: LookupOutcome,
}

/// One exported column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    /// Input address
    Ip,
    /// Canonical ASN
    Asn,
    /// AS organization name (full detail)
    AsName,
    /// Country code (full detail)
    Country,
    /// Announced prefix (full detail)
    IpBlock,
    /// Registry (full detail)
    Registry,
    /// Error text, empty on success
    Error,
    /// VPN classification (VPN detection)
    Type,
}

impl Column {
    /// Header used in CSV/HTML output and as JSON key
    pub fn header(&self) -> &'static str {
        match self {
            Column::Ip => "IP",
            Column::Asn => "ASN",
            Column::AsName => "AS Name",
            Column::Country => "Country",
            Column::IpBlock => "IP Block",
            Column::Registry => "Registry",
            Column::Error => "Error",
            Column::Type => "Type",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Which optional parts the rows of a run carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowShape {
    /// Include AS name, country, IP block and registry
    pub full_details: bool,
    /// Include the VPN classification column
    pub vpn_detection: bool,
}

impl RowShape {
    /// Create a shape from the two mode flags
    pub fn new(full_details: bool, vpn_detection: bool) -> Self {
        Self {
            full_details,
            vpn_detection,
        }
    }

    /// Columns in export order
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::Ip, Column::Asn];
        if self.full_details {
            columns.extend([
                Column::AsName,
                Column::Country,
                Column::IpBlock,
                Column::Registry,
            ]);
        }
        columns.push(Column::Error);
        if self.vpn_detection {
            columns.push(Column::Type);
        }
        columns
    }

    /// Whether rows of this shape carry a value for `column`
    pub fn has_column(&self, column: Column) -> bool {
        match column {
            Column::Ip | Column::Asn | Column::Error => true,
            Column::AsName | Column::Country | Column::IpBlock | Column::Registry => {
                self.full_details
            }
            Column::Type => self.vpn_detection,
        }
    }
}

/// Registration details carried in full-detail mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowDetails {
    /// AS organization name
    pub as_name: String,
    /// Country code
    pub country: String,
    /// Announced prefix
    pub ip_block: String,
    /// Registry
    pub registry: String,
}

impl RowDetails {
    fn from_record(record: &AsnRecord) -> Self {
        Self {
            as_name: record.as_name().to_string(),
            country: record.country_code().to_string(),
            ip_block: record.ip_block().to_string(),
            registry: record.registry().to_string(),
        }
    }

    fn unavailable(as_name: &str) -> Self {
        Self {
            as_name: as_name.to_string(),
            country: NOT_AVAILABLE.to_string(),
            ip_block: NOT_AVAILABLE.to_string(),
            registry: NOT_AVAILABLE.to_string(),
        }
    }
}

/// The exported unit: one per input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    /// Input address
    pub ip: String,
    /// Canonical ASN or `N/A`
    pub asn: String,
    /// Present in full-detail mode
    pub details: Option<RowDetails>,
    /// Present when VPN detection is enabled
    pub traffic: Option<TrafficType>,
    /// Empty when the lookup succeeded
    pub error: String,
}

impl ResultRow {
    /// Build the row for one completed lookup
    pub fn from_completed(completed: &CompletedLookup, shape: RowShape) -> Self {
        let (asn, details, traffic, error) = match &completed.outcome {
            LookupOutcome::Valid { record, traffic } => (
                record.asn().to_string(),
                RowDetails::from_record(record),
                traffic.unwrap_or(TrafficType::Normal),
                String::new(),
            ),
            LookupOutcome::Invalid { reason } => (
                NOT_AVAILABLE.to_string(),
                RowDetails::unavailable(INVALID_IP_NAME),
                TrafficType::NotAvailable,
                reason.clone(),
            ),
            LookupOutcome::LookupFailed { error } => (
                NOT_AVAILABLE.to_string(),
                RowDetails::unavailable(NOT_AVAILABLE),
                TrafficType::NotAvailable,
                error.clone(),
            ),
        };

        Self {
            ip: completed.ip.clone(),
            asn,
            details: shape.full_details.then_some(details),
            traffic: shape.vpn_detection.then_some(traffic),
            error,
        }
    }

    /// Value of a column; empty for columns this row does not carry
    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::Ip => &self.ip,
            Column::Asn => &self.asn,
            Column::AsName => self.details.as_ref().map_or("", |d| d.as_name.as_str()),
            Column::Country => self.details.as_ref().map_or("", |d| d.country.as_str()),
            Column::IpBlock => self.details.as_ref().map_or("", |d| d.ip_block.as_str()),
            Column::Registry => self.details.as_ref().map_or("", |d| d.registry.as_str()),
            Column::Error => &self.error,
            Column::Type => self.traffic.as_ref().map_or("", TrafficType::as_str),
        }
    }

    /// Whether the row records a successful lookup
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

/// Serializes a row as a map whose keys follow the run's column order
pub struct RowView<'a> {
    row: &'a ResultRow,
    columns: &'a [Column],
}

impl<'a> RowView<'a> {
    /// View `row` through `columns`
    pub fn new(row: &'a ResultRow, columns: &'a [Column]) -> Self {
        Self { row, columns }
    }
}

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column.header(), self.row.value(*column))?;
        }
        map.end()
    }
}

/// Counters for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Lines processed
    pub total: usize,
    /// Successful lookups
    pub succeeded: usize,
    /// Invalid lines plus failed lookups
    pub errored: usize,
    /// Successful lookups classified as VPN
    pub vpn: usize,
    /// Successful lookups classified as normal
    pub normal: usize,
}

impl RunSummary {
    /// Account for one completed lookup
    pub fn record(&mut self, outcome: &LookupOutcome, vpn_enabled: bool) {
        self.total += 1;
        match outcome {
            LookupOutcome::Valid { traffic, .. } => {
                self.succeeded += 1;
                if vpn_enabled {
                    match traffic.unwrap_or(TrafficType::Normal) {
                        TrafficType::Vpn => self.vpn += 1,
                        TrafficType::Normal => self.normal += 1,
                        TrafficType::NotAvailable => {}
                    }
                }
            }
            LookupOutcome::Invalid { .. } | LookupOutcome::LookupFailed { .. } => {
                self.errored += 1;
            }
        }
    }
}

/// Turn ordered outcomes into ordered rows of one uniform shape
pub fn build_rows(
    outcomes: &[CompletedLookup],
    full_details: bool,
    vpn_enabled: bool,
) -> Vec<ResultRow> {
    let shape = RowShape::new(full_details, vpn_enabled);
    outcomes
        .iter()
        .map(|completed| ResultRow::from_completed(completed, shape))
        .collect()
}

/// Count outcome kinds and classifications
pub fn summarize(outcomes: &[CompletedLookup], vpn_enabled: bool) -> RunSummary {
    outcomes
        .iter()
        .fold(RunSummary::default(), |mut summary, completed| {
            summary.record(&completed.outcome, vpn_enabled);
            summary
        })
}
