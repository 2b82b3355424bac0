//! SQL export: one `CREATE TABLE IF NOT EXISTS` and one `INSERT` per row
//!
//! The script targets SQLite syntax.

use crate::results::{Column, ResultRow};
use std::fmt::Write;
use std::path::Path;

/// Table name used when none can be derived from the file name
pub const DEFAULT_TABLE: &str = "asn_results";

/// Derive a table name from the output file stem.
///
/// `-` and `.` become `_`; anything else that is not alphanumeric falls back
/// to [`DEFAULT_TABLE`].
pub fn table_name_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_table_name(&stem).unwrap_or_else(|| DEFAULT_TABLE.to_string())
}

/// Turn `raw` into an identifier, or `None` if it cannot be used as one
pub fn sanitize_table_name(raw: &str) -> Option<String> {
    let name = raw.replace(['-', '.'], "_");
    let usable = name.chars().any(|c| c != '_')
        && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric());
    usable.then_some(name)
}

/// SQL column name for a column header
pub fn column_name(column: Column) -> String {
    column.header().replace(' ', "_")
}

/// Quote a value as an SQL string literal
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render the complete script
pub fn render_sql(rows: &[ResultRow], columns: &[Column], table: &str, title: &str) -> String {
    let mut out = String::new();
    let names: Vec<String> = columns.iter().copied().map(column_name).collect();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "-- {title}");
    let _ = writeln!(out, "-- Total records: {}\n", rows.len());

    let _ = writeln!(out, "CREATE TABLE IF NOT EXISTS {table} (");
    out.push_str("    id INTEGER PRIMARY KEY AUTOINCREMENT");
    for (column, name) in columns.iter().zip(&names) {
        let constraint = if *column == Column::Ip { " NOT NULL" } else { "" };
        let _ = write!(out, ",\n    {name} TEXT{constraint}");
    }
    out.push_str("\n);\n\n");

    let column_list = names.join(", ");
    for row in rows {
        let values: Vec<String> = columns.iter().map(|c| quote(row.value(*c))).collect();
        let _ = writeln!(
            out,
            "INSERT INTO {table} ({column_list}) VALUES ({});",
            values.join(", ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::AsnRecord;
    use crate::export::DEFAULT_TITLE;
    use crate::results::{build_rows, CompletedLookup, LookupOutcome, RowShape};

    #[test]
    fn test_table_name_for() {
        assert_eq!(table_name_for(Path::new("exports/asn-results.v2.sql")), "asn_results_v2");
        assert_eq!(table_name_for(Path::new("my results.sql")), DEFAULT_TABLE);
        assert_eq!(table_name_for(Path::new("---.sql")), DEFAULT_TABLE);
        assert_eq!(table_name_for(Path::new("scan2024.db")), "scan2024");
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn test_render_sql() {
        let completed = vec![CompletedLookup {
            ip: "8.8.8.8".to_string(),
            outcome: LookupOutcome::Valid {
                record: AsnRecord::new("15169", "GOOGLE'S", "US", "8.8.8.0/24", "arin"),
                traffic: None,
            },
        }];
        let shape = RowShape::new(true, false);
        let rows = build_rows(&completed, true, false);
        let script = render_sql(&rows, &shape.columns(), "results", DEFAULT_TITLE);

        let expected = "\
-- ASN Lookup Results
-- Total records: 1

CREATE TABLE IF NOT EXISTS results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    IP TEXT NOT NULL,
    ASN TEXT,
    AS_Name TEXT,
    Country TEXT,
    IP_Block TEXT,
    Registry TEXT,
    Error TEXT
);

INSERT INTO results (IP, ASN, AS_Name, Country, IP_Block, Registry, Error) VALUES ('8.8.8.8', 'AS15169', 'GOOGLE''S', 'US', '8.8.8.0/24', 'arin', '');
";
        assert_eq!(script, expected);
    }
}
