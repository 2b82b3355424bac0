//! JSON export: a pretty-printed array of row objects

use crate::results::{Column, ResultRow, RowView};
use std::io::Write;

/// Write `rows` as a JSON array; object keys follow `columns`
pub fn write_json<W: Write>(
    writer: W,
    rows: &[ResultRow],
    columns: &[Column],
) -> serde_json::Result<()> {
    let views: Vec<RowView<'_>> = rows.iter().map(|row| RowView::new(row, columns)).collect();
    serde_json::to_writer_pretty(writer, &views)
}
