//! CSV export: a header row followed by one record per result row

use crate::results::{Column, ResultRow};
use csv::Writer;
use std::io::Write;

/// Write `rows` as CSV with one column per entry of `columns`
pub fn write_csv<W: Write>(
    writer: W,
    rows: &[ResultRow],
    columns: &[Column],
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(columns.iter().map(Column::header))?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| row.value(*column)))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::AsnRecord;
    use crate::results::{CompletedLookup, LookupOutcome, RowShape};

    #[test]
    fn test_write_csv() {
        let shape = RowShape::new(true, false);
        let rows: Vec<ResultRow> = [
            CompletedLookup {
                ip: "8.8.8.8".to_string(),
                outcome: LookupOutcome::Valid {
                    record: AsnRecord::new("15169", "GOOGLE, LLC", "US", "8.8.8.0/24", "arin"),
                    traffic: None,
                },
            },
            CompletedLookup {
                ip: "bogus".to_string(),
                outcome: LookupOutcome::invalid(),
            },
        ]
        .iter()
        .map(|c| ResultRow::from_completed(c, shape))
        .collect();

        let mut out = Vec::new();
        write_csv(&mut out, &rows, &shape.columns()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "IP,ASN,AS Name,Country,IP Block,Registry,Error\n\
             8.8.8.8,AS15169,\"GOOGLE, LLC\",US,8.8.8.0/24,arin,\n\
             bogus,N/A,Invalid IP,N/A,N/A,N/A,Invalid IP format\n"
        );
    }
}
