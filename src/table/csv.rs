//! CSV adapters for [`RawTable`]. Cells that parse as numbers become
//! `Number`, the usual missing-value tokens become `Null`, everything else is
//! kept as text.

use super::{RawTable, RawValue};
use crate::error::Result;
use std::io::{Read, Write};

const NULL_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL"];

fn parse_cell(cell: &str) -> RawValue {
    if NULL_TOKENS.contains(&cell) {
        return RawValue::Null;
    }
    match cell.parse::<f64>() {
        Ok(n) if n.is_finite() => RawValue::Number(n),
        _ => RawValue::Text(cell.to_string()),
    }
}

/// Read a headered CSV document into a raw table.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = reader
        .headers()?
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(RawTable::new(columns, rows))
}

/// Write a raw table as headered CSV. `Null` is written as an empty cell.
pub fn write_csv<W: Write>(table: &RawTable, writer: W) -> Result<()> {
    let mut writer = ::csv::Writer::from_writer(writer);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_total_charges_stays_text() {
        let data = "customerID,tenure,TotalCharges\nA-1,0, \nB-2,3,\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["customerID", "tenure", "TotalCharges"]);
        assert_eq!(table.rows[0][2], RawValue::Text(" ".into()));
        assert_eq!(table.rows[1][2], RawValue::Null);
        assert_eq!(table.rows[1][1], RawValue::Number(3.0));
    }

    #[test]
    fn infinities_stay_text() {
        let data = "a,b,c\ninf,-Infinity,1e3\n";
        let table = read_csv(data.as_bytes()).unwrap();
        assert_eq!(table.rows[0][0], RawValue::Text("inf".into()));
        assert_eq!(table.rows[0][1], RawValue::Text("-Infinity".into()));
        assert_eq!(table.rows[0][2], RawValue::Number(1000.0));
    }
}
