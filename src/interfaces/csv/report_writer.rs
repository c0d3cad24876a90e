use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

/// One line of the final ledger report.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ReportRow {
    /// `payment`, `card` or `merchant`.
    pub entity: &'static str,
    /// Payment label, card number or merchant name.
    pub key: String,
    /// Current payment status; empty for balances.
    pub status: Option<String>,
    /// Payment amount or account balance.
    pub value: Decimal,
}

/// Writes the ledger report as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        // the header is written explicitly so an empty report still carries it
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    /// Writes the header and every row; decimals are normalized (`15.0` -> `15`).
    pub fn write_rows(&mut self, rows: impl IntoIterator<Item = ReportRow>) -> Result<()> {
        self.writer
            .write_record(["entity", "key", "status", "value"])?;
        for mut row in rows {
            row.value = row.value.normalize();
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_writes_normalized_rows() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_rows([
                ReportRow {
                    entity: "payment",
                    key: "p1".to_string(),
                    status: Some("Succeeded".to_string()),
                    value: dec!(100.00),
                },
                ReportRow {
                    entity: "card",
                    key: "4111111111111111".to_string(),
                    status: None,
                    value: dec!(50.0),
                },
            ])
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "entity,key,status,value\npayment,p1,Succeeded,100\ncard,4111111111111111,,50\n"
        );
    }

    #[test]
    fn test_empty_report_keeps_header() {
        let mut out = Vec::new();
        ReportWriter::new(&mut out)
            .write_rows(Vec::<ReportRow>::new())
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "entity,key,status,value\n");
    }
}
