#![allow(dead_code)]

use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const HEADER: &str = "op,merchant,secret,payment,amount,card,expiry,cvv,holder_id,holder,balance";

/// Writes an operation script (header included) to a temp file.
pub fn script(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// A `process` row paying `label` with `card`, opening the card with `balance`.
pub fn process(label: &str, card: &str, balance: &str) -> String {
    format!("process, , , {label}, , {card}, 12/29, 123, 7, Ada Lovelace, {balance}")
}

/// One merchant, then `rows` payments of 1.0 each captured from a single card.
pub fn generate_script(path: &Path, rows: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);

    wtr.write_record(HEADER.split(','))?;
    wtr.write_record(["merchant", "bulk", "pw"])?;

    let opening = rows.to_string();
    for i in 1..=rows {
        let label = format!("p{i}");
        wtr.write_record(["create", "bulk", "pw", &label, "1.0"])?;
        wtr.write_record([
            "process",
            "",
            "",
            &label,
            "",
            "4111111111111111",
            "12/29",
            "123",
            "1",
            "Bulk Buyer",
            &opening,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
