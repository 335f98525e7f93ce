//! Export categorized transactions to CSV.
//!
//! Output is UTF-8 with BOM for Excel compatibility.

use std::io::Write;
use std::path::Path;

use crate::model::statement::StatementRecord;
use crate::model::transaction::Category;

const HEADER: &str = "Email_ID,Statement_Date,Post_Date,Transaction_Date,Description,Category,Amount";

/// Export every transaction of `records` to a CSV file.
///
/// Returns the number of data rows written.
pub fn export_csv(records: &[StatementRecord], output_path: &Path) -> anyhow::Result<usize> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    let rows = write_csv(records, &mut file)?;
    file.flush()?;
    Ok(rows)
}

/// Write the CSV (BOM, header, one row per transaction) to `out`.
pub fn write_csv<W: Write>(records: &[StatementRecord], out: &mut W) -> anyhow::Result<usize> {
    // UTF-8 BOM for Excel
    out.write_all(&[0xEF, 0xBB, 0xBF])?;
    writeln!(out, "{HEADER}")?;

    let mut rows = 0usize;
    for record in records {
        let date = record.date.format("%Y-%m-%d").to_string();
        for txn in &record.transactions {
            let category = txn.category.unwrap_or(Category::Other);
            writeln!(
                out,
                "{},{},{},{},{},{},{}",
                csv_escape(&record.email_id),
                date,
                csv_escape(&txn.post_date),
                csv_escape(&txn.transaction_date),
                csv_escape(&txn.description),
                category,
                txn.amount,
            )?;
            rows += 1;
        }
    }

    Ok(rows)
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
