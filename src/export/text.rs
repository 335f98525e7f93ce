//! Plain-text statement reports.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::statement::StatementRecord;

use super::sanitize_filename_part;

/// Render a statement record as a readable report.
pub fn render_report(record: &StatementRecord) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "Date:    {}", record.date.format("%a, %d %b %Y %H:%M:%S %z"));
    let _ = writeln!(out, "From:    {}", record.from_address);
    let _ = writeln!(out, "Subject: {}", record.subject);
    let _ = writeln!(out, "Email:   {}", record.email_id);
    let _ = writeln!(out, "\n{}", "-".repeat(72));

    let _ = writeln!(out, "\n[Transactions: {}]", record.transactions.len());
    for txn in &record.transactions {
        let description: String = txn.description.chars().take(40).collect();
        let category = txn.category.map(|c| c.as_str()).unwrap_or("-");
        let _ = writeln!(
            out,
            "  {:<5} {:<5} {:<40} {:<13} {:>10}",
            txn.post_date, txn.transaction_date, description, category, txn.amount.to_string()
        );
    }

    if !record.category_totals.is_empty() {
        let _ = writeln!(out, "\n[Totals by category]");
        for (category, total) in record.category_totals.iter() {
            let _ = writeln!(out, "  {:<13} {:>10}", category.as_str(), total.to_string());
        }
        let _ = writeln!(out, "  {:<13} {:>10}", "Total", record.category_totals.total().to_string());
    }

    out
}

/// Write the report for `record` into `output_dir`.
pub fn export_text(record: &StatementRecord, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(text_filename(record));
    std::fs::write(&path, render_report(record))?;
    Ok(path)
}

/// Generate a filename for text export.
fn text_filename(record: &StatementRecord) -> String {
    let date = record.date.format("%Y%m%d").to_string();
    let id = sanitize_filename_part(&record.email_id, 80);
    format!("{date}_{id}.txt")
}
