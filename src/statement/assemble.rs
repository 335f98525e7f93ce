//! Statement record assembly.

use chrono::DateTime;

use crate::error::{Result, StmtError};
use crate::model::email::EmailContent;
use crate::model::statement::StatementRecord;
use crate::model::transaction::{CategoryTotals, Transaction};
use crate::statement::clock::Clock;

/// The only accepted `Date` header layout, e.g. `Mon, 01 Apr 2024 10:00:00 +0000`.
pub const STATEMENT_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// [`STATEMENT_DATE_FORMAT`] without its leading `%a, `.
const DATE_AFTER_WEEKDAY: &str = "%d %b %Y %H:%M:%S %z";

const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parse a statement `Date` header with [`STATEMENT_DATE_FORMAT`].
///
/// The weekday must be a valid abbreviation but is not checked against
/// the calendar date. Surrounding whitespace is rejected.
pub fn parse_statement_date(raw: &str) -> Result<DateTime<chrono::FixedOffset>> {
    let invalid = |reason: String| StmtError::InvalidDate {
        value: raw.to_string(),
        reason,
    };

    let (weekday, rest) = raw
        .split_once(", ")
        .ok_or_else(|| invalid("missing weekday".to_string()))?;
    if !WEEKDAY_ABBREVIATIONS
        .iter()
        .any(|d| d.eq_ignore_ascii_case(weekday))
    {
        return Err(invalid(format!("unknown weekday '{weekday}'")));
    }

    DateTime::parse_from_str(rest, DATE_AFTER_WEEKDAY).map_err(|e| invalid(e.to_string()))
}

/// Combine content, categorized transactions and totals into a record.
///
/// Only `created_at` depends on anything but the inputs, so assembling
/// the same input twice gives records with equal content. A `Date`
/// header in any other layout fails the whole assembly.
pub fn assemble(
    content: &EmailContent,
    user_id: &str,
    transactions: Vec<Transaction>,
    category_totals: CategoryTotals,
    clock: &dyn Clock,
) -> Result<StatementRecord> {
    let date = parse_statement_date(&content.date)?;

    Ok(StatementRecord {
        email_id: content.id.clone(),
        user_id: user_id.to_string(),
        subject: content.subject.clone(),
        from_address: content.from_address.clone(),
        date,
        body_text: content.body_text.clone(),
        transactions,
        category_totals,
        created_at: clock.now(),
    })
}
