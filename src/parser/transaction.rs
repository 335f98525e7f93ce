//! Transaction lines from free-form statement text.
//!
//! One layout is recognised: `MM/DD MM/DD DESCRIPTION $AMOUNT`, the
//! fields separated by whitespace. Anything else is skipped.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::model::transaction::{Amount, Transaction};

fn transaction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2}/\d{1,2})\s+(\d{1,2}/\d{1,2})\s+(.+?)\s+(\$?\d+\.\d{2})")
            .expect("invalid transaction regex")
    })
}

/// Scan `text` left to right for non-overlapping transaction matches.
///
/// The description is the shortest run that still lets an amount follow.
/// Amounts with a sign or thousands separators never match, and an amount
/// too large to represent is dropped. An empty result is not an error.
pub fn extract_transactions(text: &str) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for caps in transaction_re().captures_iter(text) {
        let raw_amount = &caps[4];
        let Some(amount) = Amount::parse(raw_amount.trim_start_matches('$')) else {
            debug!(amount = raw_amount, "Skipping unrepresentable amount");
            continue;
        };

        transactions.push(Transaction {
            post_date: caps[1].to_string(),
            transaction_date: caps[2].to_string(),
            description: caps[3].trim().to_string(),
            amount,
            category: None,
        });
    }

    debug!(count = transactions.len(), "Extracted transactions");
    transactions
}
