//! Assembled statement records and their upward summary.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::{CategoryTotals, Transaction};

/// Identity of a stored statement: one record per email per user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatementKey {
    pub email_id: String,
    pub user_id: String,
}

/// The persistable output of the pipeline for one email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub email_id: String,
    pub user_id: String,
    pub subject: String,
    pub from_address: String,
    /// Parsed `Date` header, keeping the sender's offset.
    pub date: DateTime<FixedOffset>,
    pub body_text: String,
    /// Categorized transactions in source order.
    pub transactions: Vec<Transaction>,
    pub category_totals: CategoryTotals,
    /// Assembly time, from the clock collaborator.
    pub created_at: DateTime<Utc>,
}

impl StatementRecord {
    pub fn key(&self) -> StatementKey {
        StatementKey {
            email_id: self.email_id.clone(),
            user_id: self.user_id.clone(),
        }
    }

    pub fn summary(&self) -> StatementSummary {
        StatementSummary {
            subject: self.subject.clone(),
            transaction_count: self.transactions.len(),
            category_totals: self.category_totals.clone(),
        }
    }

    /// `true` if both records carry the same content, ignoring `created_at`.
    pub fn same_content(&self, other: &StatementRecord) -> bool {
        let mut other = other.clone();
        other.created_at = self.created_at;
        *self == other
    }
}

/// What a successful parse reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementSummary {
    pub subject: String,
    pub transaction_count: usize,
    pub category_totals: CategoryTotals,
}
