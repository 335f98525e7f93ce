//! Per-category totals.

use crate::model::transaction::{Category, CategoryTotals, Transaction};

/// Sum amounts by category.
///
/// Sums are exact integer cents, so the grand total of the result equals
/// the sum of all transaction amounts regardless of order. A transaction
/// that was never categorized counts as `Other`.
pub fn aggregate(transactions: &[Transaction]) -> CategoryTotals {
    let mut totals = CategoryTotals::new();
    for txn in transactions {
        totals.add(txn.category.unwrap_or(Category::Other), txn.amount);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::category::categorize;
    use crate::model::transaction::Amount;
    use crate::parser::transaction::extract_transactions;

    #[test]
    fn test_totals_match_transaction_sum() {
        let text = "\
01/02 01/03 DOORDASH ORDER $25.99
01/04 01/04 SHELL OIL 40.01
01/05 01/06 GRUBHUB $10.10
01/07 01/07 MYSTERY VENDOR $0.01
";
        let txns = categorize(extract_transactions(text));
        let totals = aggregate(&txns);

        let expected: Amount = txns.iter().map(|t| t.amount).sum();
        assert_eq!(totals.total(), expected);
        assert_eq!(totals.get(Category::Dining), Some(Amount::from_cents(3609)));
        assert_eq!(totals.get(Category::Gas), Some(Amount::from_cents(4001)));
        assert_eq!(totals.get(Category::Other), Some(Amount::from_cents(1)));
        assert_eq!(totals.len(), 3);
    }

    #[test]
    fn test_order_does_not_matter() {
        let txns = categorize(extract_transactions(
            "02/01 02/01 HULU $7.99\n02/02 02/02 NETFLIX $15.49\n02/03 02/03 UBER $12.30",
        ));
        let mut reversed = txns.clone();
        reversed.reverse();
        assert_eq!(aggregate(&txns), aggregate(&reversed));
    }

    #[test]
    fn test_empty_is_empty() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn test_uncategorized_counts_as_other() {
        let txns = extract_transactions("03/01 03/01 DOORDASH $5.00");
        let totals = aggregate(&txns);
        assert_eq!(totals.get(Category::Other), Some(Amount::from_cents(500)));
    }
}
