//! Keyword-based categorization.
//!
//! [`TAXONOMY`] is scanned in order and the first category with a keyword
//! contained in the lowercased description wins. Overlapping keywords are
//! therefore resolved by position: `"gas"` is listed under both `Gas` and
//! `Utilities`, so any description containing it lands in `Gas`.

use crate::model::transaction::{Category, Transaction};

/// Ordered `(category, keywords)` table. Keywords are lowercase.
pub static TAXONOMY: &[(Category, &[&str])] = &[
    (
        Category::Dining,
        &["restaurant", "cafe", "dinner", "lunch", "food", "doordash", "ubereats", "grubhub"],
    ),
    (
        Category::Grocery,
        &["grocery", "supermarket", "market", "food", "whole foods", "trader"],
    ),
    (
        Category::Travel,
        &["airline", "hotel", "airbnb", "flight", "travel", "uber", "lyft", "taxi"],
    ),
    (
        Category::Entertainment,
        &["movie", "theater", "netflix", "spotify", "disney", "hulu", "amazon prime"],
    ),
    (
        Category::Shopping,
        &["amazon", "walmart", "target", "store", "shop", "purchase"],
    ),
    (
        Category::Gas,
        &["gas", "shell", "exxon", "mobil", "chevron", "petroleum"],
    ),
    (
        Category::Utilities,
        &["utility", "electric", "water", "gas", "internet", "phone", "bill"],
    ),
    (
        Category::Healthcare,
        &["doctor", "pharmacy", "medical", "health", "dental", "hospital"],
    ),
];

/// Pick the category for a single description.
pub fn categorize_description(description: &str) -> Category {
    let desc = description.to_lowercase();
    TAXONOMY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| desc.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

/// Assign a category to every transaction, keeping their order.
pub fn categorize(mut transactions: Vec<Transaction>) -> Vec<Transaction> {
    for txn in &mut transactions {
        txn.category = Some(categorize_description(&txn.description));
    }
    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::transaction::Amount;

    fn txn(description: &str) -> Transaction {
        Transaction {
            post_date: "01/01".into(),
            transaction_date: "01/01".into(),
            description: description.into(),
            amount: Amount::from_cents(100),
            category: None,
        }
    }

    #[test]
    fn test_taxonomy_order() {
        let order: Vec<Category> = TAXONOMY.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                Category::Dining,
                Category::Grocery,
                Category::Travel,
                Category::Entertainment,
                Category::Shopping,
                Category::Gas,
                Category::Utilities,
                Category::Healthcare,
            ]
        );
    }

    #[test]
    fn test_keywords_are_lowercase() {
        for (_, keywords) in TAXONOMY {
            for k in *keywords {
                assert_eq!(*k, k.to_lowercase());
            }
        }
    }

    #[test]
    fn test_doordash_is_dining() {
        assert_eq!(categorize_description("DOORDASH ORDER"), Category::Dining);
    }

    #[test]
    fn test_gas_beats_utilities() {
        assert_eq!(categorize_description("NATURAL GAS UTILITY"), Category::Gas);
        assert_eq!(categorize_description("CITY ELECTRIC BILL"), Category::Utilities);
    }

    #[test]
    fn test_first_table_entry_wins() {
        // "food" is in Dining and Grocery; "whole foods" only in Grocery,
        // but Dining is checked first.
        assert_eq!(categorize_description("WHOLE FOODS MKT"), Category::Dining);
        // "uber" (Travel) is a prefix of "ubereats" (Dining).
        assert_eq!(categorize_description("UBEREATS"), Category::Dining);
        assert_eq!(categorize_description("UBER TRIP"), Category::Travel);
        // "amazon prime" is Entertainment, plain "amazon" is Shopping.
        assert_eq!(categorize_description("AMAZON PRIME VIDEO"), Category::Entertainment);
        assert_eq!(categorize_description("AMAZON MKTPLACE"), Category::Shopping);
    }

    #[test]
    fn test_unknown_is_other() {
        assert_eq!(categorize_description("UNKNOWN MERCHANT XYZ"), Category::Other);
        assert_eq!(categorize_description(""), Category::Other);
    }

    #[test]
    fn test_categorize_fills_every_transaction() {
        let out = categorize(vec![txn("CVS PHARMACY"), txn("ZZZ"), txn("DELTA AIRLINES")]);
        let cats: Vec<Option<Category>> = out.iter().map(|t| t.category).collect();
        assert_eq!(
            cats,
            vec![
                Some(Category::Healthcare),
                Some(Category::Other),
                Some(Category::Travel)
            ]
        );
        assert_eq!(out[0].description, "CVS PHARMACY");
    }
}
