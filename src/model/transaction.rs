//! Transactions, spending categories and per-category totals.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A monetary amount held as exact integer cents.
///
/// Serialized as a JSON number with two decimals of precision
/// (`2599` cents ↔ `25.99`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Build an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Parse an unsigned decimal such as `"25.99"`, `"7.5"` or `"12"`.
    ///
    /// At most two fractional digits are accepted. Signs, thousands
    /// separators and currency symbols are rejected. Returns `None` on
    /// overflow.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        if int_part.is_empty() || frac_part.len() > 2 {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        let int_val: i64 = int_part.parse().ok()?;
        let frac_val: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().ok()? * 10,
            _ => frac_part.parse().ok()?,
        };
        int_val
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac_val))
            .map(Self)
    }

    /// The amount as a floating-point number of currency units.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Amount) {
        *self = *self + rhs;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Amount {
        iter.copied().sum()
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() {
            return Err(serde::de::Error::custom("amount must be finite"));
        }
        Ok(Amount((value * 100.0).round() as i64))
    }
}

/// Spending categories, in matching priority order.
///
/// The declaration order is the order the categorizer tries them in,
/// and also the iteration order of [`CategoryTotals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Dining,
    Grocery,
    Travel,
    Entertainment,
    Shopping,
    Gas,
    Utilities,
    Healthcare,
    /// Fallback when no keyword matches.
    Other,
}

impl Category {
    /// Display name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dining => "Dining",
            Self::Grocery => "Grocery",
            Self::Travel => "Travel",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Gas => "Gas",
            Self::Utilities => "Utilities",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One statement line: `<post MM/DD> <txn MM/DD> <description> <amount>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Raw `MM/DD` posting date token.
    pub post_date: String,
    /// Raw `MM/DD` transaction date token.
    pub transaction_date: String,
    pub description: String,
    pub amount: Amount,
    /// Assigned by the categorizer; `None` before that stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// Summed amounts per observed category.
///
/// Only categories with at least one transaction appear as keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTotals(BTreeMap<Category, Amount>);

impl CategoryTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the total for `category`, creating the key if needed.
    pub fn add(&mut self, category: Category, amount: Amount) {
        *self.0.entry(category).or_default() += amount;
    }

    pub fn get(&self, category: Category) -> Option<Amount> {
        self.0.get(&category).copied()
    }

    /// Iterate `(category, total)` pairs in taxonomy order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Amount)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }

    /// Sum over all categories.
    pub fn total(&self) -> Amount {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
