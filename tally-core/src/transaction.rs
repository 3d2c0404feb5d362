//! Canonical transaction records produced by statement ingestion

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dedup::dedup_key;

/// Merchant used when a statement row carries no merchant text.
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// One data row of a delimited statement, keyed by normalized header name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based line number in the source text
    pub line: u64,
    /// (lower-cased trimmed header, cell text) in column order
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            cells: Vec::new(),
        }
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push((header.into(), value.into()));
    }

    /// Cell under `header`. The first column wins when a header repeats.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }
}

/// A statement row normalized into typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub description: String,
    /// Negative = outflow, positive = inflow, as given by the source file
    pub amount: Decimal,
    pub raw_row: RawRow,
}

impl CanonicalTransaction {
    /// Build a record, applying the merchant and description fallbacks.
    pub fn new(
        date: NaiveDate,
        merchant: Option<&str>,
        description: Option<&str>,
        amount: Decimal,
        raw_row: RawRow,
    ) -> Self {
        let merchant = merchant
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_MERCHANT)
            .to_string();
        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| merchant.clone());

        Self {
            date,
            merchant,
            description,
            amount,
            raw_row,
        }
    }

    /// Stable fingerprint used to reject re-imported rows.
    pub fn dedup_key(&self) -> String {
        dedup_key(self.date, self.amount, &self.merchant, &self.description)
    }

    pub fn is_outflow(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn is_inflow(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_description_falls_back_to_merchant() {
        let txn = CanonicalTransaction::new(
            date(),
            Some("  Whole Foods "),
            None,
            Decimal::new(-8750, 2),
            RawRow::new(2),
        );
        assert_eq!(txn.merchant, "Whole Foods");
        assert_eq!(txn.description, "Whole Foods");
        assert!(txn.is_outflow());
    }

    #[test]
    fn test_missing_merchant_is_unknown() {
        let txn = CanonicalTransaction::new(date(), Some("   "), Some("ATM"), Decimal::ONE, RawRow::new(3));
        assert_eq!(txn.merchant, UNKNOWN_MERCHANT);
        assert_eq!(txn.description, "ATM");
        assert!(txn.is_inflow());
    }

    #[test]
    fn test_raw_row_first_header_wins() {
        let mut row = RawRow::new(4);
        row.push("amount", "1.00");
        row.push("amount", "2.00");
        assert_eq!(row.get("amount"), Some("1.00"));
        assert_eq!(row.get("date"), None);
    }
}
