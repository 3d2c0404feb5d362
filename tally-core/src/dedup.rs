//! Deduplication fingerprints for canonical transactions.
//!
//! The key is the lowercase hex SHA-256 of a JSON array
//! `["YYYY-MM-DD", "<amount>", "<merchant>", "<description>"]`. JSON string
//! escaping keeps field boundaries unambiguous, and the amount is rendered
//! with trailing zeros stripped so `87.5` and `87.50` agree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Compute the dedup key for a transaction's defining fields.
pub fn dedup_key(date: NaiveDate, amount: Decimal, merchant: &str, description: &str) -> String {
    let fields = [
        date.format("%Y-%m-%d").to_string(),
        amount.normalize().to_string(),
        merchant.to_string(),
        description.to_string(),
    ];
    // Serializing a [String; 4] cannot fail.
    let canonical = serde_json::to_string(&fields).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
