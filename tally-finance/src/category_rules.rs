//! Deterministic keyword rules used when no remote classifier is available
//! or the remote call fails.
//!
//! Groups are checked in order against the lower-cased merchant and
//! description; the first hit wins. Keywords only match whole words, so
//! "mobil" fires on "MOBIL 0421" but not on "T-Mobile".

use rust_decimal::Decimal;
use tally_core::category::{DINING, GROCERIES, INCOME, SUBSCRIPTIONS, TRANSPORT, UNCATEGORIZED};
use tally_core::{CategorizationResult, ResultSource};

struct KeywordRule {
    label: &'static str,
    keywords: &'static [&'static str],
    category: &'static str,
    subcategory: &'static str,
    confidence: f64,
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        label: "grocery",
        keywords: &[
            "grocery", "groceries", "supermarket", "whole foods", "wholefds", "trader joe",
            "safeway", "kroger", "aldi", "publix", "wegmans", "costco", "h-e-b",
        ],
        category: GROCERIES,
        subcategory: "Supermarket",
        confidence: 0.85,
    },
    KeywordRule {
        label: "dining",
        keywords: &[
            "restaurant", "cafe", "café", "coffee", "starbucks", "mcdonald", "mcdonalds", "burger", "pizza",
            "sushi", "taqueria", "doordash", "grubhub", "uber eats",
        ],
        category: DINING,
        subcategory: "Restaurants",
        confidence: 0.8,
    },
    KeywordRule {
        label: "fuel",
        keywords: &[
            "gas station", "fuel", "petrol", "shell", "chevron", "exxon", "mobil", "exxonmobil", "texaco",
            "sunoco", "valero",
        ],
        category: TRANSPORT,
        subcategory: "Fuel",
        confidence: 0.8,
    },
    KeywordRule {
        label: "subscription",
        keywords: &[
            "subscription", "subscriptions", "netflix", "spotify", "hulu", "disney+", "hbo max", "youtube premium",
            "apple.com/bill", "icloud", "prime video",
        ],
        category: SUBSCRIPTIONS,
        subcategory: "Streaming",
        confidence: 0.8,
    },
];

/// Categorize with keyword rules, then the positive-amount income heuristic.
pub fn categorize_by_rules(merchant: &str, description: &str, amount: Decimal) -> CategorizationResult {
    let text = format!("{merchant} {description}").to_lowercase();

    for rule in RULES {
        if let Some(keyword) = rule.keywords.iter().find(|k| contains_word(&text, k)) {
            return CategorizationResult::new(
                rule.category,
                Some(rule.subcategory),
                rule.confidence,
                format!("Matched {} keyword '{}'", rule.label, keyword),
                ResultSource::Rules,
            );
        }
    }

    if amount > Decimal::ZERO {
        return CategorizationResult::new(
            INCOME,
            None,
            0.5,
            "No keyword rule matched; positive amount treated as income",
            ResultSource::Rules,
        );
    }

    CategorizationResult::new(
        UNCATEGORIZED,
        None,
        0.0,
        "No keyword rule matched",
        ResultSource::Rules,
    )
}

/// `keyword` occurs in `text` with no letter or digit directly on either side.
fn contains_word(text: &str, keyword: &str) -> bool {
    text.match_indices(keyword).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_foods_is_groceries() {
        let r = categorize_by_rules("Whole Foods", "Grocery shopping", Decimal::new(-8750, 2));
        assert_eq!(r.category, "Groceries");
        assert_eq!(r.subcategory.as_deref(), Some("Supermarket"));
        assert!(r.confidence > 0.0);
        assert_eq!(r.source, ResultSource::Rules);
    }

    #[test]
    fn test_groups_checked_in_order() {
        // "coffee" (dining) and "costco" (grocery) both hit; grocery is first
        let r = categorize_by_rules("Costco", "coffee beans", Decimal::new(-1999, 2));
        assert_eq!(r.category, "Groceries");

        let r = categorize_by_rules("SHELL OIL 57444", "", Decimal::new(-4000, 2));
        assert_eq!(r.category, "Transport");
        assert_eq!(r.subcategory.as_deref(), Some("Fuel"));

        let r = categorize_by_rules("Netflix.com", "Netflix.com", Decimal::new(-1549, 2));
        assert_eq!(r.category, "Subscriptions");

        let r = categorize_by_rules("Blue Bottle", "Coffee", Decimal::new(-550, 2));
        assert_eq!(r.category, "Dining");
    }

    #[test]
    fn test_positive_unmatched_is_income() {
        let r = categorize_by_rules("Acme Corp", "Payroll", Decimal::new(250000, 2));
        assert_eq!(r.category, "Income");
        assert_eq!(r.confidence, 0.5);
        assert!(r.explanation.contains("positive amount"));
    }

    #[test]
    fn test_negative_unmatched_is_uncategorized() {
        let r = categorize_by_rules("Mystery Vendor", "Misc", Decimal::new(-1200, 2));
        assert_eq!(r.category, "Uncategorized");
        assert_eq!(r.confidence, 0.0);
        assert!(r.subcategory.is_none());

        let r = categorize_by_rules("Mystery Vendor", "Misc", Decimal::ZERO);
        assert_eq!(r.category, "Uncategorized");
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        let r = categorize_by_rules("Mobile Deposit", "MOBILE DEPOSIT REF 1234", Decimal::new(120000, 2));
        assert_eq!(r.category, "Income");

        let r = categorize_by_rules("T-Mobile", "T-MOBILE PCS SVC", Decimal::new(-8500, 2));
        assert_eq!(r.category, "Uncategorized");

        let r = categorize_by_rules("Autumn Automobile Repair", "", Decimal::new(-30000, 2));
        assert_eq!(r.category, "Uncategorized");

        let r = categorize_by_rules("MOBIL 0421", "", Decimal::new(-4210, 2));
        assert_eq!(r.subcategory.as_deref(), Some("Fuel"));
        let r = categorize_by_rules("ExxonMobil", "", Decimal::new(-4210, 2));
        assert_eq!(r.subcategory.as_deref(), Some("Fuel"));
    }

    #[test]
    fn test_word_match_edges() {
        assert!(contains_word("mcdonald's #123", "mcdonald"));
        assert!(contains_word("netflix.com", "netflix"));
        assert!(contains_word("disney+ monthly", "disney+"));
        assert!(!contains_word("seashells", "shell"));
        assert!(contains_word("café olé", "café"));
    }
}
