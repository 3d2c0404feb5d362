//! Classification prompt: taxonomy, worked examples, and the transaction.

use std::fmt::Write;

use rust_decimal::Decimal;
use tally_core::TAXONOMY;

struct Example {
    merchant: &'static str,
    description: &'static str,
    amount: &'static str,
    answer: &'static str,
}

const EXAMPLES: &[Example] = &[
    Example {
        merchant: "Whole Foods Market",
        description: "WHOLEFDS MKT #10234",
        amount: "-87.50",
        answer: r#"{"category": "Groceries", "subcategory": "Supermarket", "confidence": 0.95, "explanation": "Whole Foods is a grocery chain"}"#,
    },
    Example {
        merchant: "Shell",
        description: "SHELL OIL 57444",
        amount: "-42.10",
        answer: r#"{"category": "Transport", "subcategory": "Fuel", "confidence": 0.9, "explanation": "Shell is a fuel station"}"#,
    },
    Example {
        merchant: "Netflix",
        description: "NETFLIX.COM monthly",
        amount: "-15.49",
        answer: r#"{"category": "Subscriptions", "subcategory": "Streaming", "confidence": 0.95, "explanation": "Recurring streaming charge"}"#,
    },
    Example {
        merchant: "ACME Corp",
        description: "PAYROLL DIRECT DEP",
        amount: "2500.00",
        answer: r#"{"category": "Income", "subcategory": "Salary", "confidence": 0.9, "explanation": "Payroll deposit from an employer"}"#,
    },
    Example {
        merchant: "Chase",
        description: "AUTOPAY PAYMENT THANK YOU",
        amount: "-600.00",
        answer: r#"{"category": "Transfers", "subcategory": "Credit Card Payment", "confidence": 0.85, "explanation": "Credit card bill payment between own accounts"}"#,
    },
];

/// Build the single-turn prompt sent to the remote classifier.
pub fn build_prompt(merchant: &str, description: &str, amount: Decimal) -> String {
    let mut p = String::new();
    p.push_str("You categorize personal bank transactions.\n");
    p.push_str("Negative amounts are money spent; positive amounts are money received.\n\n");

    p.push_str("Categories (subcategories in brackets):\n");
    for cat in TAXONOMY {
        if cat.subcategories.is_empty() {
            let _ = writeln!(p, "- {}", cat.name);
        } else {
            let _ = writeln!(p, "- {} [{}]", cat.name, cat.subcategories.join(", "));
        }
    }

    p.push_str("\nExamples:\n");
    for ex in EXAMPLES {
        let _ = writeln!(
            p,
            "Merchant: {}\nDescription: {}\nAmount: {}\nAnswer: {}\n",
            ex.merchant, ex.description, ex.amount, ex.answer
        );
    }

    p.push_str(
        "Respond with exactly one JSON object with keys \"category\", \"subcategory\" \
         (or null), \"confidence\" (0 to 1) and \"explanation\". Use only the categories \
         listed above.\n\n",
    );
    let _ = write!(
        p,
        "Merchant: {}\nDescription: {}\nAmount: {}\nAnswer:",
        merchant.trim(),
        description.trim(),
        amount
    );
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_taxonomy_and_transaction() {
        let p = build_prompt("Trader Joe's", "TRADER JOE S #552", Decimal::new(-3412, 2));
        for cat in TAXONOMY {
            assert!(p.contains(cat.name), "missing {}", cat.name);
        }
        assert!(p.contains("Groceries [Supermarket, Specialty Food, Warehouse Club]"));
        assert!(p.ends_with("Merchant: Trader Joe's\nDescription: TRADER JOE S #552\nAmount: -34.12\nAnswer:"));
        assert_eq!(p.matches("Answer: {").count(), EXAMPLES.len());
    }
}
