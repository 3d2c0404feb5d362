//! Spending taxonomy and categorization results

use serde::{Deserialize, Serialize};

/// One top-level category and its subcategories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryDef {
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
}

impl CategoryDef {
    /// Canonical spelling of `sub` if it belongs to this category.
    pub fn subcategory(&self, sub: &str) -> Option<&'static str> {
        let sub = sub.trim();
        self.subcategories
            .iter()
            .copied()
            .find(|s| s.eq_ignore_ascii_case(sub))
    }
}

pub const HOUSING: &str = "Housing";
pub const GROCERIES: &str = "Groceries";
pub const DINING: &str = "Dining";
pub const TRANSPORT: &str = "Transport";
pub const SHOPPING: &str = "Shopping";
pub const HEALTH: &str = "Health";
pub const SUBSCRIPTIONS: &str = "Subscriptions";
pub const ENTERTAINMENT: &str = "Entertainment";
pub const TRAVEL: &str = "Travel";
pub const INCOME: &str = "Income";
pub const TRANSFERS: &str = "Transfers";
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Fixed, ordered category taxonomy. Used to build the remote prompt and to
/// validate whatever comes back.
pub const TAXONOMY: &[CategoryDef] = &[
    CategoryDef {
        name: HOUSING,
        subcategories: &["Rent", "Mortgage", "Utilities", "Insurance", "Maintenance"],
    },
    CategoryDef {
        name: GROCERIES,
        subcategories: &["Supermarket", "Specialty Food", "Warehouse Club"],
    },
    CategoryDef {
        name: DINING,
        subcategories: &["Restaurants", "Coffee Shops", "Fast Food", "Delivery", "Bars"],
    },
    CategoryDef {
        name: TRANSPORT,
        subcategories: &["Fuel", "Public Transit", "Rideshare", "Parking", "Auto Maintenance"],
    },
    CategoryDef {
        name: SHOPPING,
        subcategories: &["Clothing", "Electronics", "Home Goods", "General Merchandise"],
    },
    CategoryDef {
        name: HEALTH,
        subcategories: &["Pharmacy", "Medical", "Dental", "Fitness"],
    },
    CategoryDef {
        name: SUBSCRIPTIONS,
        subcategories: &["Streaming", "Software", "Memberships", "News"],
    },
    CategoryDef {
        name: ENTERTAINMENT,
        subcategories: &["Events", "Games", "Hobbies", "Movies"],
    },
    CategoryDef {
        name: TRAVEL,
        subcategories: &["Flights", "Lodging", "Car Rental"],
    },
    CategoryDef {
        name: INCOME,
        subcategories: &["Salary", "Refund", "Interest", "Reimbursement"],
    },
    CategoryDef {
        name: TRANSFERS,
        subcategories: &["Internal Transfer", "Credit Card Payment", "Savings", "Peer to Peer"],
    },
    CategoryDef {
        name: UNCATEGORIZED,
        subcategories: &[],
    },
];

/// Look up a taxonomy entry by name, ignoring case and surrounding space.
pub fn find_category(name: &str) -> Option<&'static CategoryDef> {
    let name = name.trim();
    TAXONOMY.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// Which path produced a categorization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultSource {
    #[serde(rename = "remote")]
    Remote,
    #[serde(rename = "rules")]
    Rules,
}

/// Category assignment for a single transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategorizationResult {
    pub category: String,
    pub subcategory: Option<String>,
    /// Always within 0.0 - 1.0
    pub confidence: f64,
    pub explanation: String,
    pub source: ResultSource,
}

impl CategorizationResult {
    pub fn new(
        category: impl Into<String>,
        subcategory: Option<&str>,
        confidence: f64,
        explanation: impl Into<String>,
        source: ResultSource,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: subcategory.map(str::to_string),
            confidence: clamp_confidence(confidence),
            explanation: explanation.into(),
            source,
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}

/// Clamp into [0, 1]; NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}
