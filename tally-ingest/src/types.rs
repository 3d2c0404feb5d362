use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tally_core::CanonicalTransaction;
use thiserror::Error;

/// Canonical statement fields a header can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Date,
    Merchant,
    Description,
    Amount,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 4] = [
        CanonicalField::Date,
        CanonicalField::Merchant,
        CanonicalField::Description,
        CanonicalField::Amount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Merchant => "merchant",
            CanonicalField::Description => "description",
            CanonicalField::Amount => "amount",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which header supplies each canonical field for one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    columns: BTreeMap<CanonicalField, String>,
}

impl ColumnMap {
    pub(crate) fn insert(&mut self, field: CanonicalField, header: String) {
        self.columns.insert(field, header);
    }

    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// True when no header matched any canonical field.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Required fields (`date`, `amount`) that no header satisfied.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        [CanonicalField::Date, CanonicalField::Amount]
            .into_iter()
            .filter(|f| !self.columns.contains_key(f))
            .collect()
    }
}

/// Problems found while parsing a statement.
///
/// `MissingColumns`, `EmptyFile` and `Malformed` are structural and abort the
/// file. `InvalidDate` and `InvalidAmount` only exclude their row.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ParseError {
    #[error("Missing required columns: {}. Expected headers naming a date and an amount", join_fields(.missing))]
    MissingColumns { missing: Vec<CanonicalField> },

    #[error("File is empty")]
    EmptyFile,

    #[error("Failed to read delimited text: {0}")]
    Malformed(String),

    #[error("Row {line}: Invalid date format '{value}'")]
    InvalidDate { line: u64, value: String },

    #[error("Row {line}: Invalid amount '{value}'")]
    InvalidAmount { line: u64, value: String },
}

impl ParseError {
    /// Source line for row-level errors.
    pub fn line(&self) -> Option<u64> {
        match self {
            ParseError::InvalidDate { line, .. } | ParseError::InvalidAmount { line, .. } => {
                Some(*line)
            }
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.line().is_none()
    }
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

/// Result of parsing one statement file. Partial results are kept even when
/// some rows failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub success: bool,
    pub transactions: Vec<CanonicalTransaction>,
    pub errors: Vec<ParseError>,
}

impl ParseOutcome {
    pub(crate) fn structural(error: ParseError) -> Self {
        Self {
            success: false,
            transactions: Vec::new(),
            errors: vec![error],
        }
    }

    pub(crate) fn from_parts(transactions: Vec<CanonicalTransaction>, errors: Vec<ParseError>) -> Self {
        Self {
            success: errors.is_empty(),
            transactions,
            errors,
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}
