//! Header inference: which column supplies each canonical field.

use tracing::debug;

use crate::types::{CanonicalField, ColumnMap};

const DATE_VARIANTS: &[&str] = &["date", "posted", "timestamp"];
const MERCHANT_VARIANTS: &[&str] = &["merchant", "description", "payee", "name", "vendor"];
const DESCRIPTION_VARIANTS: &[&str] = &["description", "memo", "details", "narrative", "reference"];
const AMOUNT_VARIANTS: &[&str] = &["amount", "value", "sum", "debit", "credit", "total"];

/// Known header spellings for `field`, most specific first.
pub fn variants(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::Date => DATE_VARIANTS,
        CanonicalField::Merchant => MERCHANT_VARIANTS,
        CanonicalField::Description => DESCRIPTION_VARIANTS,
        CanonicalField::Amount => AMOUNT_VARIANTS,
    }
}

/// Normalize a header cell for matching and row lookup.
pub fn normalize_header(header: &str) -> String {
    header.trim().to_lowercase()
}

/// Infer a `ColumnMap` from a header row.
///
/// Variants are tried in order; for each, the first header containing it
/// wins. One header may serve several fields, so a lone `Description`
/// column feeds both merchant and description.
pub fn map_columns<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
    let mut map = ColumnMap::default();

    for field in CanonicalField::ALL {
        let found = variants(field).iter().find_map(|variant| {
            normalized
                .iter()
                .find(|h| !h.is_empty() && h.contains(variant))
        });
        match found {
            Some(header) => {
                debug!(field = %field, header = %header, "mapped column");
                map.insert(field, header.clone());
            }
            None => debug!(field = %field, "no column matched"),
        }
    }

    map
}
