//! tally-core: canonical transaction types, category taxonomy, and dedup keys

pub mod category;
pub mod dedup;
pub mod transaction;

pub use category::{
    CategorizationResult, CategoryDef, ResultSource, TAXONOMY, clamp_confidence, find_category,
};
pub use dedup::dedup_key;
pub use transaction::{CanonicalTransaction, RawRow, UNKNOWN_MERCHANT};
