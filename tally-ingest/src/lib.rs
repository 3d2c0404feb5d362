//! tally-ingest: delimited statement parsing, column inference, and field normalization.

pub mod columns;
pub mod normalize;
pub mod parser;
pub mod types;

pub use columns::map_columns;
pub use normalize::{parse_amount, parse_date};
pub use parser::{detect_delimiter, parse_statement};
pub use types::{CanonicalField, ColumnMap, ParseError, ParseOutcome};
