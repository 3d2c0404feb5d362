//! Delimited statement parser.
//!
//! Detects the delimiter, locates the header row, maps columns, then walks
//! every data row in source order. Row problems are collected; only
//! structural problems abort the file.

use csv::StringRecord;
use tally_core::{CanonicalTransaction, RawRow};
use tracing::{debug, warn};

use crate::columns::{map_columns, normalize_header};
use crate::normalize::{parse_amount, parse_date};
use crate::types::{CanonicalField, ColumnMap, ParseError, ParseOutcome};

/// Delimiters considered during detection, in tie-break order.
pub const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Leading rows searched for a header (exports often start with an account
/// preamble).
const HEADER_SEARCH_ROWS: usize = 10;

/// Pick the delimiter with the most unquoted occurrences across the first
/// non-empty lines. Defaults to comma.
pub fn detect_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(HEADER_SEARCH_ROWS)
        .collect();

    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in DELIMITER_CANDIDATES {
        let count: usize = sample
            .iter()
            .map(|line| count_unquoted(line, candidate as char))
            .sum();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut in_quotes = false;
    let mut count = 0;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => count += 1,
            _ => {}
        }
    }
    count
}

fn read_records(content: &str, delimiter: u8) -> Result<Vec<StringRecord>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());
    rdr.records().collect()
}

/// Index of the header row and its column map.
///
/// Leading rows are skipped only while they look like preamble: fewer than
/// two non-empty cells, or no cell naming any canonical field. The first row
/// past that is the header; if it lacks a date or amount column the file is
/// rejected.
fn locate_header(records: &[StringRecord]) -> Result<(usize, ColumnMap), ParseError> {
    for (idx, record) in records.iter().take(HEADER_SEARCH_ROWS).enumerate() {
        let cells: Vec<&str> = record.iter().filter(|c| !c.trim().is_empty()).collect();
        if cells.len() < 2 {
            continue;
        }
        let map = map_columns(&cells);
        if map.is_empty() {
            continue;
        }
        let missing = map.missing_required();
        if !missing.is_empty() {
            return Err(ParseError::MissingColumns { missing });
        }
        return Ok((idx, map));
    }

    Err(ParseError::MissingColumns {
        missing: vec![CanonicalField::Date, CanonicalField::Amount],
    })
}

fn to_raw_row(headers: &[String], record: &StringRecord) -> RawRow {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let mut row = RawRow::new(line);
    for (header, value) in headers.iter().zip(record.iter()) {
        row.push(header.clone(), value);
    }
    row
}

/// Parse a delimited bank statement into canonical transactions.
pub fn parse_statement(content: &str) -> ParseOutcome {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    if content.trim().is_empty() {
        return ParseOutcome::structural(ParseError::EmptyFile);
    }

    let delimiter = detect_delimiter(content);
    let records = match read_records(content, delimiter) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "failed to split statement");
            return ParseOutcome::structural(ParseError::Malformed(e.to_string()));
        }
    };

    let (header_idx, columns) = match locate_header(&records) {
        Ok(found) => found,
        Err(e) => {
            debug!(error = %e, "statement rejected");
            return ParseOutcome::structural(e);
        }
    };
    debug!(
        delimiter = %(delimiter as char).escape_default(),
        header_row = header_idx + 1,
        "located statement header"
    );

    let headers: Vec<String> = records[header_idx].iter().map(normalize_header).collect();
    let mut transactions = Vec::new();
    let mut errors = Vec::new();

    for record in &records[header_idx + 1..] {
        if let Some(result) = parse_row(&columns, to_raw_row(&headers, record)) {
            match result {
                Ok(txn) => transactions.push(txn),
                Err(e) => {
                    debug!(error = %e, "row rejected");
                    errors.push(e);
                }
            }
        }
    }

    debug!(
        transactions = transactions.len(),
        errors = errors.len(),
        "parsed statement"
    );
    ParseOutcome::from_parts(transactions, errors)
}

/// `None` when the row has no date or amount text at all.
fn parse_row(columns: &ColumnMap, raw: RawRow) -> Option<Result<CanonicalTransaction, ParseError>> {
    let cell = |field: CanonicalField| {
        columns
            .get(field)
            .and_then(|header| raw.get(header))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let (Some(date_text), Some(amount_text)) = (cell(CanonicalField::Date), cell(CanonicalField::Amount))
    else {
        debug!(line = raw.line, "skipping row without date or amount");
        return None;
    };

    let Some(date) = parse_date(date_text) else {
        return Some(Err(ParseError::InvalidDate {
            line: raw.line,
            value: date_text.to_string(),
        }));
    };
    let Some(amount) = parse_amount(amount_text) else {
        return Some(Err(ParseError::InvalidAmount {
            line: raw.line,
            value: amount_text.to_string(),
        }));
    };

    let merchant = cell(CanonicalField::Merchant).map(str::to_string);
    let description = cell(CanonicalField::Description).map(str::to_string);
    Some(Ok(CanonicalTransaction::new(
        date,
        merchant.as_deref(),
        description.as_deref(),
        amount,
        raw,
    )))
}
