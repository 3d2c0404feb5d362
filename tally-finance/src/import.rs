//! Statement import: parse → fingerprint → categorize → store.
//!
//! Categorization runs concurrently up to `ImportOptions::concurrency`;
//! results are stored in source order. A key repeated inside one file, or
//! already held by the store, is reported as a duplicate without being
//! categorized.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tally_core::{CanonicalTransaction, CategorizationResult};
use tally_ingest::parse_statement;
use tracing::info;

use crate::categorizer::Categorizer;
use crate::store::{InsertOutcome, StoreError, StoredTransaction, TransactionStore};

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct ImportOptions {
    /// Maximum categorizations in flight
    pub concurrency: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Per-row import result.
#[derive(Debug, Clone, Serialize)]
pub struct ImportedRow {
    pub line: u64,
    pub dedup_key: String,
    pub transaction: CanonicalTransaction,
    /// None when the key was already stored and categorization was skipped
    pub categorization: Option<CategorizationResult>,
    pub outcome: InsertOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub rows: Vec<ImportedRow>,
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    /// Rows that reached either the store or the error list.
    pub fn total_rows(&self) -> usize {
        self.rows.len() + self.errors.len()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn headline(&self) -> String {
        format!(
            "imported {} of {} rows ({} duplicates, {} errors)",
            self.inserted,
            self.total_rows(),
            self.duplicates,
            self.errors.len()
        )
    }
}

enum Prepared {
    Known(CanonicalTransaction, String),
    Fresh(StoredTransaction),
}

/// Import one statement's text into `store`.
///
/// Parse problems end up in `ImportSummary::errors`; only store failures
/// are returned as errors.
pub async fn import_statement(
    content: &str,
    categorizer: &Categorizer,
    store: &dyn TransactionStore,
    options: ImportOptions,
) -> Result<ImportSummary, StoreError> {
    let outcome = parse_statement(content);
    let mut summary = ImportSummary {
        errors: outcome.error_messages(),
        ..ImportSummary::default()
    };

    let mut seen = HashSet::new();
    let keyed: Vec<(CanonicalTransaction, String, bool)> = outcome
        .transactions
        .into_iter()
        .map(|txn| {
            let key = txn.dedup_key();
            let repeated = !seen.insert(key.clone());
            (txn, key, repeated)
        })
        .collect();

    let prepared: Vec<Result<Prepared, StoreError>> = stream::iter(keyed)
        .map(|(txn, key, repeated)| async move {
            if repeated || store.contains(&key).await? {
                return Ok::<_, StoreError>(Prepared::Known(txn, key));
            }
            let categorization = categorizer.categorize_transaction(&txn).await;
            Ok::<_, StoreError>(Prepared::Fresh(StoredTransaction {
                dedup_key: key,
                transaction: txn,
                categorization,
            }))
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    for item in prepared {
        let row = match item? {
            Prepared::Known(transaction, dedup_key) => ImportedRow {
                line: transaction.raw_row.line,
                dedup_key,
                transaction,
                categorization: None,
                outcome: InsertOutcome::Duplicate,
            },
            Prepared::Fresh(record) => {
                let outcome = store.insert(record.clone()).await?;
                ImportedRow {
                    line: record.transaction.raw_row.line,
                    dedup_key: record.dedup_key,
                    transaction: record.transaction,
                    categorization: Some(record.categorization),
                    outcome,
                }
            }
        };
        match row.outcome {
            InsertOutcome::Inserted => summary.inserted += 1,
            InsertOutcome::Duplicate => summary.duplicates += 1,
        }
        summary.rows.push(row);
    }

    info!(
        inserted = summary.inserted,
        duplicates = summary.duplicates,
        errors = summary.errors.len(),
        "statement imported"
    );
    Ok(summary)
}
