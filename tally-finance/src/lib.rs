//! tally-finance: transaction categorization (remote classifier with keyword fallback)
//! and the statement import pipeline.

pub mod categorizer;
pub mod category_rules;
pub mod config;
pub mod import;
pub mod llm;
pub mod prompt;
pub mod response;
pub mod store;

pub use categorizer::Categorizer;
pub use category_rules::categorize_by_rules;
pub use config::{CategorizerConfig, Provider, RemoteConfig};
pub use import::{ImportOptions, ImportSummary, ImportedRow, import_statement};
pub use llm::{AnthropicClassifier, Classifier, ClassifyError, OpenAiClassifier, build_classifier};
pub use store::{InsertOutcome, MemoryStore, StoreError, StoredTransaction, TransactionStore};
