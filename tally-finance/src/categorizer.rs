//! Transaction categorizer: remote classifier first, keyword rules on any
//! failure. `categorize` never returns an error.

use std::sync::Arc;

use rust_decimal::Decimal;
use tally_core::{CanonicalTransaction, CategorizationResult};
use tracing::{debug, warn};

use crate::category_rules::categorize_by_rules;
use crate::config::CategorizerConfig;
use crate::llm::{ClassifyError, Classifier, build_classifier};
use crate::prompt::build_prompt;
use crate::response::parse_classification;

#[derive(Clone)]
pub struct Categorizer {
    classifier: Option<Arc<dyn Classifier>>,
}

impl Categorizer {
    /// Build from configuration; no remote section means rules only.
    pub fn new(config: &CategorizerConfig) -> Result<Self, ClassifyError> {
        let classifier = config.remote.as_ref().map(build_classifier).transpose()?;
        Ok(Self { classifier })
    }

    pub fn rules_only() -> Self {
        Self { classifier: None }
    }

    pub fn with_classifier(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.classifier.is_some()
    }

    pub async fn categorize(&self, merchant: &str, description: &str, amount: Decimal) -> CategorizationResult {
        let Some(classifier) = &self.classifier else {
            return categorize_by_rules(merchant, description, amount);
        };

        match classify_remote(classifier.as_ref(), merchant, description, amount).await {
            Ok(result) => {
                debug!(
                    classifier = classifier.name(),
                    category = %result.category,
                    confidence = result.confidence,
                    "remote categorization"
                );
                result
            }
            Err(e) => {
                warn!(
                    classifier = classifier.name(),
                    merchant,
                    error = %e,
                    "remote categorization failed; using rules"
                );
                categorize_by_rules(merchant, description, amount)
            }
        }
    }

    pub async fn categorize_transaction(&self, txn: &CanonicalTransaction) -> CategorizationResult {
        self.categorize(&txn.merchant, &txn.description, txn.amount).await
    }
}

async fn classify_remote(
    classifier: &dyn Classifier,
    merchant: &str,
    description: &str,
    amount: Decimal,
) -> Result<CategorizationResult, ClassifyError> {
    let prompt = build_prompt(merchant, description, amount);
    let reply = classifier.classify(&prompt).await?;
    parse_classification(&reply)
}
