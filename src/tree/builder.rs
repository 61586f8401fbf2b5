//! Tree builder — extracts a decision tree from a transcript and merges
//! fragments into the cumulative tree via the completion service.
//!
//! Semantic correctness is delegated to the model. Locally we only enforce
//! that the response is a well-formed JSON object; anything else degrades to
//! an empty fragment (extract) or the unchanged tree (merge).

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::model::{DecisionTree, RESERVED_KEYS, UNRESOLVED_KEYS};
use crate::llm::{CompletionRequest, CompletionService, extract_json_object};
use crate::prompts;

/// Temperature for both tree operations (deterministic-ish).
const TREE_TEMPERATURE: f64 = 0.1;

pub struct TreeBuilder {
    llm: Arc<dyn CompletionService>,
}

impl TreeBuilder {
    pub fn new(llm: Arc<dyn CompletionService>) -> Self {
        Self { llm }
    }

    /// Extract a tree fragment from one transcript. Never fails.
    pub async fn extract(&self, transcript: &str) -> DecisionTree {
        if transcript.trim().is_empty() {
            info!("Empty transcript, skipping tree extraction");
            return DecisionTree::new();
        }

        let request = CompletionRequest::new(
            prompts::EXTRACT_SYSTEM,
            prompts::extract_tree_prompt(transcript),
        )
        .with_temperature(TREE_TEMPERATURE);

        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Tree extraction request failed, using empty fragment");
                return DecisionTree::new();
            }
        };
        debug!(response = %raw, "Extraction response");

        match DecisionTree::parse(&extract_json_object(&raw)) {
            Ok(tree) => tree.strip_keys(RESERVED_KEYS),
            Err(e) => {
                warn!(error = %e, "Extraction response is not a tree, using empty fragment");
                DecisionTree::new()
            }
        }
    }

    /// Merge `fragment` into `existing`. Returns `existing` unchanged on any failure.
    pub async fn merge(&self, existing: &DecisionTree, fragment: &DecisionTree) -> DecisionTree {
        if fragment.is_empty() {
            debug!("Empty fragment, merge is a no-op");
            return existing.clone();
        }
        if existing.is_empty() {
            debug!("Empty cumulative tree, adopting fragment");
            return fragment.clone().strip_keys(UNRESOLVED_KEYS);
        }

        let request = CompletionRequest::new(
            prompts::MERGE_SYSTEM,
            prompts::merge_trees_prompt(existing, fragment),
        )
        .with_temperature(TREE_TEMPERATURE);

        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Tree merge request failed, keeping cumulative tree");
                return existing.clone();
            }
        };
        debug!(response = %raw, "Merge response");

        match DecisionTree::parse(&extract_json_object(&raw)) {
            Ok(merged) => {
                let merged = merged.strip_keys(UNRESOLVED_KEYS);
                // Both inputs are non-empty here, so an empty result can only lose information.
                if merged.is_empty() {
                    warn!("Merge response is an empty tree, keeping cumulative tree");
                    return existing.clone();
                }
                merged
            }
            Err(e) => {
                warn!(error = %e, "Merge response is not a tree, keeping cumulative tree");
                existing.clone()
            }
        }
    }
}
