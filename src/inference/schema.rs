//! Fixed feature schema for the gene-expression classifier.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::InferenceError;

/// Ordered gene-identifier list fixed at training time. Loaded once at
/// process start and shared read-only across requests; cloning is cheap.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    names: Arc<[String]>,
    index: Arc<HashMap<String, usize>>,
}

impl FeatureSchema {
    pub fn from_names(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self {
            names: names.into(),
            index: Arc::new(index),
        }
    }

    /// Load the schema artifact: a JSON array of feature names, written out
    /// alongside the trained model.
    pub fn load(path: &Path) -> Result<Self, InferenceError> {
        if !path.exists() {
            return Err(InferenceError::ModelUnavailable(format!(
                "feature schema artifact not found: {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelUnavailable(format!("feature schema unreadable: {e}"))
        })?;
        let names: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            InferenceError::ModelUnavailable(format!("feature schema malformed: {e}"))
        })?;

        if names.is_empty() {
            return Err(InferenceError::ModelUnavailable(
                "feature schema artifact is empty".into(),
            ));
        }

        // A duplicated gene name would make only its last position
        // addressable, leaving the earlier column stuck at 0 after
        // alignment. The artifact is startup input, so refuse it outright.
        let mut seen = std::collections::HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(InferenceError::ModelUnavailable(format!(
                    "feature schema lists duplicate gene: {name}"
                )));
            }
        }

        tracing::info!(features = names.len(), "feature schema loaded from {}", path.display());
        Ok(Self::from_names(names))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Position of a feature in the trained column order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}
