//! Clinical-marker explanation pipeline.
//!
//! Stateless: one flat marker payload in, one prediction with rationale
//! out. Nothing is persisted. Missing lab numerics stay NaN on the way to
//! the model (its own imputation handles them); this is deliberately the
//! opposite of the expression pipeline's zero-fill.

use std::sync::Arc;

use crate::models::{ClinicalMarkerInput, PredictionOutcome};

use super::classifier::{confidence_from, MarkerClassifier};
use super::explain::generate_explanation;
use super::InferenceError;

pub struct MarkerExplainPipeline {
    /// None when the marker model artifact failed to load at startup.
    classifier: Option<Arc<dyn MarkerClassifier>>,
}

impl MarkerExplainPipeline {
    pub fn new(classifier: Arc<dyn MarkerClassifier>) -> Self {
        Self {
            classifier: Some(classifier),
        }
    }

    /// Fail-closed pipeline for a startup load failure.
    pub fn unavailable() -> Self {
        Self { classifier: None }
    }

    /// Predict and explain one marker payload.
    pub fn explain(&self, input: &ClinicalMarkerInput) -> Result<PredictionOutcome, InferenceError> {
        let classifier = self.classifier.as_ref().ok_or_else(|| {
            InferenceError::ModelUnavailable("marker classifier failed to load at startup".into())
        })?;

        let row = input.to_row();

        let prediction = classifier.predict(&row)?;
        let probabilities = classifier.predict_proba(&row)?;
        let confidence = confidence_from(probabilities.as_deref())?;

        let explanation = generate_explanation(&row, &prediction, confidence);

        tracing::debug!(prediction = %prediction, confidence, "marker explanation produced");

        Ok(PredictionOutcome {
            prediction,
            confidence,
            explanation,
        })
    }
}
