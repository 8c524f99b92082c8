//! Classifier collaborator seams.
//!
//! The pipelines only see these traits; the ONNX-backed implementations
//! live behind the `onnx-models` feature and tests plug in fixed stubs.

use crate::models::MarkerRow;

use super::InferenceError;

/// Binary gene-expression risk classifier over an aligned feature vector.
pub trait RiskClassifier: Send + Sync {
    /// Probability of the positive (high-risk) class, in [0, 1].
    fn positive_probability(&self, features: &[f64]) -> Result<f64, InferenceError>;
}

/// Multi-class clinical-marker classifier over a single fixed-schema row.
pub trait MarkerClassifier: Send + Sync {
    /// Predicted class label.
    fn predict(&self, row: &MarkerRow) -> Result<String, InferenceError>;

    /// Per-class probabilities, or None when the underlying model exposes
    /// no probability interface.
    fn predict_proba(&self, row: &MarkerRow) -> Result<Option<Vec<f64>>, InferenceError>;
}

/// Confidence proxy: the maximum class probability clamped to [0, 1], or
/// 1.0 when the model offers none. An empty or all-NaN probability vector
/// is a model fault, not a confidence of negative infinity.
pub fn confidence_from(probabilities: Option<&[f64]>) -> Result<f64, InferenceError> {
    match probabilities {
        Some(probs) => {
            // f64::max skips NaN operands, so an all-NaN or empty slice
            // folds to -inf and fails the finiteness check below.
            let max = probs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            if !max.is_finite() {
                return Err(InferenceError::ModelInvocation(format!(
                    "classifier returned unusable class probabilities: {probs:?}"
                )));
            }
            Ok(max.clamp(0.0, 1.0))
        }
        None => Ok(1.0),
    }
}
