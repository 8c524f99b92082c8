//! ONNX-backed classifier implementations — behind the `onnx-models` feature.
//!
//! Both models are exported from the training notebooks to ONNX with purely
//! numeric inputs: categorical markers are label-encoded the same way the
//! training pipeline encoded them (Negative 0 / Positive 1, Female 0 /
//! Male 1).

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::TensorRef;

use crate::models::{MarkerRow, MarkerValue};

use super::classifier::{MarkerClassifier, RiskClassifier};
use super::InferenceError;

fn load_session(model_path: &Path) -> Result<Session, InferenceError> {
    if !model_path.exists() {
        return Err(InferenceError::ModelUnavailable(format!(
            "model artifact not found: {}",
            model_path.display()
        )));
    }

    Session::builder()
        .map_err(|e: ort::Error| InferenceError::ModelUnavailable(e.to_string()))?
        .with_intra_threads(2)
        .map_err(|e: ort::Error| InferenceError::ModelUnavailable(e.to_string()))?
        .commit_from_file(model_path)
        .map_err(|e: ort::Error| {
            InferenceError::ModelUnavailable(format!("ONNX load failed: {e}"))
        })
}

/// Run a single-row f32 input through a session and pull the first output
/// as a probability row.
fn run_single_row(session: &Mutex<Session>, row: Vec<f32>) -> Result<Vec<f64>, InferenceError> {
    let width = row.len();
    let array = ndarray::Array2::from_shape_vec((1, width), row)
        .map_err(|e| InferenceError::ModelInvocation(e.to_string()))?;
    let tensor = TensorRef::from_array_view(&array)
        .map_err(|e| InferenceError::ModelInvocation(e.to_string()))?;

    let mut session = session
        .lock()
        .map_err(|_| InferenceError::ModelInvocation("session lock poisoned".into()))?;

    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| InferenceError::ModelInvocation(format!("ONNX inference failed: {e}")))?;

    let (shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError::ModelInvocation(format!("output extraction: {e}")))?;

    // Expect [1, n_classes]
    if shape.len() != 2 || shape[0] != 1 {
        return Err(InferenceError::ModelInvocation(format!(
            "unexpected output shape: {shape:?}, expected [1, n_classes]"
        )));
    }

    Ok(data.iter().map(|v| *v as f64).collect())
}

// ═══════════════════════════════════════════════════════════
// Gene-expression risk classifier
// ═══════════════════════════════════════════════════════════

/// Binary risk classifier over the aligned, log-transformed feature vector.
///
/// Uses interior mutability (Mutex) because `ort::Session::run` requires
/// `&mut self` while the pipeline shares the classifier immutably.
pub struct OnnxRiskClassifier {
    session: Mutex<Session>,
}

impl OnnxRiskClassifier {
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        let session = load_session(model_path)?;
        tracing::info!("risk classifier loaded from {}", model_path.display());
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl RiskClassifier for OnnxRiskClassifier {
    fn positive_probability(&self, features: &[f64]) -> Result<f64, InferenceError> {
        let row: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let probabilities = run_single_row(&self.session, row)?;

        // Binary head: [p_negative, p_positive]
        if probabilities.len() != 2 {
            return Err(InferenceError::ModelInvocation(format!(
                "expected 2 class probabilities, got {}",
                probabilities.len()
            )));
        }
        Ok(probabilities[1])
    }
}

// ═══════════════════════════════════════════════════════════
// Clinical-marker classifier
// ═══════════════════════════════════════════════════════════

/// Multi-class marker classifier. The class-label order comes from a JSON
/// sidecar (`classes.json`, array of strings) written at export time.
pub struct OnnxMarkerClassifier {
    session: Mutex<Session>,
    classes: Vec<String>,
}

impl OnnxMarkerClassifier {
    /// `model_dir` must contain `model.onnx` and `classes.json`.
    pub fn load(model_dir: &Path) -> Result<Self, InferenceError> {
        let session = load_session(&model_dir.join("model.onnx"))?;

        let classes_path = model_dir.join("classes.json");
        let raw = std::fs::read_to_string(&classes_path).map_err(|e| {
            InferenceError::ModelUnavailable(format!(
                "class sidecar unreadable at {}: {e}",
                classes_path.display()
            ))
        })?;
        let classes: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            InferenceError::ModelUnavailable(format!("class sidecar malformed: {e}"))
        })?;
        if classes.is_empty() {
            return Err(InferenceError::ModelUnavailable(
                "class sidecar lists no classes".into(),
            ));
        }

        tracing::info!(
            classes = classes.len(),
            "marker classifier loaded from {}",
            model_dir.display()
        );
        Ok(Self {
            session: Mutex::new(session),
            classes,
        })
    }

    /// Label-encode the categorical cells the way the training pipeline did.
    fn encode(row: &MarkerRow) -> Vec<f32> {
        row.values()
            .iter()
            .map(|value| match value {
                MarkerValue::Number(v) => *v as f32,
                MarkerValue::Category("Positive") | MarkerValue::Category("Male") => 1.0,
                MarkerValue::Category(_) => 0.0,
            })
            .collect()
    }

    fn probabilities(&self, row: &MarkerRow) -> Result<Vec<f64>, InferenceError> {
        let probabilities = run_single_row(&self.session, Self::encode(row))?;
        if probabilities.len() != self.classes.len() {
            return Err(InferenceError::ModelInvocation(format!(
                "model returned {} probabilities for {} classes",
                probabilities.len(),
                self.classes.len()
            )));
        }
        Ok(probabilities)
    }
}

impl MarkerClassifier for OnnxMarkerClassifier {
    fn predict(&self, row: &MarkerRow) -> Result<String, InferenceError> {
        let probabilities = self.probabilities(row)?;
        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .ok_or_else(|| InferenceError::ModelInvocation("empty probability row".into()))?;
        Ok(self.classes[best].clone())
    }

    fn predict_proba(&self, row: &MarkerRow) -> Result<Option<Vec<f64>>, InferenceError> {
        Ok(Some(self.probabilities(row)?))
    }
}
