//! Alignment of an uploaded expression table onto the trained feature order.
//!
//! Order of operations matters: coerce, fill, reindex, pad, validate, then
//! transform. Validation runs before anything reaches the classifier, so a
//! misaligned vector is never scored.

use crate::config::EXPECTED_FEATURE_COUNT;

use super::schema::FeatureSchema;
use super::table::ExpressionTable;
use super::InferenceError;

/// Single sample reprojected onto the feature schema: one value per schema
/// column, in schema order, plus any defensive padding.
#[derive(Debug, Clone)]
pub struct AlignedFeatureVector {
    values: Vec<f64>,
}

impl AlignedFeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Reindex the table's first sample onto the schema's column order.
/// Schema columns absent from the upload stay 0; uploaded columns outside
/// the schema are dropped silently.
pub fn align(table: &ExpressionTable, schema: &FeatureSchema) -> AlignedFeatureVector {
    let filled = table.first_row_filled();
    let mut values = vec![0.0; schema.len()];
    let mut matched = 0usize;

    for (i, column) in table.columns().iter().enumerate() {
        if let Some(pos) = schema.position(column) {
            values[pos] = filled[i];
            matched += 1;
        }
    }

    tracing::debug!(
        uploaded = table.columns().len(),
        matched,
        schema = schema.len(),
        "aligned expression columns"
    );

    AlignedFeatureVector { values }
}

/// Defensive padding: append zero columns until the vector reaches the
/// count the classifier was trained on. Only fires when the schema artifact
/// itself is shorter than that count; the primary path is a no-op.
pub fn pad_to_expected(vector: &mut AlignedFeatureVector, expected: usize) {
    if vector.values.len() < expected {
        tracing::warn!(
            have = vector.values.len(),
            expected,
            "feature schema shorter than trained width; zero-padding"
        );
        vector.values.resize(expected, 0.0);
    }
}

/// Guard before any model call: the realized width must match what the
/// schema (plus padding) promises the classifier.
pub fn validate(vector: &AlignedFeatureVector, schema: &FeatureSchema) -> Result<(), InferenceError> {
    let expected = schema.len().max(EXPECTED_FEATURE_COUNT);
    if vector.values.len() != expected {
        return Err(InferenceError::SchemaMismatch {
            expected,
            actual: vector.values.len(),
        });
    }
    Ok(())
}

/// `log2(x + 1)` elementwise: stabilizes expression scale, avoids log(0).
pub fn log2_transform(vector: &mut AlignedFeatureVector) {
    for v in &mut vector.values {
        *v = (*v + 1.0).log2();
    }
}

/// Full normalization path: raw upload bytes to a model-ready vector.
pub fn prepare_features(
    bytes: &[u8],
    schema: &FeatureSchema,
) -> Result<AlignedFeatureVector, InferenceError> {
    let table = ExpressionTable::parse(bytes)?;
    let mut vector = align(&table, schema);
    pad_to_expected(&mut vector, EXPECTED_FEATURE_COUNT);
    validate(&vector, schema)?;
    log2_transform(&mut vector);
    Ok(vector)
}
