use serde::{Deserialize, Serialize};

use super::enums::{Gender, MarkerStatus};

/// Column order the clinical-marker classifier was trained on. Internal
/// column names use the dataset's hyphenated spellings; the wire payload
/// uses underscores (see [`ClinicalMarkerInput`]).
pub const MARKER_COLUMNS: [&str; 14] = [
    "Age",
    "Gender",
    "ESR",
    "CRP",
    "RF",
    "Anti-CCP",
    "HLA-B27",
    "ANA",
    "Anti-Ro",
    "Anti-La",
    "Anti-dsDNA",
    "Anti-Sm",
    "C3",
    "C4",
];

/// One explanation request as it arrives from the client app.
///
/// Numeric lab values that were not measured stay absent — the marker model
/// does its own imputation, so missingness is meaningful here and must NOT
/// collapse to 0 the way uploaded expression cells do. Presence markers
/// arrive as booleans and default to false.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClinicalMarkerInput {
    #[serde(rename = "Age", default)]
    pub age: Option<f64>,
    #[serde(rename = "Gender", default)]
    pub gender: Option<Gender>,
    #[serde(rename = "ESR", default)]
    pub esr: Option<f64>,
    #[serde(rename = "CRP", default)]
    pub crp: Option<f64>,
    #[serde(rename = "RF", default)]
    pub rf: Option<f64>,
    #[serde(rename = "Anti_CCP", default)]
    pub anti_ccp: Option<f64>,
    #[serde(rename = "HLA_B27", default)]
    pub hla_b27: bool,
    #[serde(rename = "ANA", default)]
    pub ana: bool,
    #[serde(rename = "Anti_Ro", default)]
    pub anti_ro: bool,
    #[serde(rename = "Anti_La", default)]
    pub anti_la: bool,
    #[serde(rename = "Anti_dsDNA", default)]
    pub anti_dsdna: bool,
    #[serde(rename = "Anti_Sm", default)]
    pub anti_sm: bool,
    #[serde(rename = "C3", default)]
    pub c3: Option<f64>,
    #[serde(rename = "C4", default)]
    pub c4: Option<f64>,
}

/// A cell in the single model-facing row.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerValue {
    /// Lab quantity; NaN when the value was not reported.
    Number(f64),
    /// Categorical marker ("Positive"/"Negative", "Female"/"Male").
    Category(&'static str),
}

/// The one row handed to the marker classifier: [`MARKER_COLUMNS`] order,
/// exactly 14 values.
#[derive(Debug, Clone)]
pub struct MarkerRow {
    values: Vec<MarkerValue>,
}

impl ClinicalMarkerInput {
    /// Build the model-facing row. Age defaults to 0 and Gender to Female
    /// when absent (upstream client behavior, kept for parity); lab numerics
    /// stay NaN; presence booleans become "Positive"/"Negative".
    pub fn to_row(&self) -> MarkerRow {
        let num = |v: Option<f64>| MarkerValue::Number(v.unwrap_or(f64::NAN));
        let cat = |present: bool| MarkerValue::Category(MarkerStatus::from_presence(present).as_str());

        MarkerRow {
            values: vec![
                MarkerValue::Number(self.age.unwrap_or(0.0)),
                MarkerValue::Category(self.gender.unwrap_or(Gender::Female).as_str()),
                num(self.esr),
                num(self.crp),
                num(self.rf),
                num(self.anti_ccp),
                cat(self.hla_b27),
                cat(self.ana),
                cat(self.anti_ro),
                cat(self.anti_la),
                cat(self.anti_dsdna),
                cat(self.anti_sm),
                num(self.c3),
                num(self.c4),
            ],
        }
    }
}

impl MarkerRow {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[MarkerValue] {
        &self.values
    }

    fn get(&self, column: &str) -> Option<&MarkerValue> {
        let idx = MARKER_COLUMNS.iter().position(|c| *c == column)?;
        self.values.get(idx)
    }

    /// Numeric cell by column name; None for categorical columns.
    pub fn number(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            MarkerValue::Number(v) => Some(*v),
            MarkerValue::Category(_) => None,
        }
    }

    /// Categorical cell by column name; None for numeric columns.
    pub fn category(&self, column: &str) -> Option<&'static str> {
        match self.get(column)? {
            MarkerValue::Category(s) => Some(s),
            MarkerValue::Number(_) => None,
        }
    }
}

/// Result of one explanation call. Returned to the caller, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionOutcome {
    #[serde(rename = "disease_prediction")]
    pub prediction: String,
    /// Maximum class probability in [0, 1]; 1.0 when the classifier exposes
    /// no probability interface.
    pub confidence: f64,
    #[serde(rename = "xai_explanation")]
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_matches_trained_column_order() {
        let row = ClinicalMarkerInput::default().to_row();
        assert_eq!(row.len(), MARKER_COLUMNS.len());
    }

    #[test]
    fn missing_lab_numerics_stay_nan_not_zero() {
        let row = ClinicalMarkerInput::default().to_row();
        assert!(row.number("ESR").unwrap().is_nan());
        assert!(row.number("C4").unwrap().is_nan());
        // Age is the exception: absent age defaults to 0.
        assert_eq!(row.number("Age").unwrap(), 0.0);
    }

    #[test]
    fn defaults_mirror_upstream_client() {
        let row = ClinicalMarkerInput::default().to_row();
        assert_eq!(row.category("Gender"), Some("Female"));
        assert_eq!(row.category("HLA-B27"), Some("Negative"));
    }

    #[test]
    fn wire_keys_use_underscore_spellings() {
        let input: ClinicalMarkerInput = serde_json::from_str(
            r#"{"Age": 54, "Anti_CCP": 25.0, "HLA_B27": true, "Anti_dsDNA": false}"#,
        )
        .unwrap();
        let row = input.to_row();
        assert_eq!(row.number("Age"), Some(54.0));
        assert_eq!(row.number("Anti-CCP"), Some(25.0));
        assert_eq!(row.category("HLA-B27"), Some("Positive"));
        assert_eq!(row.category("Anti-dsDNA"), Some("Negative"));
    }

    #[test]
    fn outcome_serializes_with_upstream_field_names() {
        let outcome = PredictionOutcome {
            prediction: "Rheumatoid Arthritis".into(),
            confidence: 0.92,
            explanation: "text".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("disease_prediction").is_some());
        assert!(json.get("xai_explanation").is_some());
    }
}
