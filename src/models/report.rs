use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::RiskLabel;

/// Persisted outcome of one gene-expression risk scoring call.
///
/// Insert-only: this core never mutates or deletes a report once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub id: Uuid,
    pub patient_id: Uuid,
    /// 0–100, rounded to two decimal places at creation.
    pub risk_percentage: f64,
    pub result_label: RiskLabel,
    /// Name of the uploaded expression file this score came from.
    pub file_name: String,
    pub created_at: NaiveDateTime,
}

impl RiskReport {
    pub fn new(patient_id: Uuid, risk_percentage: f64, result_label: RiskLabel, file_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            patient_id,
            risk_percentage,
            result_label,
            file_name: file_name.to_string(),
            created_at: chrono::Local::now().naive_local(),
        }
    }
}

/// What the risk pipeline hands back to the transport layer.
///
/// `persisted` is false when the prediction succeeded but the report write
/// failed; the computed values are still returned rather than discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_percentage: f64,
    pub result_label: RiskLabel,
    pub report_id: Option<Uuid>,
    pub persisted: bool,
}
