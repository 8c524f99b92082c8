//! Gene-expression risk pipeline.
//!
//! End-to-end scoring of one uploaded expression file for one authenticated
//! patient: normalize, score, label, persist, respond. The report write is
//! the pipeline's only side effect and happens strictly after a successful
//! prediction.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::Principal;
use crate::config::{MAX_UPLOAD_BYTES, MODEL_INVOKE_TIMEOUT};
use crate::db::ReportStore;
use crate::models::enums::RiskLabel;
use crate::models::{RiskAssessment, RiskReport};

use super::align::prepare_features;
use super::classifier::RiskClassifier;
use super::schema::FeatureSchema;
use super::InferenceError;

/// One uploaded expression file as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct GeneRiskPipeline<S: ReportStore> {
    schema: FeatureSchema,
    /// None when the classifier artifact failed to load at startup; every
    /// request then fails closed with ModelUnavailable.
    classifier: Option<Arc<dyn RiskClassifier>>,
    store: S,
    invoke_timeout: Duration,
    max_upload_bytes: usize,
}

impl<S: ReportStore> GeneRiskPipeline<S> {
    pub fn new(schema: FeatureSchema, classifier: Arc<dyn RiskClassifier>, store: S) -> Self {
        Self {
            schema,
            classifier: Some(classifier),
            store,
            invoke_timeout: MODEL_INVOKE_TIMEOUT,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Construct a fail-closed pipeline after a startup load failure, so the
    /// service can still answer (with server errors) instead of crashing.
    pub fn unavailable(schema: FeatureSchema, store: S) -> Self {
        Self {
            schema,
            classifier: None,
            store,
            invoke_timeout: MODEL_INVOKE_TIMEOUT,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_invoke_timeout(mut self, timeout: Duration) -> Self {
        self.invoke_timeout = timeout;
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Score one upload for one authenticated patient.
    ///
    /// Exactly one report row is created per successful call; none on any
    /// failure path. A report-write failure after a successful prediction
    /// does not discard the result: the assessment comes back with
    /// `persisted: false` and the failure is logged.
    pub fn score_upload(
        &self,
        patient: &Principal,
        upload: Option<Upload>,
    ) -> Result<RiskAssessment, InferenceError> {
        let upload = upload.ok_or(InferenceError::InputMissing)?;

        if upload.bytes.len() > self.max_upload_bytes {
            return Err(InferenceError::InputTooLarge {
                actual: upload.bytes.len(),
                limit: self.max_upload_bytes,
            });
        }

        let classifier = self.classifier.as_ref().ok_or_else(|| {
            InferenceError::ModelUnavailable("risk classifier failed to load at startup".into())
        })?;

        let vector = prepare_features(&upload.bytes, &self.schema)?;

        let probability =
            invoke_with_timeout(Arc::clone(classifier), vector.into_values(), self.invoke_timeout)?;

        // NaN survives clamp, so finiteness has to be checked first.
        if !probability.is_finite() {
            return Err(InferenceError::ModelInvocation(format!(
                "classifier returned non-finite probability: {probability}"
            )));
        }
        let probability = probability.clamp(0.0, 1.0);

        let risk_percentage = round2(probability * 100.0);
        let result_label = RiskLabel::from_percentage(risk_percentage);

        tracing::info!(
            patient = %patient.id,
            file = %upload.file_name,
            risk_percentage,
            label = result_label.as_str(),
            "gene-expression risk scored"
        );

        let report = RiskReport::new(patient.id, risk_percentage, result_label, &upload.file_name);

        let (report_id, persisted) = match self.store.create_report(&report) {
            Ok(id) => (Some(id), true),
            Err(e) => {
                tracing::error!(
                    patient = %patient.id,
                    error = %e,
                    "risk report write failed; returning unpersisted assessment"
                );
                (None, false)
            }
        };

        Ok(RiskAssessment {
            risk_percentage,
            result_label,
            report_id,
            persisted,
        })
    }
}

/// Run the classifier on a worker thread and bound the wait. Inference is
/// the only unbounded-time operation in the pipeline; a stuck model must
/// not hold the request forever.
fn invoke_with_timeout(
    classifier: Arc<dyn RiskClassifier>,
    features: Vec<f64>,
    timeout: Duration,
) -> Result<f64, InferenceError> {
    let (tx, rx) = mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let _ = tx.send(classifier.positive_probability(&features));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(InferenceError::ModelTimeout(timeout.as_secs())),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EXPECTED_FEATURE_COUNT;
    use crate::db::{open_memory_database, DatabaseError, SqliteReportStore};
    use uuid::Uuid;

    struct FixedRisk(f64);

    impl RiskClassifier for FixedRisk {
        fn positive_probability(&self, _features: &[f64]) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    struct SlowRisk;

    impl RiskClassifier for SlowRisk {
        fn positive_probability(&self, _features: &[f64]) -> Result<f64, InferenceError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(0.5)
        }
    }

    /// Store that always fails the insert.
    struct BrokenStore;

    impl ReportStore for BrokenStore {
        fn create_report(&self, _report: &RiskReport) -> Result<Uuid, DatabaseError> {
            Err(DatabaseError::NotFound {
                entity_type: "gene_reports".into(),
                id: "write failed".into(),
            })
        }

        fn get_report(&self, _id: &Uuid) -> Result<Option<RiskReport>, DatabaseError> {
            Ok(None)
        }

        fn list_reports_for_patient(
            &self,
            _patient_id: &Uuid,
        ) -> Result<Vec<RiskReport>, DatabaseError> {
            Ok(Vec::new())
        }
    }

    fn wide_schema() -> FeatureSchema {
        FeatureSchema::from_names((0..EXPECTED_FEATURE_COUNT).map(|i| format!("G{i}")).collect())
    }

    fn sqlite_store() -> SqliteReportStore {
        SqliteReportStore::new(open_memory_database().unwrap())
    }

    fn sample_upload() -> Upload {
        let header: Vec<String> = (0..500).map(|i| format!("G{i}")).collect();
        let row: Vec<String> = (0..500).map(|_| "3.0".to_string()).collect();
        Upload {
            file_name: "expression.csv".into(),
            bytes: format!("{}\n{}\n", header.join(","), row.join(",")).into_bytes(),
        }
    }

    #[test]
    fn missing_upload_is_rejected_before_anything_else() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.9)), sqlite_store());
        let err = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), None)
            .unwrap_err();
        assert!(matches!(err, InferenceError::InputMissing));
    }

    #[test]
    fn oversized_upload_is_rejected() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.9)), sqlite_store())
            .with_max_upload_bytes(10);
        let err = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap_err();
        assert!(matches!(err, InferenceError::InputTooLarge { .. }));
    }

    #[test]
    fn successful_call_persists_exactly_one_report() {
        let store = sqlite_store();
        let patient = Uuid::new_v4();
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.73256)), store);

        let assessment = pipeline
            .score_upload(&Principal::patient(patient), Some(sample_upload()))
            .unwrap();

        assert_eq!(assessment.risk_percentage, 73.26);
        assert_eq!(assessment.result_label, RiskLabel::HighRisk);
        assert!(assessment.persisted);

        let reports = pipeline
            .store
            .list_reports_for_patient(&patient)
            .unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].risk_percentage, 73.26);
        assert_eq!(reports[0].file_name, "expression.csv");
        assert_eq!(reports[0].id, assessment.report_id.unwrap());
    }

    #[test]
    fn exactly_fifty_percent_is_low_risk() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.5)), sqlite_store());
        let assessment = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap();
        assert_eq!(assessment.risk_percentage, 50.0);
        assert_eq!(assessment.result_label, RiskLabel::LowRisk);
    }

    #[test]
    fn parse_failure_persists_nothing() {
        let store = sqlite_store();
        let patient = Uuid::new_v4();
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.9)), store);

        let err = pipeline
            .score_upload(
                &Principal::patient(patient),
                Some(Upload {
                    file_name: "broken.csv".into(),
                    bytes: b"".to_vec(),
                }),
            )
            .unwrap_err();

        assert!(matches!(err, InferenceError::ParseFailure(_)));
        assert!(pipeline
            .store
            .list_reports_for_patient(&patient)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn unavailable_model_fails_closed() {
        let pipeline = GeneRiskPipeline::unavailable(wide_schema(), sqlite_store());
        let err = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelUnavailable(_)));
    }

    #[test]
    fn slow_model_times_out() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(SlowRisk), sqlite_store())
            .with_invoke_timeout(Duration::from_millis(20));
        let err = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelTimeout(_)));
    }

    #[test]
    fn write_failure_keeps_computed_result() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(0.9)), BrokenStore);
        let assessment = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap();

        assert_eq!(assessment.risk_percentage, 90.0);
        assert!(!assessment.persisted);
        assert!(assessment.report_id.is_none());
    }

    #[test]
    fn non_finite_probability_is_invocation_error_and_persists_nothing() {
        let store = sqlite_store();
        let patient = Uuid::new_v4();
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(f64::NAN)), store);

        let err = pipeline
            .score_upload(&Principal::patient(patient), Some(sample_upload()))
            .unwrap_err();

        assert!(matches!(err, InferenceError::ModelInvocation(_)));
        assert!(pipeline
            .store
            .list_reports_for_patient(&patient)
            .unwrap()
            .is_empty());

        let pipeline =
            GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(f64::INFINITY)), sqlite_store());
        let err = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap_err();
        assert!(matches!(err, InferenceError::ModelInvocation(_)));
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        let pipeline = GeneRiskPipeline::new(wide_schema(), Arc::new(FixedRisk(1.2)), sqlite_store());
        let assessment = pipeline
            .score_upload(&Principal::patient(Uuid::new_v4()), Some(sample_upload()))
            .unwrap();
        assert_eq!(assessment.risk_percentage, 100.0);
    }
}
