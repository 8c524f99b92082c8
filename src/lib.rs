pub mod auth;
pub mod config;
pub mod db;
pub mod inference;
pub mod models;

use tracing_subscriber::EnvFilter;

pub use auth::{Authenticator, Principal};
pub use db::{ReportStore, SqliteReportStore};
pub use inference::classifier::{MarkerClassifier, RiskClassifier};
pub use inference::explain::generate_explanation;
pub use inference::genex::{GeneRiskPipeline, Upload};
pub use inference::markers::MarkerExplainPipeline;
pub use inference::schema::FeatureSchema;
pub use inference::{ErrorClass, ErrorPayload, InferenceError};
pub use models::{ClinicalMarkerInput, PredictionOutcome, RiskAssessment, RiskReport};

/// Initialize tracing for binaries embedding this core.
///
/// Honors `RUST_LOG` when set, otherwise falls back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("genex-core v{}", config::CORE_VERSION);
}
