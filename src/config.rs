use std::path::PathBuf;
use std::time::Duration;

/// Core-level constants
pub const CORE_NAME: &str = "genex-core";
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of feature columns the gene-expression classifier was trained on.
/// The feature-schema artifact is expected to carry exactly this many names;
/// alignment pads up to it defensively if the artifact is shorter.
pub const EXPECTED_FEATURE_COUNT: usize = 2000;

/// Upper bound on an uploaded expression file. The source format is a
/// single-sample CSV, so anything past this is rejected, not parsed.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Bound on a single classifier invocation. Model inference is the only
/// unbounded-time operation in either pipeline.
pub const MODEL_INVOKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    "info,genex_core=debug".to_string()
}

/// Get the application data directory
/// ~/Genex/ on all platforms
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Genex")
}

/// Get the models directory (classifier artifacts + feature schema)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Get the default reports database path
pub fn reports_db_path() -> PathBuf {
    app_data_dir().join("reports.db")
}
