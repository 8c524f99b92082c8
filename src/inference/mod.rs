pub mod align;
pub mod classifier;
pub mod explain;
pub mod genex;
pub mod markers;
#[cfg(feature = "onnx-models")]
pub mod onnx;
pub mod schema;
pub mod table;

use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("No expression file attached to the request")]
    InputMissing,

    #[error("Uploaded file is {actual} bytes, limit is {limit}")]
    InputTooLarge { actual: usize, limit: usize },

    #[error("Could not parse expression data: {0}")]
    ParseFailure(String),

    #[error("Aligned columns do not match the feature schema: expected {expected}, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    #[error("Model invocation exceeded {0} seconds")]
    ModelTimeout(u64),

    #[error("Unauthorized: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Coarse status classification for the transport layer: client errors are
/// the caller's payload, server errors are ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Client,
    Server,
}

impl InferenceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InputMissing
            | Self::InputTooLarge { .. }
            | Self::ParseFailure(_)
            | Self::SchemaMismatch { .. }
            | Self::Auth(_) => ErrorClass::Client,
            Self::ModelUnavailable(_)
            | Self::ModelInvocation(_)
            | Self::ModelTimeout(_)
            | Self::Database(_) => ErrorClass::Server,
        }
    }
}

/// Structured error body handed to the HTTP collaborator. Nothing in the
/// core panics across a pipeline boundary; every failure flattens to this.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    pub class: ErrorClass,
}

impl From<&InferenceError> for ErrorPayload {
    fn from(err: &InferenceError) -> Self {
        Self {
            error: err.to_string(),
            class: err.class(),
        }
    }
}
