//! Risk model port: Trait for the pretrained classifier.
//!
//! This trait abstracts the serialized estimator (and its paired scaler) from
//! the application logic. The service never looks inside the model.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{FeatureVector, ModelOutput};

/// Errors raised while running inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("model produced malformed output: {0}")]
    MalformedOutput(String),

    #[error("non-finite value in scaled features at column {0}")]
    NonFiniteFeature(usize),
}

/// Descriptive information about a loaded model artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetadata {
    pub model_name: String,

    /// Offline evaluation metrics recorded by the training pipeline
    pub metrics: BTreeMap<String, f64>,

    pub loaded_at: chrono::DateTime<chrono::Utc>,

    /// SHA-256 over the artifact files, when loaded from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_sha256: Option<String>,
}

/// Trait for CHD classifiers.
///
/// Implementations own their feature scaling and must be safe to share
/// read-only across request threads.
pub trait RiskModel: Send + Sync {
    /// Describe the loaded artifact.
    fn metadata(&self) -> &ModelMetadata;

    /// Run inference on an unscaled feature vector.
    ///
    /// # Errors
    /// Returns `InferenceError` if scaling or scoring yields unusable values.
    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, InferenceError>;

    /// Name reported in responses.
    fn name(&self) -> &str {
        &self.metadata().model_name
    }
}
