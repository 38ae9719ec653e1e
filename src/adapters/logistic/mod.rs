//! Logistic adapter: Implementation of RiskModel for a standard-scaled logistic regression.
//!
//! The training pipeline exports three JSON artifacts into one directory:
//!
//! - `model.json`: model name, coefficients, intercept and evaluation metrics
//! - `scaler.json`: per-feature mean and scale of the standard scaler
//! - `feature_columns.json`: the ordered feature names the model was trained on
//!
//! # Integrity
//!
//! If the directory also contains `manifest.json`, every file it lists must be
//! present and match its SHA-256 digest, and the manifest must bind all three
//! artifact files. Without a manifest the artifacts are loaded as-is.
//!
//! # Schema
//!
//! `feature_columns.json` must list exactly the crate's feature order. Any drift
//! is a load failure: the service never reorders or pads columns per request.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{feature_names, FeatureVector, ModelOutput, FEATURE_COUNT};
use crate::ports::{InferenceError, ModelMetadata, RiskModel};

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURES_FILE: &str = "feature_columns.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Artifact files in digest order.
pub const ARTIFACT_FILES: [&str; 3] = [MODEL_FILE, SCALER_FILE, FEATURES_FILE];

/// Errors raised while loading model artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact file not found: {0:?}")]
    Missing(PathBuf),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{what} has {got} entries, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("scaler scale for column {column} must be finite and > 0, got {value}")]
    InvalidScale { column: usize, value: f64 },

    #[error("non-finite parameter in {0}")]
    NonFinite(&'static str),

    #[error("feature schema drift: artifact has {found:?}, service expects {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("digest mismatch for {file}: manifest {expected}, actual {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("invalid manifest: {0}")]
    Manifest(String),
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub model_name: String,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// Standard scaler parameters: `z = (x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Integrity manifest binding artifact files to SHA-256 digests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: Option<i64>,
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes).iter().map(|b| format!("{b:02x}")).collect()
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_json<T: DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, ArtifactError> {
    serde_json::from_slice(bytes).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn to_array(what: &'static str, values: &[f64]) -> Result<[f64; FEATURE_COUNT], ArtifactError> {
    let array: [f64; FEATURE_COUNT] =
        values
            .try_into()
            .map_err(|_| ArtifactError::LengthMismatch {
                what,
                got: values.len(),
                expected: FEATURE_COUNT,
            })?;
    if array.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::NonFinite(what));
    }
    Ok(array)
}

/// Artifact bytes read once from disk, in [`ARTIFACT_FILES`] order.
struct ArtifactBytes {
    files: Vec<(&'static str, PathBuf, Vec<u8>)>,
}

impl ArtifactBytes {
    fn read(dir: &Path) -> Result<Self, ArtifactError> {
        let files = ARTIFACT_FILES
            .iter()
            .map(|name| {
                let path = dir.join(name);
                read_bytes(&path).map(|bytes| (*name, path, bytes))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { files })
    }

    fn get(&self, name: &str) -> Option<(&Path, &[u8])> {
        self.files
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, path, bytes)| (path.as_path(), bytes.as_slice()))
    }

    fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArtifactError> {
        let (path, bytes) = self
            .get(name)
            .ok_or_else(|| ArtifactError::Manifest(format!("{name} was not read")))?;
        parse_json(path, bytes)
    }

    /// SHA-256 over all artifact files, concatenated in order.
    fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (_, _, bytes) in &self.files {
            hasher.update(bytes);
        }
        hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// Verify `manifest.json` if present.
///
/// Artifact files are checked against the bytes already in memory, so what
/// is verified is exactly what gets parsed. Other listed files are read here.
/// Returns `Ok(None)` when the directory carries no manifest.
fn verify_manifest(
    dir: &Path,
    artifacts: &ArtifactBytes,
) -> Result<Option<ModelManifest>, ArtifactError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        tracing::warn!("No {MANIFEST_FILE} in {:?}; loading artifacts without integrity check", dir);
        return Ok(None);
    }

    let bytes = read_bytes(&manifest_path)?;
    let manifest: ModelManifest = parse_json(&manifest_path, &bytes)?;

    if manifest.version != 1 {
        return Err(ArtifactError::Manifest(format!(
            "unsupported manifest version: {}",
            manifest.version
        )));
    }

    for required in ARTIFACT_FILES {
        if !manifest.files.contains_key(required) {
            return Err(ArtifactError::Manifest(format!(
                "manifest does not bind {required}"
            )));
        }
    }

    for (rel, expected) in &manifest.files {
        // Only plain file names inside the artifact directory.
        if rel.contains('/') || rel.contains('\\') || rel.contains("..") {
            return Err(ArtifactError::Manifest(format!("invalid file entry: {rel}")));
        }
        let actual = match artifacts.get(rel) {
            Some((_, bytes)) => sha256_hex(bytes),
            None => sha256_hex(&read_bytes(&dir.join(rel))?),
        };
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(ArtifactError::DigestMismatch {
                file: rel.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    Ok(Some(manifest))
}

/// Standard-scaled logistic regression loaded from JSON artifacts.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coefficients: [f64; FEATURE_COUNT],
    intercept: f64,
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
    metadata: ModelMetadata,
}

impl LogisticModel {
    /// Build a model from already-parsed artifacts.
    ///
    /// # Errors
    /// Returns error on length mismatch, non-finite parameters or a
    /// non-positive scale.
    pub fn from_parts(
        model: ExportedModel,
        scaler: ExportedScaler,
        artifact_sha256: Option<String>,
    ) -> Result<Self, ArtifactError> {
        if !model.intercept.is_finite() {
            return Err(ArtifactError::NonFinite("intercept"));
        }
        let coefficients = to_array("coefficients", &model.coefficients)?;
        let mean = to_array("scaler mean", &scaler.mean)?;
        let scale = to_array("scaler scale", &scaler.scale)?;

        if let Some((column, value)) = scale.iter().enumerate().find(|(_, s)| **s <= 0.0) {
            return Err(ArtifactError::InvalidScale {
                column,
                value: *value,
            });
        }

        Ok(Self {
            coefficients,
            intercept: model.intercept,
            mean,
            scale,
            metadata: ModelMetadata {
                model_name: model.model_name,
                metrics: model.metrics,
                loaded_at: chrono::Utc::now(),
                artifact_sha256,
            },
        })
    }

    /// Load model, scaler and feature schema from an artifact directory.
    ///
    /// # Errors
    /// Returns error if a file is missing or malformed, the manifest does not
    /// verify, or the feature schema differs from the service's.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let artifacts = ArtifactBytes::read(dir)?;
        verify_manifest(dir, &artifacts)?;

        let columns: Vec<String> = artifacts.parse(FEATURES_FILE)?;
        let expected = feature_names();
        if columns.len() != expected.len() || columns.iter().zip(&expected).any(|(a, b)| a != b) {
            return Err(ArtifactError::SchemaMismatch {
                expected: expected.iter().map(|s| (*s).to_string()).collect(),
                found: columns,
            });
        }

        let model: ExportedModel = artifacts.parse(MODEL_FILE)?;
        let scaler: ExportedScaler = artifacts.parse(SCALER_FILE)?;
        let digest = artifacts.digest();
        let loaded = Self::from_parts(model, scaler, Some(digest))?;

        tracing::info!(
            "Loaded model '{}' from {:?} (n_features={}, sha256={})",
            loaded.metadata.model_name,
            dir,
            FEATURE_COUNT,
            loaded.metadata.artifact_sha256.as_deref().unwrap_or("-")
        );

        Ok(loaded)
    }

    /// Apply the standard scaler.
    fn standardize(&self, features: &FeatureVector) -> Result<[f64; FEATURE_COUNT], InferenceError> {
        let mut out = [0.0; FEATURE_COUNT];
        for (i, x) in features.as_slice().iter().enumerate() {
            let z = (x - self.mean[i]) / self.scale[i];
            if !z.is_finite() {
                return Err(InferenceError::NonFiniteFeature(i));
            }
            out[i] = z;
        }
        Ok(out)
    }

    /// Numerically stable logistic function.
    fn sigmoid(x: f64) -> f64 {
        if x >= 0.0 {
            1.0 / (1.0 + (-x).exp())
        } else {
            let e = x.exp();
            e / (1.0 + e)
        }
    }
}

impl RiskModel for LogisticModel {
    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn predict(&self, features: &FeatureVector) -> Result<ModelOutput, InferenceError> {
        let z = self.standardize(features)?;
        let logit = self.intercept
            + z.iter()
                .zip(self.coefficients.iter())
                .map(|(x, w)| x * w)
                .sum::<f64>();
        let p = Self::sigmoid(logit);
        if !p.is_finite() {
            return Err(InferenceError::MalformedOutput(format!("probability {p}")));
        }
        tracing::debug!(logit, probability = p, "logistic inference");
        Ok(ModelOutput::from_disease_probability(p))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::domain::Feature;

    /// A model driven by systolic pressure only: `logit = (sysBP - 120) / 20 - 2`.
    pub fn sys_bp_model() -> (ExportedModel, ExportedScaler) {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[Feature::SysBp.index()] = 1.0;
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[Feature::SysBp.index()] = 120.0;
        let mut scale = vec![1.0; FEATURE_COUNT];
        scale[Feature::SysBp.index()] = 20.0;

        let mut metrics = BTreeMap::new();
        metrics.insert("roc_auc".to_string(), 0.71);

        (
            ExportedModel {
                model_name: "LogisticRegression".to_string(),
                coefficients,
                intercept: -2.0,
                metrics,
            },
            ExportedScaler { mean, scale },
        )
    }

    /// Write the artifacts of [`sys_bp_model`] into `dir`.
    pub fn write_artifacts(dir: &Path) {
        let (model, scaler) = sys_bp_model();
        std::fs::write(
            dir.join(MODEL_FILE),
            serde_json::to_vec(&model).expect("serialize model"),
        )
        .expect("write model");
        std::fs::write(
            dir.join(SCALER_FILE),
            serde_json::to_vec(&scaler).expect("serialize scaler"),
        )
        .expect("write scaler");
        std::fs::write(
            dir.join(FEATURES_FILE),
            serde_json::to_vec(&feature_names()).expect("serialize columns"),
        )
        .expect("write columns");
    }

    /// Write a manifest binding the current artifact files.
    pub fn write_manifest(dir: &Path) {
        let files = ARTIFACT_FILES
            .iter()
            .map(|name| {
                let bytes = std::fs::read(dir.join(name)).expect("read artifact");
                ((*name).to_string(), sha256_hex(&bytes))
            })
            .collect();
        let manifest = ModelManifest {
            version: 1,
            created_at: None,
            files,
        };
        std::fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest).expect("serialize manifest"),
        )
        .expect("write manifest");
    }
}
