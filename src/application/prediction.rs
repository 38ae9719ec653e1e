//! Prediction service: Orchestrates validation, inference and analysis.
//!
//! This service coordinates:
//! - Encoding of the submitted record
//! - Model inference through the `RiskModel` port
//! - Risk tier classification
//! - Risk factor analysis and recommendations
//! - Model loading and hot reload

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use crate::adapters::LogisticModel;
use crate::domain::{
    analyze, recommend, rules, EncodedRecord, Feature, FeatureVector, PatientRecord, PredictionReport,
    RiskAnalysis, RiskPolicy, ValidationError,
};
use crate::ports::{InferenceError, ModelMetadata, RiskModel};
use crate::{CardioriskError, Result};

/// Liveness report for `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Service for CHD risk prediction.
///
/// The model slot is swapped atomically on reload. Requests clone the current
/// model handle and run inference without holding the lock.
pub struct PredictionService {
    model: RwLock<Option<Arc<dyn RiskModel>>>,
    policy: RiskPolicy,
    model_dir: Option<PathBuf>,
}

impl PredictionService {
    /// Create a service with no model loaded.
    #[must_use]
    pub fn new(policy: RiskPolicy) -> Self {
        Self {
            model: RwLock::new(None),
            policy,
            model_dir: None,
        }
    }

    /// Set the artifact directory used by [`PredictionService::reload`].
    #[must_use]
    pub fn with_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.model_dir = Some(dir.into());
        self
    }

    /// Install a model at construction time.
    #[must_use]
    pub fn with_model(self, model: Arc<dyn RiskModel>) -> Self {
        self.install(model);
        self
    }

    #[must_use]
    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    #[must_use]
    pub fn model_dir(&self) -> Option<&Path> {
        self.model_dir.as_deref()
    }

    /// Replace the active model.
    pub fn install(&self, model: Arc<dyn RiskModel>) {
        tracing::info!("Activating model '{}'", model.name());
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    /// Load artifacts from the configured directory and activate them.
    ///
    /// On failure the previously active model (if any) stays in place.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` when no directory is configured, or the
    /// artifact error from loading.
    pub fn reload(&self) -> Result<ModelMetadata> {
        let dir = self.model_dir.as_deref().ok_or_else(|| {
            CardioriskError::ModelNotLoaded("no model directory configured".to_string())
        })?;

        let model = LogisticModel::load(dir).map_err(|e| {
            tracing::error!("Model reload from {:?} failed: {}", dir, e);
            e
        })?;
        let metadata = model.metadata().clone();
        self.install(Arc::new(model));
        Ok(metadata)
    }

    /// Currently active model, if any.
    #[must_use]
    pub fn current_model(&self) -> Option<Arc<dyn RiskModel>> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_model_loaded(&self) -> bool {
        self.current_model().is_some()
    }

    fn require_model(&self) -> Result<Arc<dyn RiskModel>> {
        self.current_model().ok_or_else(|| {
            CardioriskError::ModelNotLoaded("Please check model files".to_string())
        })
    }

    #[must_use]
    pub fn health(&self) -> HealthReport {
        let model = self.current_model();
        HealthReport {
            status: if model.is_some() { "healthy" } else { "unhealthy" },
            model_loaded: model.is_some(),
            model_name: model.map(|m| m.name().to_string()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Metadata of the active model.
    ///
    /// # Errors
    /// Returns `ModelNotLoaded` when no model is active.
    pub fn model_info(&self) -> Result<ModelMetadata> {
        Ok(self.require_model()?.metadata().clone())
    }

    /// Run the full prediction pipeline for one patient.
    ///
    /// # Errors
    /// Returns `Validation` for bad input, `ModelNotLoaded` without a model,
    /// and `Inference`/`Tier` for unusable model output.
    pub fn predict(&self, record: &PatientRecord) -> Result<PredictionReport> {
        let model = self.require_model()?;
        let encoded = record.encode(self.policy.numeric_policy)?;
        let features = encoded.to_feature_vector(self.policy.numeric_policy)?;
        self.score(model.as_ref(), record, &encoded, &features)
    }

    /// Run predictions for several patients.
    ///
    /// All records are validated before any inference runs. The first invalid
    /// record fails the whole batch and is named by its index.
    ///
    /// # Errors
    /// Same as [`PredictionService::predict`].
    pub fn predict_batch(&self, records: &[PatientRecord]) -> Result<Vec<PredictionReport>> {
        let model = self.require_model()?;
        let prepared = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.encode(self.policy.numeric_policy)
                    .and_then(|e| {
                        let features = e.to_feature_vector(self.policy.numeric_policy)?;
                        Ok((e, features))
                    })
                    .map_err(|e| e.at_index(i))
            })
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;

        let reports = records
            .iter()
            .zip(&prepared)
            .map(|(record, (encoded, features))| {
                self.score(model.as_ref(), record, encoded, features)
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(count = reports.len(), "Batch prediction complete");
        Ok(reports)
    }

    /// Rule-based analysis of the present fields, without inference.
    ///
    /// # Errors
    /// Returns `Validation` if a present field is invalid.
    pub fn analyze(&self, record: &PatientRecord) -> Result<RiskAnalysis> {
        let encoded = record.encode(self.policy.numeric_policy)?;
        let analysis = analyze(&encoded);
        tracing::debug!(
            risk_factors = analysis.total_risk_factors(),
            normal_values = analysis.total_normal_values(),
            "Analysis complete"
        );
        Ok(analysis)
    }

    fn score(
        &self,
        model: &dyn RiskModel,
        record: &PatientRecord,
        encoded: &EncodedRecord,
        features: &FeatureVector,
    ) -> Result<PredictionReport> {
        let output = model.predict(features)?;
        if !output.is_well_formed() {
            return Err(InferenceError::MalformedOutput(format!(
                "probabilities {:?}",
                output.probabilities
            ))
            .into());
        }

        let p = output.disease_probability();
        let tier = self.policy.thresholds.classify(p)?;
        let analysis = analyze(encoded);
        let recommendations = recommend(
            tier,
            &analysis.risk_factors,
            encoded,
            self.policy.max_recommendations,
        );

        tracing::info!(
            "Prediction complete: label={}, probability={:.4}, risk={}, factors={}",
            output.label,
            p,
            tier,
            analysis.total_risk_factors()
        );

        Ok(PredictionReport {
            prediction: output.label,
            risk_level: tier,
            probability_no_disease: output.no_disease_probability(),
            probability_disease: p,
            confidence: output.confidence(),
            model_name: model.name().to_string(),
            risk_factors: analysis.risk_factors,
            recommendations,
            normal_ranges: Feature::ALL
                .into_iter()
                .filter_map(|f| rules::reference_range(f).map(|r| (f.name(), r)))
                .collect(),
            actual_values: record.actual_values(),
            created_at: chrono::Utc::now(),
        })
    }
}
