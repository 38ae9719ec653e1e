//! # Cardiorisk
//!
//! Coronary heart disease (CHD) risk prediction service.
//!
//! This crate provides:
//! - Validation and encoding of patient health metrics
//! - Inference against a pretrained, externally produced classifier artifact
//! - Rule-based risk factor analysis against clinical reference ranges
//! - Templated lifestyle and follow-up recommendations
//! - An HTTP API (`/predict`, `/analyze`, `/health`, ...)
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and the authoritative clinical rule table
//! - `ports`: Trait definitions for the model boundary
//! - `adapters`: Concrete implementations (JSON logistic artifact, log sanitizer)
//! - `application`: The prediction service orchestrating domain and ports
//! - `http`: axum router and handlers
//! - `config`: Environment-driven settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;

pub use application::PredictionService;
pub use domain::{PatientRecord, PredictionReport, RiskTier};

/// Result type for Cardiorisk operations
pub type Result<T> = std::result::Result<T, CardioriskError>;

/// Main error type for Cardiorisk
#[derive(Debug, thiserror::Error)]
pub enum CardioriskError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Model artifact error: {0}")]
    Artifact(#[from] adapters::ArtifactError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("Risk tier error: {0}")]
    Tier(#[from] domain::TierError),
}
