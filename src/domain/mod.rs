//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O. Every clinical constant
//! lives in [`rules`].

mod analysis;
mod diagnosis;
mod encoding;
mod features;
mod patient;
mod recommendation;
pub mod rules;

pub use analysis::{analyze, NormalValue, RiskAnalysis, RiskFactor, RiskStatus};
pub use diagnosis::{ModelOutput, PredictionReport, RiskThresholds, RiskTier, TierError};
pub use encoding::{encode_categorical, parse_numeric, ValidationError};
pub use features::{feature_names, Feature, FeatureVector, NumericPolicy, FEATURE_COUNT};
pub use patient::{EncodedRecord, FieldValue, PatientRecord};
pub use recommendation::{recommend, Priority, Recommendation};
pub use rules::{Advice, ReferenceRange, RiskPolicy};

#[cfg(test)]
pub(crate) use patient::fixtures;
