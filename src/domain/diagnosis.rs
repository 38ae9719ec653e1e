//! Diagnosis result types.
//!
//! Represents the model output and the final risk report returned to clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::analysis::RiskFactor;
use super::patient::FieldValue;
use super::recommendation::Recommendation;
use super::rules::{ReferenceRange, DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD};

/// Risk tier for coronary heart disease.
///
/// Ordered: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    /// Low risk of heart disease
    Low,
    /// Moderate risk, follow-up recommended
    Medium,
    /// High risk, consultation recommended
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Errors from tier classification.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TierError {
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("invalid thresholds medium={medium}, high={high} (require 0 < medium < high <= 1)")]
    InvalidThresholds { medium: f64, high: f64 },
}

/// Probability cut-offs separating the risk tiers.
///
/// `p >= high` is High, `medium <= p < high` is Medium, anything lower is Low.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    medium: f64,
    high: f64,
}

impl RiskThresholds {
    /// Build a threshold table.
    ///
    /// # Errors
    /// Returns `TierError::InvalidThresholds` unless `0 < medium < high <= 1`.
    pub fn new(medium: f64, high: f64) -> Result<Self, TierError> {
        if !(medium > 0.0 && medium < high && high <= 1.0) {
            return Err(TierError::InvalidThresholds { medium, high });
        }
        Ok(Self { medium, high })
    }

    #[must_use]
    pub fn medium(&self) -> f64 {
        self.medium
    }

    #[must_use]
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Classify a disease probability.
    ///
    /// # Errors
    /// Returns `TierError::ProbabilityOutOfRange` for `p` outside `[0, 1]` or NaN.
    /// Out-of-range values are never clamped.
    pub fn classify(&self, p: f64) -> Result<RiskTier, TierError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(TierError::ProbabilityOutOfRange(p));
        }
        Ok(if p >= self.high {
            RiskTier::High
        } else if p >= self.medium {
            RiskTier::Medium
        } else {
            RiskTier::Low
        })
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            medium: DEFAULT_MEDIUM_THRESHOLD,
            high: DEFAULT_HIGH_THRESHOLD,
        }
    }
}

/// Raw classifier output (before interpretation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    /// Binary prediction (0 = no disease, 1 = disease present)
    pub label: u8,

    /// `[P(no disease), P(disease)]`
    pub probabilities: [f64; 2],
}

impl ModelOutput {
    /// Build an output from the disease probability alone.
    #[must_use]
    pub fn from_disease_probability(p: f64) -> Self {
        Self {
            label: u8::from(p > 0.5),
            probabilities: [1.0 - p, p],
        }
    }

    #[must_use]
    pub fn disease_probability(&self) -> f64 {
        self.probabilities[1]
    }

    #[must_use]
    pub fn no_disease_probability(&self) -> f64 {
        self.probabilities[0]
    }

    /// Confidence score: the larger class probability.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.probabilities[0].max(self.probabilities[1])
    }

    /// Check the consumed contract: finite probabilities in `[0, 1]` summing to 1.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let [a, b] = self.probabilities;
        let in_unit = |p: f64| p.is_finite() && (0.0..=1.0).contains(&p);
        in_unit(a) && in_unit(b) && ((a + b) - 1.0).abs() < 1e-6 && self.label <= 1
    }
}

/// Complete prediction response for one patient.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    /// Model class label (0 = no disease, 1 = disease)
    pub prediction: u8,

    /// Risk tier
    pub risk_level: RiskTier,

    pub probability_no_disease: f64,
    pub probability_disease: f64,

    /// Max class probability
    pub confidence: f64,

    /// Name of the model that produced the prediction
    pub model_name: String,

    pub risk_factors: Vec<RiskFactor>,
    pub recommendations: Vec<Recommendation>,

    /// Reference ranges used for the analysis, keyed by feature name
    pub normal_ranges: BTreeMap<&'static str, ReferenceRange>,

    /// Values as submitted (categorical fields keep their original token)
    pub actual_values: BTreeMap<&'static str, FieldValue>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_from_probability() {
        let t = RiskThresholds::default();
        assert_eq!(t.classify(0.1), Ok(RiskTier::Low));
        assert_eq!(t.classify(0.2), Ok(RiskTier::Medium));
        assert_eq!(t.classify(0.39), Ok(RiskTier::Medium));
        assert_eq!(t.classify(0.4), Ok(RiskTier::High));
        assert_eq!(t.classify(1.0), Ok(RiskTier::High));
        assert_eq!(t.classify(0.0), Ok(RiskTier::Low));
    }

    #[test]
    fn test_alternate_scheme() {
        let t = RiskThresholds::new(0.3, 0.7).expect("valid thresholds");
        assert_eq!(t.classify(0.25), Ok(RiskTier::Low));
        assert_eq!(t.classify(0.5), Ok(RiskTier::Medium));
        assert_eq!(t.classify(0.9), Ok(RiskTier::High));
    }

    #[test]
    fn test_out_of_range_fails_closed() {
        let t = RiskThresholds::default();
        assert!(matches!(t.classify(-0.01), Err(TierError::ProbabilityOutOfRange(_))));
        assert!(matches!(t.classify(1.01), Err(TierError::ProbabilityOutOfRange(_))));
        assert!(t.classify(f64::NAN).is_err());
    }

    #[test]
    fn test_monotonic() {
        let t = RiskThresholds::default();
        let mut previous = RiskTier::Low;
        for i in 0..=1000 {
            let tier = t.classify(f64::from(i) / 1000.0).expect("in range");
            assert!(tier >= previous);
            previous = tier;
        }
        assert_eq!(previous, RiskTier::High);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(RiskThresholds::new(0.0, 0.4).is_err());
        assert!(RiskThresholds::new(0.5, 0.4).is_err());
        assert!(RiskThresholds::new(0.4, 0.4).is_err());
        assert!(RiskThresholds::new(0.2, 1.5).is_err());
        assert!(RiskThresholds::new(f64::NAN, 0.4).is_err());
    }

    #[test]
    fn test_model_output() {
        let out = ModelOutput::from_disease_probability(0.75);
        assert_eq!(out.label, 1);
        assert!((out.confidence() - 0.75).abs() < 1e-12);
        assert!(out.is_well_formed());

        let out = ModelOutput::from_disease_probability(0.1);
        assert_eq!(out.label, 0);
        assert!((out.confidence() - 0.9).abs() < 1e-12);

        let bad = ModelOutput {
            label: 1,
            probabilities: [0.7, 0.7],
        };
        assert!(!bad.is_well_formed());
    }

    #[test]
    fn test_tier_serializes_as_name() {
        let json = serde_json::to_string(&RiskTier::High).expect("serialize");
        assert_eq!(json, "\"High\"");
        assert_eq!(RiskTier::Medium.to_string(), "MEDIUM");
    }
}
