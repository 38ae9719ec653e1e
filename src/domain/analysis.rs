//! Rule-based risk factor analysis against the reference range table.

use serde::Serialize;

use super::features::Feature;
use super::patient::EncodedRecord;
use super::rules::{reference_range, RISK_CONDITIONS};

/// Direction in which a value leaves its normal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskStatus {
    High,
    Low,
}

/// A feature flagged as contributing risk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub feature: Feature,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normal_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub status: RiskStatus,
}

/// A ranged feature that sits inside its normal interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalValue {
    pub feature: Feature,
    pub value: f64,
    pub normal_min: f64,
    pub normal_max: f64,
    pub unit: &'static str,
}

/// Result of analyzing one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RiskAnalysis {
    pub risk_factors: Vec<RiskFactor>,
    pub normal_values: Vec<NormalValue>,
}

impl RiskAnalysis {
    #[must_use]
    pub fn total_risk_factors(&self) -> usize {
        self.risk_factors.len()
    }

    #[must_use]
    pub fn total_normal_values(&self) -> usize {
        self.normal_values.len()
    }

    /// Whether `feature` was flagged.
    #[must_use]
    pub fn flags(&self, feature: Feature) -> bool {
        self.risk_factors.iter().any(|f| f.feature == feature)
    }
}

/// Analyze the present fields of a record.
///
/// Iterates in fixed feature order, so identical input always produces
/// identical output. Absent fields are skipped.
#[must_use]
pub fn analyze(record: &EncodedRecord) -> RiskAnalysis {
    let mut analysis = RiskAnalysis::default();

    for (feature, value) in record.iter() {
        if RISK_CONDITIONS.contains(&feature) {
            if value >= 1.0 {
                analysis.risk_factors.push(RiskFactor {
                    feature,
                    value,
                    normal_min: None,
                    normal_max: None,
                    unit: None,
                    status: RiskStatus::High,
                });
            }
            continue;
        }

        let Some(range) = reference_range(feature) else {
            continue;
        };

        let status = if value > range.max {
            Some(RiskStatus::High)
        } else if value < range.min {
            Some(RiskStatus::Low)
        } else {
            None
        };

        match status {
            Some(status) => analysis.risk_factors.push(RiskFactor {
                feature,
                value,
                normal_min: Some(range.min),
                normal_max: Some(range.max),
                unit: Some(range.unit),
                status,
            }),
            None => analysis.normal_values.push(NormalValue {
                feature,
                value,
                normal_min: range.min,
                normal_max: range.max,
                unit: range.unit,
            }),
        }
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::features::NumericPolicy;
    use crate::domain::patient::fixtures::{healthy, high_risk};
    use crate::domain::patient::PatientRecord;

    fn encode(record: &PatientRecord) -> EncodedRecord {
        record.encode(NumericPolicy::Reject).expect("Should encode")
    }

    #[test]
    fn test_midpoints_produce_no_risk_factors() {
        let mut record = PatientRecord::default();
        for feature in Feature::ALL {
            if let Some(range) = reference_range(feature) {
                record.set(feature, range.midpoint());
            } else if feature.is_categorical() {
                record.set(feature, if feature == Feature::Sex { "F" } else { "NO" });
            } else {
                record.set(feature, 2.0);
            }
        }
        let analysis = analyze(&encode(&record));
        assert!(analysis.risk_factors.is_empty(), "{:?}", analysis.risk_factors);
        assert_eq!(analysis.total_normal_values(), 8);
    }

    #[test]
    fn test_high_systolic_flagged() {
        let record = PatientRecord::default().with(Feature::SysBp, 200.0);
        let analysis = analyze(&encode(&record));
        assert_eq!(analysis.total_risk_factors(), 1);
        let factor = &analysis.risk_factors[0];
        assert_eq!(factor.feature, Feature::SysBp);
        assert_eq!(factor.status, RiskStatus::High);
        assert_eq!(factor.normal_max, Some(120.0));
    }

    #[test]
    fn test_low_value_flagged_low() {
        let record = PatientRecord::default().with(Feature::HeartRate, 48.0);
        let analysis = analyze(&encode(&record));
        assert_eq!(analysis.risk_factors[0].status, RiskStatus::Low);
    }

    #[test]
    fn test_conditions_always_high() {
        let record = PatientRecord::default()
            .with(Feature::IsSmoking, "yes")
            .with(Feature::PrevalentStroke, "YES")
            .with(Feature::PrevalentHyp, "Yes")
            .with(Feature::Diabetes, "YES")
            .with(Feature::BpMeds, "YES");
        let analysis = analyze(&encode(&record));
        let flagged: Vec<_> = analysis.risk_factors.iter().map(|f| f.feature).collect();
        assert_eq!(flagged, RISK_CONDITIONS.to_vec());
        assert!(analysis.risk_factors.iter().all(|f| f.status == RiskStatus::High));
    }

    #[test]
    fn test_high_risk_patient() {
        let analysis = analyze(&encode(&high_risk()));
        for feature in [
            Feature::SysBp,
            Feature::DiaBp,
            Feature::TotChol,
            Feature::Bmi,
            Feature::IsSmoking,
            Feature::Glucose,
        ] {
            assert!(analysis.flags(feature), "{feature} should be flagged");
        }
        assert!(!analysis.flags(Feature::HeartRate));
        assert!(!analysis.flags(Feature::Age));
    }

    #[test]
    fn test_output_follows_feature_order() {
        let analysis = analyze(&encode(&high_risk()));
        let indices: Vec<_> = analysis.risk_factors.iter().map(|f| f.feature.index()).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);
    }

    #[test]
    fn test_healthy_patient_clean() {
        let analysis = analyze(&encode(&healthy()));
        assert!(analysis.risk_factors.is_empty());
    }

    #[test]
    fn test_absent_fields_skipped() {
        let analysis = analyze(&EncodedRecord::default());
        assert_eq!(analysis, RiskAnalysis::default());
    }
}
