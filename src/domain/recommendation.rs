//! Recommendation generation from tier, risk factors and the patient's values.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::analysis::{RiskFactor, RiskStatus};
use super::diagnosis::RiskTier;
use super::features::Feature;
use super::patient::EncodedRecord;
use super::rules::{advice_for, factor_guidance, reference_range, tier_messages, Advice};

/// Urgency of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Maintenance,
    Preventive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub title: String,
    pub message: String,
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advice: Option<Advice>,
}

fn factor_message(factor: &RiskFactor, advice: &Advice) -> String {
    let feature = factor.feature;
    let label = feature.label();
    match (factor.normal_min, factor.normal_max, factor.unit) {
        (Some(min), Some(max), Some(unit)) => match factor.status {
            RiskStatus::High => format!(
                "Your {label} is {} {unit}, above the normal maximum of {max} {unit}. {}.",
                factor.value, advice.diet
            ),
            RiskStatus::Low => format!(
                "Your {label} is {} {unit}, below the normal minimum of {min} {unit}. {}.",
                factor.value, advice.monitoring
            ),
        },
        _ => match feature {
            Feature::IsSmoking => format!(
                "Smoking significantly increases cardiovascular risk. {}.",
                advice.lifestyle
            ),
            _ => format!(
                "A history of {label} raises your cardiovascular risk. {}.",
                advice.lifestyle
            ),
        },
    }
}

fn for_factor(factor: &RiskFactor) -> Recommendation {
    let advice = advice_for(factor.feature);
    let (title, priority) = match factor_guidance(factor.feature) {
        Some(g) => (g.title.to_string(), g.priority),
        None => (format!("Review Your {}", factor.feature), Priority::Medium),
    };
    Recommendation {
        title,
        message: factor_message(factor, &advice),
        priority,
        advice: Some(advice),
    }
}

fn preventive(record: &EncodedRecord) -> impl Iterator<Item = Recommendation> + '_ {
    record.iter().filter_map(|(feature, value)| {
        let range = reference_range(feature)?;
        if !range.is_near_max(value) {
            return None;
        }
        let advice = advice_for(feature);
        Some(Recommendation {
            title: format!("Monitor Your {}", feature.label()),
            message: format!(
                "Your {} of {value} {} is within normal range but approaching the upper limit of {} {}. {}.",
                feature.label(),
                range.unit,
                range.max,
                range.unit,
                advice.diet
            ),
            priority: Priority::Preventive,
            advice: Some(advice),
        })
    })
}

/// Assemble recommendations.
///
/// Order: tier boilerplate, one entry per risk factor, then (Low tier only)
/// preventive notes for values in the top band of their normal range. Factors
/// sharing a title (sysBP and diaBP, is_smoking and cigsPerDay) yield one entry.
/// The list is cut at `cap` in assembly order.
#[must_use]
pub fn recommend(
    tier: RiskTier,
    factors: &[RiskFactor],
    record: &EncodedRecord,
    cap: usize,
) -> Vec<Recommendation> {
    let boilerplate = tier_messages(tier).iter().map(|m| Recommendation {
        title: m.title.to_string(),
        message: m.message.to_string(),
        priority: m.priority,
        advice: None,
    });

    let specific = factors.iter().map(for_factor);

    let preventive = (tier == RiskTier::Low)
        .then(|| preventive(record))
        .into_iter()
        .flatten();

    let mut seen = HashSet::new();
    boilerplate
        .chain(specific)
        .chain(preventive)
        .filter(|r| seen.insert(r.title.clone()))
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::analyze;
    use crate::domain::features::NumericPolicy;
    use crate::domain::patient::fixtures::{healthy, high_risk};
    use crate::domain::patient::PatientRecord;

    fn encode(record: &PatientRecord) -> EncodedRecord {
        record.encode(NumericPolicy::Reject).expect("Should encode")
    }

    #[test]
    fn test_high_tier_order() {
        let record = encode(&high_risk());
        let factors = analyze(&record).risk_factors;
        let recs = recommend(RiskTier::High, &factors, &record, 8);

        assert_eq!(recs.len(), 8);
        assert_eq!(recs[0].title, "Immediate Medical Consultation");
        assert_eq!(recs[0].priority, Priority::Urgent);
        assert_eq!(recs[1].title, "Lifestyle Changes");
        assert_eq!(recs[2].title, "Quit Smoking");
        assert!(recs.iter().all(|r| r.priority != Priority::Preventive));
    }

    #[test]
    fn test_shared_titles_do_not_crowd_out_factors() {
        let record = encode(&high_risk());
        let factors = analyze(&record).risk_factors;
        let recs = recommend(RiskTier::High, &factors, &record, 8);

        let titles: Vec<&str> = recs.iter().map(|r| r.title.as_str()).collect();
        assert!(titles.contains(&"Blood Pressure Management"), "{titles:?}");
        let unique: HashSet<&str> = titles.iter().copied().collect();
        assert_eq!(unique.len(), titles.len(), "duplicate titles: {titles:?}");
        assert_eq!(titles.iter().filter(|t| **t == "Quit Smoking").count(), 1);
    }

    #[test]
    fn test_cap_is_respected() {
        let record = encode(&high_risk());
        let factors = analyze(&record).risk_factors;
        for cap in 0..12 {
            for tier in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
                assert!(recommend(tier, &factors, &record, cap).len() <= cap);
            }
        }
    }

    #[test]
    fn test_low_tier_maintenance_and_preventive() {
        let record = encode(&healthy());
        let factors = analyze(&record).risk_factors;
        let recs = recommend(RiskTier::Low, &factors, &record, 8);

        assert_eq!(recs[0].title, "Maintain Current Health Status");
        assert_eq!(recs[0].priority, Priority::Maintenance);

        let preventive: Vec<_> = recs
            .iter()
            .filter(|r| r.priority == Priority::Preventive)
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(
            preventive,
            vec![
                "Monitor Your systolic blood pressure",
                "Monitor Your diastolic blood pressure",
                "Monitor Your BMI",
            ]
        );
    }

    #[test]
    fn test_no_preventive_outside_low_tier() {
        let record = encode(&healthy());
        let recs = recommend(RiskTier::Medium, &[], &record, 8);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.priority == Priority::Medium));
    }

    #[test]
    fn test_message_interpolates_value() {
        let record = encode(&PatientRecord::default().with(Feature::SysBp, 180.0));
        let factors = analyze(&record).risk_factors;
        let recs = recommend(RiskTier::High, &factors, &record, 8);
        let bp = recs
            .iter()
            .find(|r| r.title == "Blood Pressure Management")
            .expect("blood pressure recommendation");
        assert!(bp.message.contains("180 mmHg"));
        assert!(bp.message.contains("120 mmHg"));
        assert!(bp.advice.is_some());
    }

    #[test]
    fn test_unknown_feature_uses_generic_advice() {
        let record = encode(&PatientRecord::default().with(Feature::Age, 10.0));
        let factors = analyze(&record).risk_factors;
        assert_eq!(factors.len(), 1);
        let recs = recommend(RiskTier::Medium, &factors, &record, 8);
        let last = recs.last().expect("factor recommendation");
        assert_eq!(last.title, "Review Your age");
        assert_eq!(last.advice, Some(advice_for(Feature::Age)));
        assert!(last.message.contains("below the normal minimum"));
    }

    #[test]
    fn test_priority_serialization() {
        let json = serde_json::to_string(&Priority::Preventive).expect("serialize");
        assert_eq!(json, "\"preventive\"");
    }
}
