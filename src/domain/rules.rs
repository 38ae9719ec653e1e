//! Clinical rule table.
//!
//! This is the single authoritative home for every hand-authored heuristic the
//! service applies: reference ranges, categorical token codes, risk tier
//! defaults, the recommendation cap and the advice catalog. Nothing else in the
//! crate hard-codes a clinical constant.

use serde::Serialize;

use super::diagnosis::{RiskThresholds, RiskTier};
use super::features::{Feature, NumericPolicy};
use super::recommendation::Priority;

/// Default lower bound (inclusive) of the Medium tier.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 0.2;

/// Default lower bound (inclusive) of the High tier.
pub const DEFAULT_HIGH_THRESHOLD: f64 = 0.4;

/// Default maximum number of recommendations per response.
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 8;

/// Fraction of a normal maximum above which a Low-tier value gets a preventive note.
pub const PREVENTIVE_FRACTION: f64 = 0.85;

/// Boolean conditions that are always a risk factor when present.
pub const RISK_CONDITIONS: [Feature; 4] = [
    Feature::IsSmoking,
    Feature::PrevalentStroke,
    Feature::PrevalentHyp,
    Feature::Diabetes,
];

/// Clinically normal interval for a continuous metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceRange {
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl ReferenceRange {
    const fn new(min: f64, max: f64, unit: &'static str) -> Self {
        Self { min, max, unit }
    }

    /// Whether `value` lies inside `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Whether an in-range value sits in the top band of the interval.
    #[must_use]
    pub fn is_near_max(&self, value: f64) -> bool {
        value > self.max * PREVENTIVE_FRACTION && value <= self.max
    }
}

/// Reference range for a continuous feature, if it has one.
#[must_use]
pub fn reference_range(feature: Feature) -> Option<ReferenceRange> {
    let range = match feature {
        Feature::Age => ReferenceRange::new(20.0, 120.0, "years"),
        Feature::CigsPerDay => ReferenceRange::new(0.0, 0.0, "cigarettes/day"),
        Feature::TotChol => ReferenceRange::new(125.0, 200.0, "mg/dL"),
        Feature::SysBp => ReferenceRange::new(90.0, 120.0, "mmHg"),
        Feature::DiaBp => ReferenceRange::new(60.0, 80.0, "mmHg"),
        Feature::Bmi => ReferenceRange::new(18.5, 24.9, "kg/m²"),
        Feature::HeartRate => ReferenceRange::new(60.0, 100.0, "bpm"),
        Feature::Glucose => ReferenceRange::new(70.0, 100.0, "mg/dL"),
        _ => return None,
    };
    Some(range)
}

/// Accepted input bounds for continuous fields (request validation, not clinical).
#[must_use]
pub fn plausible_bounds(feature: Feature) -> (f64, f64) {
    match feature {
        Feature::Age => (0.0, 120.0),
        _ => (0.0, f64::MAX),
    }
}

const SEX_TOKENS: &[(&str, u8)] = &[("M", 1), ("Male", 1), ("F", 0), ("Female", 0)];

const YES_NO_TOKENS: &[(&str, u8)] = &[
    ("YES", 1),
    ("Y", 1),
    ("TRUE", 1),
    ("1", 1),
    ("NO", 0),
    ("N", 0),
    ("FALSE", 0),
    ("0", 0),
];

/// Token table for a categorical feature. Matching is case-insensitive.
#[must_use]
pub fn category_tokens(feature: Feature) -> Option<&'static [(&'static str, u8)]> {
    match feature {
        Feature::Sex => Some(SEX_TOKENS),
        Feature::IsSmoking
        | Feature::BpMeds
        | Feature::PrevalentStroke
        | Feature::PrevalentHyp
        | Feature::Diabetes => Some(YES_NO_TOKENS),
        _ => None,
    }
}

/// Diet / lifestyle / monitoring advice for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advice {
    pub diet: &'static str,
    pub lifestyle: &'static str,
    pub monitoring: &'static str,
}

const GENERIC_ADVICE: Advice = Advice {
    diet: "Maintain balanced nutrition",
    lifestyle: "Stay physically active",
    monitoring: "Regular health checkups",
};

/// Advice for a feature, falling back to generic advice.
#[must_use]
pub fn advice_for(feature: Feature) -> Advice {
    match feature {
        Feature::TotChol => Advice {
            diet: "Focus on soluble fiber (oats, beans, fruits), omega-3 fatty acids (fish, nuts), and limit saturated fats",
            lifestyle: "Regular aerobic exercise can help lower cholesterol naturally",
            monitoring: "Check cholesterol levels annually or as recommended by your doctor",
        },
        Feature::SysBp => Advice {
            diet: "Reduce sodium intake to less than 2,300mg daily, increase potassium-rich foods (bananas, spinach)",
            lifestyle: "Regular exercise, stress management, and maintaining healthy weight",
            monitoring: "Monitor blood pressure monthly at home and during doctor visits",
        },
        Feature::DiaBp => Advice {
            diet: "DASH diet (Dietary Approaches to Stop Hypertension) with low sodium",
            lifestyle: "Aerobic exercise, meditation, and adequate sleep",
            monitoring: "Track diastolic pressure trends over time",
        },
        Feature::Bmi => Advice {
            diet: "Balanced diet with portion control and mindful eating",
            lifestyle: "150+ minutes of moderate exercise weekly, strength training 2x/week",
            monitoring: "Weigh yourself weekly and track trends",
        },
        Feature::HeartRate => Advice {
            diet: "Limit caffeine and stimulants that can increase heart rate",
            lifestyle: "Regular cardiovascular exercise to strengthen heart muscle",
            monitoring: "Monitor resting heart rate trends, especially during stress",
        },
        Feature::Glucose => Advice {
            diet: "Low glycemic index foods, complex carbohydrates, regular meal timing",
            lifestyle: "Regular exercise improves insulin sensitivity",
            monitoring: "Annual glucose testing, more frequent if family history of diabetes",
        },
        Feature::IsSmoking | Feature::CigsPerDay => Advice {
            diet: "Plan healthy snacks to manage cravings and avoid weight gain while quitting",
            lifestyle: "Join a smoking cessation program; nicotine replacement can double quit rates",
            monitoring: "Discuss lung and cardiovascular screening with your doctor",
        },
        Feature::PrevalentHyp => Advice {
            diet: "Follow a low-sodium DASH-style diet",
            lifestyle: "Take prescribed blood pressure medication consistently",
            monitoring: "Keep a home blood pressure log and share it at each visit",
        },
        Feature::Diabetes => Advice {
            diet: "Consistent carbohydrate intake with an emphasis on whole foods",
            lifestyle: "Daily activity and adherence to your diabetes care plan",
            monitoring: "Check HbA1c every 3-6 months and glucose as advised",
        },
        Feature::PrevalentStroke => Advice {
            diet: "Heart-healthy, low-sodium diet rich in vegetables and whole grains",
            lifestyle: "Follow your secondary prevention plan, including any antiplatelet therapy",
            monitoring: "Keep regular neurology and cardiology follow-up appointments",
        },
        _ => GENERIC_ADVICE,
    }
}

/// Title and priority used when a feature is flagged as a risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorGuidance {
    pub title: &'static str,
    pub priority: Priority,
}

/// Guidance for a flagged feature, if the catalog has a specific entry.
#[must_use]
pub fn factor_guidance(feature: Feature) -> Option<FactorGuidance> {
    let (title, priority) = match feature {
        Feature::IsSmoking | Feature::CigsPerDay => ("Quit Smoking", Priority::High),
        Feature::Bmi => ("Weight Management", Priority::Medium),
        Feature::SysBp | Feature::DiaBp => ("Blood Pressure Management", Priority::High),
        Feature::TotChol => ("Cholesterol Management", Priority::Medium),
        Feature::Glucose => ("Blood Sugar Management", Priority::Medium),
        Feature::HeartRate => ("Heart Rate Review", Priority::Medium),
        Feature::PrevalentHyp => ("Hypertension Care", Priority::High),
        Feature::Diabetes => ("Diabetes Management", Priority::High),
        Feature::PrevalentStroke => ("Stroke Secondary Prevention", Priority::High),
        _ => return None,
    };
    Some(FactorGuidance { title, priority })
}

/// One fixed tier-level message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierMessage {
    pub title: &'static str,
    pub message: &'static str,
    pub priority: Priority,
}

const HIGH_TIER_MESSAGES: &[TierMessage] = &[
    TierMessage {
        title: "Immediate Medical Consultation",
        message: "Please consult with a healthcare provider immediately for comprehensive cardiovascular assessment.",
        priority: Priority::Urgent,
    },
    TierMessage {
        title: "Lifestyle Changes",
        message: "Focus on diet, exercise, and stress management under medical supervision.",
        priority: Priority::High,
    },
];

const MEDIUM_TIER_MESSAGES: &[TierMessage] = &[
    TierMessage {
        title: "Schedule Medical Consultation",
        message: "Schedule an appointment with your healthcare provider within the next month for cardiovascular assessment.",
        priority: Priority::Medium,
    },
    TierMessage {
        title: "Lifestyle Modifications",
        message: "Begin implementing heart-healthy diet changes and regular exercise routine.",
        priority: Priority::Medium,
    },
    TierMessage {
        title: "Monitor Health Metrics",
        message: "Regularly monitor your blood pressure, cholesterol, and other key health indicators.",
        priority: Priority::Medium,
    },
];

const LOW_TIER_MESSAGES: &[TierMessage] = &[TierMessage {
    title: "Maintain Current Health Status",
    message: "Congratulations! Your current health profile shows low risk for heart disease. Continue maintaining your healthy lifestyle.",
    priority: Priority::Maintenance,
}];

/// Boilerplate messages prepended for a tier.
#[must_use]
pub fn tier_messages(tier: RiskTier) -> &'static [TierMessage] {
    match tier {
        RiskTier::High => HIGH_TIER_MESSAGES,
        RiskTier::Medium => MEDIUM_TIER_MESSAGES,
        RiskTier::Low => LOW_TIER_MESSAGES,
    }
}

/// Tunable part of the rule table.
///
/// Everything else in this module is fixed; these three values may be
/// overridden through configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    pub thresholds: RiskThresholds,
    pub max_recommendations: usize,
    pub numeric_policy: NumericPolicy,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            numeric_policy: NumericPolicy::default(),
        }
    }
}
