//! Feature schema shared by the encoder, the analyzer and the model boundary.
//!
//! The order of [`Feature::ALL`] is the column order the classifier was trained
//! with. Every numeric vector handed to a model uses this order.

use serde::{Deserialize, Serialize};

/// Number of model input features.
pub const FEATURE_COUNT: usize = 15;

/// A named model input feature.
///
/// Serialized with the wire names used by the training data set
/// (`cigsPerDay`, `sysBP`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "education")]
    Education,
    #[serde(rename = "sex")]
    Sex,
    #[serde(rename = "is_smoking")]
    IsSmoking,
    #[serde(rename = "cigsPerDay")]
    CigsPerDay,
    #[serde(rename = "BPMeds")]
    BpMeds,
    #[serde(rename = "prevalentStroke")]
    PrevalentStroke,
    #[serde(rename = "prevalentHyp")]
    PrevalentHyp,
    #[serde(rename = "diabetes")]
    Diabetes,
    #[serde(rename = "totChol")]
    TotChol,
    #[serde(rename = "sysBP")]
    SysBp,
    #[serde(rename = "diaBP")]
    DiaBp,
    #[serde(rename = "BMI")]
    Bmi,
    #[serde(rename = "heartRate")]
    HeartRate,
    #[serde(rename = "glucose")]
    Glucose,
}

impl Feature {
    /// All features in trained column order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::Education,
        Feature::Sex,
        Feature::IsSmoking,
        Feature::CigsPerDay,
        Feature::BpMeds,
        Feature::PrevalentStroke,
        Feature::PrevalentHyp,
        Feature::Diabetes,
        Feature::TotChol,
        Feature::SysBp,
        Feature::DiaBp,
        Feature::Bmi,
        Feature::HeartRate,
        Feature::Glucose,
    ];

    /// Column index in the trained feature order.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire / column name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Education => "education",
            Self::Sex => "sex",
            Self::IsSmoking => "is_smoking",
            Self::CigsPerDay => "cigsPerDay",
            Self::BpMeds => "BPMeds",
            Self::PrevalentStroke => "prevalentStroke",
            Self::PrevalentHyp => "prevalentHyp",
            Self::Diabetes => "diabetes",
            Self::TotChol => "totChol",
            Self::SysBp => "sysBP",
            Self::DiaBp => "diaBP",
            Self::Bmi => "BMI",
            Self::HeartRate => "heartRate",
            Self::Glucose => "glucose",
        }
    }

    /// Human-readable label used in recommendation text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::Education => "education level",
            Self::Sex => "sex",
            Self::IsSmoking => "smoking status",
            Self::CigsPerDay => "cigarettes per day",
            Self::BpMeds => "blood pressure medication",
            Self::PrevalentStroke => "stroke history",
            Self::PrevalentHyp => "hypertension",
            Self::Diabetes => "diabetes",
            Self::TotChol => "total cholesterol",
            Self::SysBp => "systolic blood pressure",
            Self::DiaBp => "diastolic blood pressure",
            Self::Bmi => "BMI",
            Self::HeartRate => "resting heart rate",
            Self::Glucose => "blood glucose",
        }
    }

    /// Look a feature up by its wire name (exact match).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Whether the feature arrives as a categorical token rather than a number.
    #[must_use]
    pub fn is_categorical(self) -> bool {
        matches!(
            self,
            Self::Sex
                | Self::IsSmoking
                | Self::BpMeds
                | Self::PrevalentStroke
                | Self::PrevalentHyp
                | Self::Diabetes
        )
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Policy for continuous fields that are missing or cannot be parsed as numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Fail the request with an invalid-input error naming the field.
    #[default]
    Reject,
    /// Substitute `0.0` and log a warning.
    CoerceToZero,
}

impl std::str::FromStr for NumericPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "zero" | "coerce" | "coerce_to_zero" => Ok(Self::CoerceToZero),
            other => Err(format!("unknown numeric policy '{other}' (expected reject|zero)")),
        }
    }
}

/// Fully encoded model input in trained column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap an already ordered array.
    #[must_use]
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Value of a single feature.
    #[must_use]
    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Convert features to a vector for ML inference.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

/// Column names in trained order, as expected in `feature_columns.json`.
#[must_use]
pub fn feature_names() -> Vec<&'static str> {
    Feature::ALL.iter().map(|f| f.name()).collect()
}
