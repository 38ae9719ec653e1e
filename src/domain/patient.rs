//! Patient record types for CHD risk prediction.
//!
//! Based on the Framingham-style cardiovascular risk data set (15 features).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::encoding::{encode_categorical, parse_numeric, ValidationError};
use super::features::{Feature, FeatureVector, NumericPolicy, FEATURE_COUNT};

/// A raw field value as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Flag(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Patient health metrics as received over the wire.
///
/// Every field is optional at this layer: `/analyze` works on subsets, while
/// the feature vector builder enforces completeness for `/predict`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years
    pub age: Option<FieldValue>,

    /// Education level (1-4)
    pub education: Option<FieldValue>,

    /// M / F
    pub sex: Option<FieldValue>,

    /// YES / NO
    pub is_smoking: Option<FieldValue>,

    #[serde(rename = "cigsPerDay")]
    pub cigs_per_day: Option<FieldValue>,

    /// On blood pressure medication: YES / NO
    #[serde(rename = "BPMeds")]
    pub bp_meds: Option<FieldValue>,

    #[serde(rename = "prevalentStroke")]
    pub prevalent_stroke: Option<FieldValue>,

    #[serde(rename = "prevalentHyp")]
    pub prevalent_hyp: Option<FieldValue>,

    pub diabetes: Option<FieldValue>,

    /// Total cholesterol in mg/dL
    #[serde(rename = "totChol")]
    pub tot_chol: Option<FieldValue>,

    /// Systolic blood pressure in mmHg
    #[serde(rename = "sysBP")]
    pub sys_bp: Option<FieldValue>,

    /// Diastolic blood pressure in mmHg
    #[serde(rename = "diaBP")]
    pub dia_bp: Option<FieldValue>,

    #[serde(rename = "BMI")]
    pub bmi: Option<FieldValue>,

    /// Resting heart rate in bpm
    #[serde(rename = "heartRate")]
    pub heart_rate: Option<FieldValue>,

    /// Fasting glucose in mg/dL
    pub glucose: Option<FieldValue>,
}

impl PatientRecord {
    /// Raw value of one field.
    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<&FieldValue> {
        match feature {
            Feature::Age => self.age.as_ref(),
            Feature::Education => self.education.as_ref(),
            Feature::Sex => self.sex.as_ref(),
            Feature::IsSmoking => self.is_smoking.as_ref(),
            Feature::CigsPerDay => self.cigs_per_day.as_ref(),
            Feature::BpMeds => self.bp_meds.as_ref(),
            Feature::PrevalentStroke => self.prevalent_stroke.as_ref(),
            Feature::PrevalentHyp => self.prevalent_hyp.as_ref(),
            Feature::Diabetes => self.diabetes.as_ref(),
            Feature::TotChol => self.tot_chol.as_ref(),
            Feature::SysBp => self.sys_bp.as_ref(),
            Feature::DiaBp => self.dia_bp.as_ref(),
            Feature::Bmi => self.bmi.as_ref(),
            Feature::HeartRate => self.heart_rate.as_ref(),
            Feature::Glucose => self.glucose.as_ref(),
        }
    }

    /// Set one field.
    pub fn set(&mut self, feature: Feature, value: impl Into<FieldValue>) {
        let slot = match feature {
            Feature::Age => &mut self.age,
            Feature::Education => &mut self.education,
            Feature::Sex => &mut self.sex,
            Feature::IsSmoking => &mut self.is_smoking,
            Feature::CigsPerDay => &mut self.cigs_per_day,
            Feature::BpMeds => &mut self.bp_meds,
            Feature::PrevalentStroke => &mut self.prevalent_stroke,
            Feature::PrevalentHyp => &mut self.prevalent_hyp,
            Feature::Diabetes => &mut self.diabetes,
            Feature::TotChol => &mut self.tot_chol,
            Feature::SysBp => &mut self.sys_bp,
            Feature::DiaBp => &mut self.dia_bp,
            Feature::Bmi => &mut self.bmi,
            Feature::HeartRate => &mut self.heart_rate,
            Feature::Glucose => &mut self.glucose,
        };
        *slot = Some(value.into());
    }

    /// Builder-style [`PatientRecord::set`].
    #[must_use]
    pub fn with(mut self, feature: Feature, value: impl Into<FieldValue>) -> Self {
        self.set(feature, value);
        self
    }

    /// Validate and encode every present field.
    ///
    /// Absent fields stay absent.
    ///
    /// # Errors
    /// Returns the first validation error in feature order.
    pub fn encode(&self, policy: NumericPolicy) -> Result<EncodedRecord, ValidationError> {
        let mut values = [None; FEATURE_COUNT];
        for feature in Feature::ALL {
            let Some(raw) = self.get(feature) else {
                continue;
            };
            let value = if feature.is_categorical() {
                f64::from(encode_categorical(feature, raw)?)
            } else {
                parse_numeric(feature, raw, policy)?
            };
            values[feature.index()] = Some(value);
        }
        Ok(EncodedRecord { values })
    }

    /// Submitted values keyed by feature name, for echoing back to clients.
    #[must_use]
    pub fn actual_values(&self) -> BTreeMap<&'static str, FieldValue> {
        Feature::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f.name(), v.clone())))
            .collect()
    }
}

/// A record whose present fields are all numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EncodedRecord {
    values: [Option<f64>; FEATURE_COUNT],
}

impl EncodedRecord {
    #[must_use]
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.index()]
    }

    /// Present features with their values, in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .into_iter()
            .filter_map(|f| self.get(f).map(|v| (f, v)))
    }

    /// Assemble the model input vector in trained column order.
    ///
    /// Missing fields follow `policy`.
    ///
    /// # Errors
    /// Returns `ValidationError::MissingField` for the first absent field under
    /// `NumericPolicy::Reject`.
    pub fn to_feature_vector(&self, policy: NumericPolicy) -> Result<FeatureVector, ValidationError> {
        let mut out = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            out[feature.index()] = match (self.get(feature), policy) {
                (Some(v), _) => v,
                (None, NumericPolicy::Reject) => {
                    return Err(ValidationError::MissingField {
                        field: feature.name(),
                    })
                }
                (None, NumericPolicy::CoerceToZero) => {
                    tracing::warn!(field = feature.name(), "missing value coerced to 0");
                    0.0
                }
            };
        }
        Ok(FeatureVector::new(out))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// The high-risk reference patient.
    pub fn high_risk() -> PatientRecord {
        PatientRecord::default()
            .with(Feature::Age, 65.0)
            .with(Feature::Education, 1.0)
            .with(Feature::Sex, "M")
            .with(Feature::IsSmoking, "YES")
            .with(Feature::CigsPerDay, 30.0)
            .with(Feature::BpMeds, "YES")
            .with(Feature::PrevalentStroke, "YES")
            .with(Feature::PrevalentHyp, "YES")
            .with(Feature::Diabetes, "YES")
            .with(Feature::TotChol, 280.0)
            .with(Feature::SysBp, 180.0)
            .with(Feature::DiaBp, 110.0)
            .with(Feature::Bmi, 32.0)
            .with(Feature::HeartRate, 88.0)
            .with(Feature::Glucose, 130.0)
    }

    /// The healthy reference patient.
    pub fn healthy() -> PatientRecord {
        PatientRecord::default()
            .with(Feature::Age, 35.0)
            .with(Feature::Education, 4.0)
            .with(Feature::Sex, "F")
            .with(Feature::IsSmoking, "NO")
            .with(Feature::CigsPerDay, 0.0)
            .with(Feature::BpMeds, "NO")
            .with(Feature::PrevalentStroke, "NO")
            .with(Feature::PrevalentHyp, "NO")
            .with(Feature::Diabetes, "NO")
            .with(Feature::TotChol, 170.0)
            .with(Feature::SysBp, 110.0)
            .with(Feature::DiaBp, 70.0)
            .with(Feature::Bmi, 22.0)
            .with(Feature::HeartRate, 65.0)
            .with(Feature::Glucose, 80.0)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{healthy, high_risk};
    use super::*;

    #[test]
    fn test_deserialize_wire_names() {
        let json = r#"{
            "age": 65, "education": 1, "sex": "M", "is_smoking": "YES",
            "cigsPerDay": 30, "BPMeds": "NO", "prevalentStroke": "NO",
            "prevalentHyp": "YES", "diabetes": "NO", "totChol": "280",
            "sysBP": 180, "diaBP": 110, "BMI": 32.5, "heartRate": 88, "glucose": 130
        }"#;
        let record: PatientRecord = serde_json::from_str(json).expect("Should parse");
        assert_eq!(record.sys_bp, Some(FieldValue::Number(180.0)));
        assert_eq!(record.tot_chol, Some(FieldValue::Text("280".into())));
        assert_eq!(record.sex, Some(FieldValue::Text("M".into())));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let record: PatientRecord = serde_json::from_str(r#"{"sysBP": 200}"#).expect("Should parse");
        assert!(record.age.is_none());
        assert_eq!(record.get(Feature::SysBp), Some(&FieldValue::Number(200.0)));
    }

    #[test]
    fn test_encode_full_record() {
        let encoded = high_risk().encode(NumericPolicy::Reject).expect("Should encode");
        assert_eq!(encoded.get(Feature::Sex), Some(1.0));
        assert_eq!(encoded.get(Feature::IsSmoking), Some(1.0));
        assert_eq!(encoded.get(Feature::SysBp), Some(180.0));
        assert_eq!(encoded.iter().count(), FEATURE_COUNT);
    }

    #[test]
    fn test_feature_vector_order() {
        let vector = high_risk()
            .encode(NumericPolicy::Reject)
            .and_then(|e| e.to_feature_vector(NumericPolicy::Reject))
            .expect("Should build vector");
        assert_eq!(
            vector.to_vec(),
            vec![65.0, 1.0, 1.0, 1.0, 30.0, 1.0, 1.0, 1.0, 1.0, 280.0, 180.0, 110.0, 32.0, 88.0, 130.0]
        );
    }

    #[test]
    fn test_missing_field_rejected() {
        let mut record = healthy();
        record.glucose = None;
        let encoded = record.encode(NumericPolicy::Reject).expect("Should encode subset");
        let err = encoded.to_feature_vector(NumericPolicy::Reject).unwrap_err();
        assert_eq!(err, ValidationError::MissingField { field: "glucose" });
    }

    #[test]
    fn test_missing_field_coerced() {
        let mut record = healthy();
        record.glucose = None;
        let vector = record
            .encode(NumericPolicy::CoerceToZero)
            .and_then(|e| e.to_feature_vector(NumericPolicy::CoerceToZero))
            .expect("Should coerce");
        assert!((vector.get(Feature::Glucose)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_category_fails_encoding() {
        let record = healthy().with(Feature::Sex, "X");
        let err = record.encode(NumericPolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("'sex'"));
    }

    #[test]
    fn test_actual_values_keep_tokens() {
        let values = high_risk().actual_values();
        assert_eq!(values.get("sex"), Some(&FieldValue::Text("M".into())));
        assert_eq!(values.get("sysBP"), Some(&FieldValue::Number(180.0)));
        assert_eq!(values.len(), FEATURE_COUNT);
    }
}
