//! Categorical and numeric field encoding.

use super::features::{Feature, NumericPolicy};
use super::patient::FieldValue;
use super::rules::{category_tokens, plausible_bounds};

/// Request validation failures. Always mapped to "invalid input".
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid value '{value}' for field '{field}'. Valid values: {accepted}")]
    UnrecognizedCategory {
        field: &'static str,
        value: String,
        accepted: String,
    },

    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Field '{field}' must be numeric, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("Field '{field}' value {value} is out of range [{min}, {max}]")]
    OutOfBounds {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid request body: {0}")]
    MalformedBody(String),

    #[error("Record {index}: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach a batch position to the error.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self::InBatch {
            index,
            source: Box::new(self),
        }
    }
}

fn accepted_values(tokens: &[(&str, u8)]) -> String {
    tokens
        .iter()
        .map(|(token, _)| *token)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Encode a categorical field to the numeric code the model expects.
///
/// Tokens match case-insensitively after trimming. Numeric `0`/`1` and JSON
/// booleans are accepted as already-encoded values.
///
/// # Errors
/// Returns `ValidationError::UnrecognizedCategory` naming the field and the
/// accepted token set.
pub fn encode_categorical(feature: Feature, value: &FieldValue) -> Result<u8, ValidationError> {
    let Some(tokens) = category_tokens(feature) else {
        return Err(ValidationError::UnrecognizedCategory {
            field: feature.name(),
            value: value.to_string(),
            accepted: String::new(),
        });
    };

    let code = match value {
        FieldValue::Text(text) => {
            let text = text.trim();
            tokens
                .iter()
                .find(|(token, _)| token.eq_ignore_ascii_case(text))
                .map(|(_, code)| *code)
        }
        FieldValue::Number(n) if *n == 0.0 => Some(0),
        FieldValue::Number(n) if *n == 1.0 => Some(1),
        FieldValue::Number(_) => None,
        FieldValue::Flag(b) => Some(u8::from(*b)),
    };

    code.ok_or_else(|| ValidationError::UnrecognizedCategory {
        field: feature.name(),
        value: value.to_string(),
        accepted: accepted_values(tokens),
    })
}

/// Parse a continuous field.
///
/// Unparsable values follow `policy`: rejected, or replaced with `0.0`.
/// Parsed values must be finite and inside the field's plausible bounds.
///
/// # Errors
/// Returns `ValidationError::NotNumeric` (under `Reject`) or
/// `ValidationError::OutOfBounds`.
pub fn parse_numeric(
    feature: Feature,
    value: &FieldValue,
    policy: NumericPolicy,
) -> Result<f64, ValidationError> {
    let parsed = match value {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        FieldValue::Flag(_) => None,
    }
    .filter(|n| n.is_finite());

    let number = match (parsed, policy) {
        (Some(n), _) => n,
        (None, NumericPolicy::Reject) => {
            return Err(ValidationError::NotNumeric {
                field: feature.name(),
                value: value.to_string(),
            })
        }
        (None, NumericPolicy::CoerceToZero) => {
            tracing::warn!(field = feature.name(), "non-numeric value coerced to 0");
            0.0
        }
    };

    let (min, max) = plausible_bounds(feature);
    if !(min..=max).contains(&number) {
        return Err(ValidationError::OutOfBounds {
            field: feature.name(),
            value: number,
            min,
            max,
        });
    }
    Ok(number)
}
