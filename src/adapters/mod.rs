//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: JSON-exported logistic regression with a standard scaler
//! - `sanitize`: PII filtering for logs

pub mod logistic;
pub mod sanitize;

pub use logistic::{ArtifactError, LogisticModel};
