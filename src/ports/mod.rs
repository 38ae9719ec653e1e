//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the trained estimator).

mod risk_model;

pub use risk_model::{InferenceError, ModelMetadata, RiskModel};
