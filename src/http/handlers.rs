//! Request handlers.
//!
//! Handlers take the JSON extractor as a `Result` so malformed bodies come back
//! as a 400 in the same `{"error": ...}` shape as validation failures.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiError;
use super::AppState;
use crate::application::HealthReport;
use crate::domain::{NormalValue, PatientRecord, PredictionReport, RiskFactor};
use crate::ports::ModelMetadata;

type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub patients: Vec<PatientRecord>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub predictions: Vec<PredictionReport>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub risk_factors: Vec<RiskFactor>,
    pub normal_values: Vec<NormalValue>,
    pub total_risk_factors: usize,
    pub total_normal_values: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Coronary Heart Disease Risk Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/predict": "POST - Predict CHD risk for one patient",
            "/predict/batch": "POST - Predict CHD risk for several patients",
            "/analyze": "POST - Analyze risk factors without prediction",
            "/health": "GET - Service health",
            "/model/info": "GET - Loaded model metadata",
            "/model/reload": "POST - Reload model artifacts",
        }
    }))
}

pub async fn health(State(service): State<AppState>) -> Json<HealthReport> {
    Json(service.health())
}

pub async fn predict(
    State(service): State<AppState>,
    body: JsonBody<PatientRecord>,
) -> Result<Json<PredictionReport>, ApiError> {
    let Json(record) = body?;
    Ok(Json(service.predict(&record)?))
}

pub async fn predict_batch(
    State(service): State<AppState>,
    body: JsonBody<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let Json(batch) = body?;
    let predictions = service.predict_batch(&batch.patients)?;
    Ok(Json(BatchResponse {
        count: predictions.len(),
        predictions,
    }))
}

pub async fn analyze(
    State(service): State<AppState>,
    body: JsonBody<PatientRecord>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(record) = body?;
    let analysis = service.analyze(&record)?;
    Ok(Json(AnalysisResponse {
        total_risk_factors: analysis.total_risk_factors(),
        total_normal_values: analysis.total_normal_values(),
        risk_factors: analysis.risk_factors,
        normal_values: analysis.normal_values,
        timestamp: chrono::Utc::now(),
    }))
}

pub async fn model_info(State(service): State<AppState>) -> Result<Json<ModelMetadata>, ApiError> {
    Ok(Json(service.model_info()?))
}

pub async fn reload_model(State(service): State<AppState>) -> Result<Json<Value>, ApiError> {
    let metadata = service.reload()?;
    Ok(Json(json!({ "status": "reloaded", "model": metadata })))
}
