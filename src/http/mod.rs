//! HTTP layer: axum router over a shared [`PredictionService`].

mod error;
mod handlers;

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::application::PredictionService;
use crate::config::{ConfigError, CorsOrigins};

pub use error::ApiError;
pub use handlers::{AnalysisResponse, BatchRequest, BatchResponse};

/// Shared handler state.
pub type AppState = Arc<PredictionService>;

/// Build the API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .route("/predict/batch", post(handlers::predict_batch))
        .route("/analyze", post(handlers::analyze))
        .route("/model/info", get(handlers::model_info))
        .route("/model/reload", post(handlers::reload_model))
        .with_state(state)
}

/// CORS policy for the configured origins.
///
/// # Errors
/// Returns `ConfigError` if an origin is not a valid header value.
pub fn cors_layer(origins: &CorsOrigins) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let values = list
                .iter()
                .map(|o| {
                    HeaderValue::from_str(o).map_err(|e| {
                        ConfigError::invalid("CARDIORISK_CORS_ORIGINS", o, e)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            layer.allow_origin(values)
        }
    })
}
