//! Prediction HTTP handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use mnist_core::Prediction;
use tracing::error;

use crate::dto::ClassifyRequest;
use crate::error::AppError;
use crate::services::prediction as prediction_service;
use crate::ServerState;

/// GET /predict - Classifies a random sample, or returns a random class in degraded mode.
pub async fn predict(State(state): State<Arc<ServerState>>) -> Result<Json<Prediction>, AppError> {
    let prediction = prediction_service::predict_random(&state).map_err(|e| {
        error!("Prediction failed: {:?}", e);
        e
    })?;
    Ok(Json(prediction))
}

/// POST /predict - Classifies a caller-supplied 28×28 image.
pub async fn classify(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Prediction>, AppError> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let prediction = prediction_service::predict_image(&state, req.image).map_err(|e| {
        error!("Classification failed: {:?}", e);
        e
    })?;
    Ok(Json(prediction))
}
