//! Serving-mode dispatch for prediction requests.

use mnist_core::{Image, Prediction};
use tracing::debug;

use crate::error::AppError;
use crate::ServerState;

/// Classifies a synthesized random sample.
///
/// The sample is a placeholder until callers send their own pixels; see
/// [`predict_image`].
pub fn predict_random(state: &ServerState) -> Result<Prediction, AppError> {
    let prediction = state.model.predict(&mut rand::thread_rng())?;
    log_prediction(state, prediction);
    Ok(prediction)
}

/// Classifies caller-supplied pixel rows.
pub fn predict_image(state: &ServerState, rows: Vec<Vec<f32>>) -> Result<Prediction, AppError> {
    let image = Image::from_rows(rows)?;
    let prediction = state.model.classify(&image, &mut rand::thread_rng())?;
    log_prediction(state, prediction);
    Ok(prediction)
}

fn log_prediction(state: &ServerState, prediction: Prediction) {
    debug!(
        predicted_class = prediction.predicted_class,
        degraded = !state.model.is_loaded(),
        "Prediction served"
    );
}
