//! Core domain types and error definitions for MNIST serving.
//!
//! This crate provides the types shared by the registry client and the server:
//!
//! - [`Image`] — A 28×28 single-channel input sample
//! - [`Classifier`] — Anything that maps an [`Image`] to a class distribution
//! - [`ModelHandle`] — The startup resolution outcome, `Loaded` or `Unavailable`
//! - [`Prediction`] — The response payload keyed `predicted_class`
//! - [`ServingError`] — Error type for inference operations
//!
//! # Example
//!
//! ```rust
//! use mnist_core::ModelHandle;
//!
//! let handle = ModelHandle::unavailable("registry unreachable");
//! let prediction = handle.predict(&mut rand::thread_rng()).unwrap();
//! assert!(prediction.predicted_class < 10);
//! ```

mod handle;
mod image;

pub use handle::{argmax, Classifier, ModelHandle, Prediction, NUM_CLASSES};
pub use image::{Image, IMAGE_HEIGHT, IMAGE_PIXELS, IMAGE_WIDTH};

use thiserror::Error;

/// Errors that can occur while preparing input or running a model.
#[derive(Error, Debug)]
pub enum ServingError {
    /// Caller-supplied input does not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model call itself failed.
    #[error("Inference failed: {0}")]
    Inference(String),

    /// The model returned no class scores to choose from.
    #[error("Model returned an empty distribution")]
    EmptyDistribution,
}

impl From<serde_json::Error> for ServingError {
    fn from(err: serde_json::Error) -> Self {
        ServingError::InvalidInput(err.to_string())
    }
}
