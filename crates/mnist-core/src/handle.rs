//! Model handle and serving-mode selection.

use std::fmt;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Image, ServingError};

/// Number of digit classes the served model distinguishes.
pub const NUM_CLASSES: usize = 10;

/// A loaded model that maps an image to a probability distribution.
pub trait Classifier: Send + Sync {
    /// Human-readable identifier used in logs.
    fn name(&self) -> &str;

    /// Returns one score per class, highest meaning most likely.
    fn predict_proba(&self, image: &Image) -> Result<Vec<f32>, ServingError>;
}

/// Outcome of resolving the model at startup.
///
/// Built once before the server accepts requests and never replaced.
#[derive(Clone)]
pub enum ModelHandle {
    /// A usable model.
    Loaded(Arc<dyn Classifier>),
    /// No model; requests are served in degraded mode. Holds the load failure.
    Unavailable(String),
}

impl ModelHandle {
    pub fn loaded(classifier: impl Classifier + 'static) -> Self {
        ModelHandle::Loaded(Arc::new(classifier))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ModelHandle::Unavailable(reason.into())
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelHandle::Loaded(_))
    }

    /// Why the model could not be loaded, if it wasn't.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            ModelHandle::Loaded(_) => None,
            ModelHandle::Unavailable(reason) => Some(reason),
        }
    }

    /// Classifies a freshly synthesized random sample.
    ///
    /// Stands in for caller-supplied input; see [`ModelHandle::classify`].
    pub fn predict<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Prediction, ServingError> {
        let image = Image::random(rng);
        self.classify(&image, rng)
    }

    /// Classifies `image`, or picks a uniform random class when no model is loaded.
    pub fn classify<R: Rng + ?Sized>(
        &self,
        image: &Image,
        rng: &mut R,
    ) -> Result<Prediction, ServingError> {
        let ModelHandle::Loaded(model) = self else {
            return Ok(Prediction::new(rng.gen_range(0..NUM_CLASSES)));
        };

        let scores = model.predict_proba(image)?;
        let class = argmax(&scores).ok_or(ServingError::EmptyDistribution)?;
        Ok(Prediction::new(class))
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelHandle::Loaded(model) => f.debug_tuple("Loaded").field(&model.name()).finish(),
            ModelHandle::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

/// Response payload for a single classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: usize,
}

impl Prediction {
    pub fn new(predicted_class: usize) -> Self {
        Self { predicted_class }
    }
}

/// Index of the largest score, lowest index on ties. NaN scores are skipped.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}
