//! Model acquisition for MNIST serving.
//!
//! The server calls [`resolve`] once at startup. Whatever happens while
//! fetching the model collapses into a [`ModelHandle`]: `Loaded` when the
//! artifact arrived and validated, `Unavailable` with the reason otherwise.

mod dense;
mod mlflow;
mod reference;

pub use dense::{Activation, DenseArtifact, DenseLayer, DenseNetwork};
pub use mlflow::MlflowRegistry;
pub use reference::{ModelReference, VersionSelector};

use std::sync::Arc;

use async_trait::async_trait;
use mnist_core::{Classifier, ModelHandle};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from fetching or decoding a model artifact.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Invalid model reference {0:?}, expected models:/<name>/<version|stage|latest>")]
    InvalidReference(String),

    #[error("Registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Registry returned {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),

    #[error("Failed to decode registry response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can turn a model reference into a callable classifier.
#[async_trait]
pub trait ModelSource: Send + Sync {
    async fn fetch(&self, reference: &ModelReference) -> Result<Arc<dyn Classifier>, RegistryError>;
}

/// Makes a single attempt to load `model_uri` from `source`.
///
/// Never fails: any error becomes [`ModelHandle::Unavailable`].
pub async fn resolve(source: &dyn ModelSource, model_uri: &str) -> ModelHandle {
    match try_resolve(source, model_uri).await {
        Ok(model) => {
            info!(model = model.name(), "Model loaded from {}", model_uri);
            ModelHandle::Loaded(model)
        }
        Err(e) => {
            warn!("Model unavailable, serving random predictions: {}", e);
            ModelHandle::unavailable(e.to_string())
        }
    }
}

async fn try_resolve(
    source: &dyn ModelSource,
    model_uri: &str,
) -> Result<Arc<dyn Classifier>, RegistryError> {
    let reference: ModelReference = model_uri.parse()?;
    source.fetch(&reference).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnist_core::{Image, ServingError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TwoClass;

    impl Classifier for TwoClass {
        fn name(&self) -> &str {
            "two-class"
        }

        fn predict_proba(&self, _image: &Image) -> Result<Vec<f32>, ServingError> {
            Ok(vec![0.0, 1.0])
        }
    }

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ModelSource for CountingSource {
        async fn fetch(&self, reference: &ModelReference) -> Result<Arc<dyn Classifier>, RegistryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RegistryError::NotFound(reference.to_string()));
            }
            Ok(Arc::new(TwoClass))
        }
    }

    #[tokio::test]
    async fn test_resolve_success_is_loaded() {
        let source = CountingSource::default();
        let handle = resolve(&source, "models:/mnist-model/latest").await;
        assert!(handle.is_loaded());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resolve_failure_is_single_attempt() {
        let source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let handle = resolve(&source, "models:/mnist-model/latest").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert!(handle
            .unavailable_reason()
            .is_some_and(|r| r.contains("models:/mnist-model/latest")));
    }

    #[tokio::test]
    async fn test_resolve_bad_reference_skips_fetch() {
        let source = CountingSource::default();
        let handle = resolve(&source, "s3://bucket/model").await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        assert!(handle
            .unavailable_reason()
            .is_some_and(|r| r.contains("Invalid model reference")));
    }
}
