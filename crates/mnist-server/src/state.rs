use mnist_config::Settings;
use mnist_core::ModelHandle;
use mnist_registry::{resolve, MlflowRegistry, ModelSource};
use tracing::{info, warn};

/// Shared, read-only state built before the listener accepts connections.
pub struct ServerState {
    pub service_name: String,
    pub model: ModelHandle,
}

impl ServerState {
    pub fn new(service_name: impl Into<String>, model: ModelHandle) -> Self {
        Self {
            service_name: service_name.into(),
            model,
        }
    }

    /// Resolves the model from the configured MLflow registry.
    pub async fn initialize(settings: &Settings) -> Self {
        report_data_sources(settings);

        let registry = MlflowRegistry::new(
            settings.tracking_endpoint(),
            &settings.mlflow.artifact_file,
            settings.fetch_timeout(),
        );

        match registry {
            Ok(registry) => Self::from_source(settings, &registry).await,
            Err(e) => {
                warn!("Registry client unavailable, serving random predictions: {}", e);
                Self::new(&settings.service.name, ModelHandle::unavailable(e.to_string()))
            }
        }
    }

    pub async fn from_source(settings: &Settings, source: &dyn ModelSource) -> Self {
        let model = resolve(source, settings.model_reference()).await;
        Self::new(&settings.service.name, model)
    }
}

fn report_data_sources(settings: &Settings) {
    let data = &settings.data;
    info!(
        raw = %data.raw_dir.display(),
        processed = %data.processed_dir.display(),
        "Dataset directories"
    );
    if let Some(minio) = &data.storage.minio {
        info!("Object storage: {} (bucket {})", minio.endpoint, minio.bucket);
    }
    if let Some(pg) = &data.database.postgres {
        info!("Database: {}@{}:{}/{}", pg.user, pg.host, pg.port, pg.dbname);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnist_core::Classifier;
    use mnist_registry::{ModelReference, RegistryError};
    use std::sync::Arc;

    struct Offline;

    #[async_trait]
    impl ModelSource for Offline {
        async fn fetch(&self, reference: &ModelReference) -> Result<Arc<dyn Classifier>, RegistryError> {
            Err(RegistryError::NotFound(reference.to_string()))
        }
    }

    fn settings() -> Settings {
        serde_json::json!({
            "service": { "name": "test-service" },
            "data": {},
            "mlflow": { "tracking_uri": "http://127.0.0.1:9" }
        })
        .to_string()
        .parse()
        .unwrap()
    }

    #[tokio::test]
    async fn test_from_source_failure_degrades() {
        let state = ServerState::from_source(&settings(), &Offline).await;
        assert_eq!(state.service_name, "test-service");
        assert!(!state.model.is_loaded());
        assert!(state
            .model
            .unavailable_reason()
            .is_some_and(|r| r.contains("models:/mnist-model/latest")));
    }
}
