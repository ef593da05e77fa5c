//! MLflow tracking server client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnist_core::Classifier;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dense::DenseNetwork;
use crate::reference::{ModelReference, VersionSelector};
use crate::{ModelSource, RegistryError};

#[derive(Debug, Clone, Deserialize)]
struct ModelVersion {
    name: String,
    version: String,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    source: String,
}

impl ModelVersion {
    fn number(&self) -> u64 {
        self.version.parse().unwrap_or(0)
    }
}

#[derive(Deserialize)]
struct LatestVersionsResponse {
    #[serde(default)]
    model_versions: Vec<ModelVersion>,
}

#[derive(Deserialize)]
struct GetVersionResponse {
    model_version: ModelVersion,
}

#[derive(Serialize)]
struct LatestVersionsRequest<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stages: Vec<&'a str>,
}

/// Client for a registry served by an MLflow tracking server.
pub struct MlflowRegistry {
    client: Client,
    tracking_uri: String,
    artifact_file: String,
}

impl MlflowRegistry {
    /// Creates a client whose every request is bounded by `timeout`.
    pub fn new(tracking_uri: &str, artifact_file: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            tracking_uri: tracking_uri.trim_end_matches('/').to_string(),
            artifact_file: artifact_file.trim_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.tracking_uri, path)
    }

    async fn model_version(&self, reference: &ModelReference) -> Result<ModelVersion, RegistryError> {
        let stages = match &reference.selector {
            VersionSelector::Version(v) => return self.exact_version(&reference.name, *v).await,
            VersionSelector::Latest => vec![],
            VersionSelector::Stage(stage) => vec![stage.as_str()],
        };

        let request = LatestVersionsRequest {
            name: &reference.name,
            stages,
        };
        let response = self
            .client
            .post(self.url("/api/2.0/mlflow/registered-models/get-latest-versions"))
            .json(&request)
            .send()
            .await?;
        let body: LatestVersionsResponse = read_json(response).await?;

        body.model_versions
            .into_iter()
            .max_by_key(ModelVersion::number)
            .ok_or_else(|| RegistryError::NotFound(reference.to_string()))
    }

    async fn exact_version(&self, name: &str, version: u64) -> Result<ModelVersion, RegistryError> {
        let version = version.to_string();
        let response = self
            .client
            .get(self.url("/api/2.0/mlflow/model-versions/get"))
            .query(&[("name", name), ("version", version.as_str())])
            .send()
            .await?;
        let body: GetVersionResponse = read_json(response).await?;
        Ok(body.model_version)
    }

    async fn download(&self, version: &ModelVersion) -> Result<Vec<u8>, RegistryError> {
        let dir = artifact_dir(&version.source).ok_or_else(|| {
            RegistryError::Artifact(format!(
                "cannot locate artifacts for source {:?}",
                version.source
            ))
        })?;
        if version.run_id.is_empty() {
            return Err(RegistryError::Artifact(format!(
                "{} version {} has no run id",
                version.name, version.version
            )));
        }

        let path = format!("{}/{}", dir, self.artifact_file);
        debug!(run_id = %version.run_id, path = %path, "Downloading model artifact");

        let response = self
            .client
            .get(self.url("/get-artifact"))
            .query(&[("path", path.as_str()), ("run_uuid", version.run_id.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ModelSource for MlflowRegistry {
    async fn fetch(&self, reference: &ModelReference) -> Result<Arc<dyn Classifier>, RegistryError> {
        let version = self.model_version(reference).await?;
        info!(
            "Resolved {} to version {} (run {})",
            reference, version.version, version.run_id
        );

        let bytes = self.download(&version).await?;
        let name = format!("{}/{}", version.name, version.version);
        let network = DenseNetwork::from_slice(name, &bytes)?;
        Ok(Arc::new(network))
    }
}

/// Directory of the model inside its run's artifact root.
fn artifact_dir(source: &str) -> Option<&str> {
    let dir = match source.strip_prefix("runs:/") {
        Some(rest) => rest.split_once('/').map(|(_, path)| path)?,
        None => source.split_once("/artifacts/").map(|(_, path)| path)?,
    };
    let dir = dir.trim_matches('/');
    (!dir.is_empty()).then_some(dir)
}

async fn check_status(response: Response) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(RegistryError::Status {
        url,
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RegistryError> {
    let response = check_status(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
