//! Dense feed-forward network loaded from a JSON weight artifact.
//!
//! The artifact mirrors the trained Keras model: a flatten step followed by
//! dense layers. Each layer stores its kernel as `weights[input][unit]`
//! together with one bias per unit and an activation name.

use mnist_core::{Classifier, Image, ServingError, IMAGE_PIXELS, NUM_CLASSES};
use serde::{Deserialize, Serialize};

use crate::RegistryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Softmax,
}

impl Activation {
    fn apply(self, values: &mut [f32]) {
        match self {
            Activation::Linear => {}
            Activation::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Softmax => softmax(values),
        }
    }
}

fn softmax(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.len()
    }

    fn units(&self) -> usize {
        self.bias.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out = self.bias.clone();
        for (x, row) in input.iter().zip(&self.weights) {
            for (o, w) in out.iter_mut().zip(row) {
                *o += x * w;
            }
        }
        self.activation.apply(&mut out);
        out
    }
}

/// Serialized form of a trained network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseArtifact {
    pub layers: Vec<DenseLayer>,
}

/// A validated network ready for inference.
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    name: String,
    layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    /// Validates an artifact for 28×28 input and 10 output classes.
    pub fn from_artifact(name: impl Into<String>, artifact: DenseArtifact) -> Result<Self, RegistryError> {
        Self::build(name.into(), artifact, IMAGE_PIXELS, NUM_CLASSES)
    }

    pub fn from_slice(name: impl Into<String>, bytes: &[u8]) -> Result<Self, RegistryError> {
        let artifact: DenseArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(name, artifact)
    }

    fn build(
        name: String,
        artifact: DenseArtifact,
        inputs: usize,
        outputs: usize,
    ) -> Result<Self, RegistryError> {
        let layers = artifact.layers;
        if layers.is_empty() {
            return Err(RegistryError::Artifact("artifact has no layers".into()));
        }

        let mut expected_inputs = inputs;
        for (idx, layer) in layers.iter().enumerate() {
            if layer.inputs() != expected_inputs {
                return Err(RegistryError::Artifact(format!(
                    "layer {} takes {} inputs, expected {}",
                    idx,
                    layer.inputs(),
                    expected_inputs
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != layer.units()) {
                return Err(RegistryError::Artifact(format!(
                    "layer {} has a weight row of {} units but {} biases",
                    idx,
                    row.len(),
                    layer.units()
                )));
            }
            expected_inputs = layer.units();
        }

        if expected_inputs != outputs {
            return Err(RegistryError::Artifact(format!(
                "network produces {} outputs, expected {}",
                expected_inputs, outputs
            )));
        }

        Ok(Self { name, layers })
    }

    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        self.layers
            .iter()
            .fold(input.to_vec(), |acc, layer| layer.forward(&acc))
    }
}

impl Classifier for DenseNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, image: &Image) -> Result<Vec<f32>, ServingError> {
        let scores = self.forward(image.as_slice());
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ServingError::Inference(format!(
                "{} produced non-finite scores",
                self.name
            )));
        }
        Ok(scores)
    }
}
