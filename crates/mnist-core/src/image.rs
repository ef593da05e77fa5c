//! Fixed-shape grayscale input sample.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ServingError;

pub const IMAGE_WIDTH: usize = 28;
pub const IMAGE_HEIGHT: usize = 28;
pub const IMAGE_PIXELS: usize = IMAGE_WIDTH * IMAGE_HEIGHT;

/// A 28×28 single-channel image stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f32>>", into = "Vec<Vec<f32>>")]
pub struct Image {
    pixels: Vec<f32>,
}

impl Image {
    /// Builds an image from rows of pixels, rejecting any other shape.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, ServingError> {
        if rows.len() != IMAGE_HEIGHT {
            return Err(ServingError::InvalidInput(format!(
                "expected {} rows, got {}",
                IMAGE_HEIGHT,
                rows.len()
            )));
        }

        let mut pixels = Vec::with_capacity(IMAGE_PIXELS);
        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != IMAGE_WIDTH {
                return Err(ServingError::InvalidInput(format!(
                    "row {} has {} pixels, expected {}",
                    idx,
                    row.len(),
                    IMAGE_WIDTH
                )));
            }
            if let Some(bad) = row.iter().find(|p| !p.is_finite()) {
                return Err(ServingError::InvalidInput(format!(
                    "row {} contains non-finite pixel {}",
                    idx, bad
                )));
            }
            pixels.extend(row);
        }

        Ok(Self { pixels })
    }

    /// Synthesizes a sample with every pixel uniform in `[0, 1)`.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let pixels = (0..IMAGE_PIXELS).map(|_| rng.gen::<f32>()).collect();
        Self { pixels }
    }

    /// Returns an image with every pixel set to `value`.
    pub fn filled(value: f32) -> Self {
        Self {
            pixels: vec![value; IMAGE_PIXELS],
        }
    }

    /// Flattened row-major view, length [`IMAGE_PIXELS`].
    pub fn as_slice(&self) -> &[f32] {
        &self.pixels
    }
}

impl TryFrom<Vec<Vec<f32>>> for Image {
    type Error = ServingError;

    fn try_from(rows: Vec<Vec<f32>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Image> for Vec<Vec<f32>> {
    fn from(image: Image) -> Self {
        image
            .pixels
            .chunks(IMAGE_WIDTH)
            .map(|row| row.to_vec())
            .collect()
    }
}
