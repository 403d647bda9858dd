use crate::error::{ModelError, Result};

/// Features stored per touch sample: x, y, vx, vy, ax, ay.
pub const FEATURES_PER_SAMPLE: usize = 6;

/// One touch sample of a swipe gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    /// Token id of the keyboard key under (or nearest to) the sample.
    pub key_token: u32,
    /// Coordinates normalized to the keyboard surface.
    pub x: f32,
    pub y: f32,
    pub velocity: [f32; 2],
    pub acceleration: [f32; 2],
}

impl TouchSample {
    pub fn at(key_token: u32, x: f32, y: f32) -> Self {
        Self {
            key_token,
            x,
            y,
            velocity: [0.0; 2],
            acceleration: [0.0; 2],
        }
    }

    fn features(&self) -> [f32; FEATURES_PER_SAMPLE] {
        [
            self.x,
            self.y,
            self.velocity[0],
            self.velocity[1],
            self.acceleration[0],
            self.acceleration[1],
        ]
    }
}

/// An immutable swipe gesture in batch-major layout.
///
/// `features` is a row-major `[len, FEATURES_PER_SAMPLE]` matrix; `mask`
/// marks real samples (`true`) versus padding (`false`).
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    features: Vec<f32>,
    key_tokens: Vec<u32>,
    mask: Vec<bool>,
}

impl Trajectory {
    /// Build a trajectory from raw columns, validating that they agree.
    pub fn new(features: Vec<f32>, key_tokens: Vec<u32>, mask: Vec<bool>) -> Result<Self> {
        if key_tokens.len() != mask.len() {
            return Err(ModelError::InvalidTrajectory(format!(
                "{} key tokens but {} mask entries",
                key_tokens.len(),
                mask.len()
            )));
        }
        if features.len() != key_tokens.len() * FEATURES_PER_SAMPLE {
            return Err(ModelError::InvalidTrajectory(format!(
                "{} feature values for {} samples",
                features.len(),
                key_tokens.len()
            )));
        }
        Ok(Self {
            features,
            key_tokens,
            mask,
        })
    }

    pub fn from_samples(samples: &[TouchSample]) -> Self {
        Self {
            features: samples.iter().flat_map(|s| s.features()).collect(),
            key_tokens: samples.iter().map(|s| s.key_token).collect(),
            mask: vec![true; samples.len()],
        }
    }

    pub fn empty() -> Self {
        Self {
            features: Vec::new(),
            key_tokens: Vec::new(),
            mask: Vec::new(),
        }
    }

    /// Append masked-out samples until the trajectory holds `len` samples.
    pub fn padded_to(mut self, len: usize, pad_token: u32) -> Self {
        while self.key_tokens.len() < len {
            self.features.extend_from_slice(&[0.0; FEATURES_PER_SAMPLE]);
            self.key_tokens.push(pad_token);
            self.mask.push(false);
        }
        self
    }

    /// Total sample count, padding included.
    pub fn len(&self) -> usize {
        self.key_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_tokens.is_empty()
    }

    pub fn n_valid(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }

    pub fn has_valid_samples(&self) -> bool {
        self.mask.iter().any(|&m| m)
    }

    pub fn key_tokens(&self) -> &[u32] {
        &self.key_tokens
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn features(&self, i: usize) -> &[f32] {
        &self.features[i * FEATURES_PER_SAMPLE..(i + 1) * FEATURES_PER_SAMPLE]
    }

    /// Iterate `(key_token, features)` over real samples only.
    pub fn valid_samples(&self) -> impl Iterator<Item = (u32, &[f32])> + '_ {
        (0..self.len())
            .filter(|&i| self.mask[i])
            .map(|i| (self.key_tokens[i], self.features(i)))
    }
}
