//! Keyboard geometry and curve featurization.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use sw_model::{CharTokenizer, TouchSample, Trajectory};

use crate::error::{PredictError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Hitbox {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    fn distance_sq(&self, x: f32, y: f32) -> f32 {
        let cx = self.x + self.w / 2.0;
        let cy = self.y + self.h / 2.0;
        (x - cx).powi(2) + (y - cy).powi(2)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Key {
    pub label: String,
    pub hitbox: Hitbox,
}

/// A single keyboard surface, in pixels.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyboardLayout {
    pub width: f32,
    pub height: f32,
    pub keys: Vec<Key>,
}

/// Raw gesture as recorded: pixel coordinates and timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct Curve {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub t: Vec<f32>,
    pub grid_name: String,
}

impl KeyboardLayout {
    /// The key under `(x, y)`, or the key whose center is nearest.
    pub fn key_at(&self, x: f32, y: f32) -> Option<&Key> {
        self.keys.iter().find(|k| k.hitbox.contains(x, y)).or_else(|| {
            self.keys
                .iter()
                .min_by(|a, b| a.hitbox.distance_sq(x, y).total_cmp(&b.hitbox.distance_sq(x, y)))
        })
    }

    /// Turn a curve into a trajectory on this layout.
    ///
    /// Coordinates are normalized by the layout size. Velocity and
    /// acceleration are finite differences over `t`, zero at the first
    /// sample and wherever two timestamps coincide.
    ///
    /// Coordinate arrays of different lengths are an
    /// [`PredictError::InvalidCurve`]; a key the vocabulary cannot name is a
    /// configuration error.
    pub fn featurize(&self, curve: &Curve, tokenizer: &CharTokenizer) -> Result<Trajectory> {
        let n = curve.x.len();
        if curve.y.len() != n || curve.t.len() != n {
            return Err(PredictError::InvalidCurve(format!(
                "curve has {} x, {} y and {} t values",
                n,
                curve.y.len(),
                curve.t.len()
            )));
        }

        let mut samples: Vec<TouchSample> = Vec::with_capacity(n);
        for i in 0..n {
            let (px, py) = (curve.x[i], curve.y[i]);
            let key = self.key_at(px, py).ok_or_else(|| {
                PredictError::Config(format!("layout {:?} has no keys", curve.grid_name))
            })?;
            let token = self.key_token(key, tokenizer)?;
            let mut sample = TouchSample::at(token, px / self.width, py / self.height);

            if i > 0 {
                let prev = samples[i - 1];
                let dt = curve.t[i] - curve.t[i - 1];
                if dt != 0.0 {
                    sample.velocity = [(sample.x - prev.x) / dt, (sample.y - prev.y) / dt];
                    sample.acceleration = [
                        (sample.velocity[0] - prev.velocity[0]) / dt,
                        (sample.velocity[1] - prev.velocity[1]) / dt,
                    ];
                }
            }
            samples.push(sample);
        }
        Ok(Trajectory::from_samples(&samples))
    }

    fn key_token(&self, key: &Key, tokenizer: &CharTokenizer) -> Result<u32> {
        let vocab = &tokenizer.vocab;
        vocab
            .id_of(&key.label)
            .or(vocab.unk_id)
            .or(vocab.pad_id)
            .ok_or_else(|| {
                PredictError::Config(format!(
                    "key label {:?} is not in the vocabulary and there is no <unk> or <pad> token",
                    key.label
                ))
            })
    }
}

/// All layouts of a geometry file, keyed by layout name.
#[derive(Debug, Clone, Default)]
pub struct LayoutSet {
    layouts: BTreeMap<String, KeyboardLayout>,
}

impl LayoutSet {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PredictError::Config(format!("cannot read layouts {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let layouts: BTreeMap<String, KeyboardLayout> = serde_json::from_str(text)
            .map_err(|e| PredictError::Config(format!("invalid layout file: {}", e)))?;
        for (name, layout) in &layouts {
            if !(layout.width > 0.0 && layout.height > 0.0) {
                return Err(PredictError::Config(format!(
                    "layout {:?} has non-positive size {}x{}",
                    name, layout.width, layout.height
                )));
            }
        }
        Ok(Self { layouts })
    }

    pub fn get(&self, name: &str) -> Option<&KeyboardLayout> {
        self.layouts.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layouts.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}
