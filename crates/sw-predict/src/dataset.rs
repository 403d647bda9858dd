use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;
use sw_model::{CharTokenizer, Trajectory};

use crate::error::{PredictError, Result};
use crate::layout::{Curve, LayoutSet};

#[derive(Debug, Deserialize)]
struct RawRecord {
    curve: Curve,
    #[serde(default)]
    word: Option<String>,
}

/// A subset entry: the featurized trajectory, or why its curve was
/// rejected.
pub type SubsetItem<'a> = std::result::Result<&'a Trajectory, &'a str>;

/// One gesture and the layout it was recorded on.
#[derive(Debug, Clone)]
pub struct SwipeRecord {
    pub layout: String,
    /// `Err` holds the reason a malformed curve could not be featurized.
    pub trajectory: std::result::Result<Trajectory, String>,
    /// Target word, present in labelled datasets.
    pub word: Option<String>,
}

/// Gestures in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SwipeRecord>,
}

/// The records of one layout, in dataset order.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    pub layout: String,
    pub items: Vec<SubsetItem<'a>>,
}

impl Subset<'_> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Dataset {
    pub fn new(records: Vec<SwipeRecord>) -> Self {
        Self { records }
    }

    /// Load a JSON-lines dataset, featurizing every curve on its layout.
    ///
    /// Records on layouts missing from `layouts` are dropped. A malformed
    /// curve keeps its slot and fails only its own decode. At most
    /// `max_items` lines are read.
    pub fn load(
        path: &Path,
        layouts: &LayoutSet,
        tokenizer: &CharTokenizer,
        max_items: Option<usize>,
    ) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            PredictError::Config(format!("cannot open dataset {}: {}", path.display(), e))
        })?;
        Self::from_reader(std::io::BufReader::new(file), layouts, tokenizer, max_items)
    }

    pub fn from_reader<R: BufRead>(
        reader: R,
        layouts: &LayoutSet,
        tokenizer: &CharTokenizer,
        max_items: Option<usize>,
    ) -> Result<Self> {
        let mut records = Vec::new();
        let mut dropped = 0usize;
        let mut malformed = 0usize;
        let mut read = 0usize;

        for (i, line) in reader.lines().enumerate() {
            if max_items.is_some_and(|max| read >= max) {
                break;
            }
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            read += 1;

            let raw: RawRecord = serde_json::from_str(&line)
                .map_err(|e| PredictError::Config(format!("dataset line {}: {}", i + 1, e)))?;
            let Some(layout) = layouts.get(&raw.curve.grid_name) else {
                dropped += 1;
                continue;
            };
            let trajectory = match layout.featurize(&raw.curve, tokenizer) {
                Ok(t) => Ok(t),
                Err(PredictError::InvalidCurve(reason)) => {
                    tracing::warn!(line = i + 1, %reason, "malformed curve");
                    malformed += 1;
                    Err(format!("dataset line {}: {}", i + 1, reason))
                }
                Err(PredictError::Config(msg)) => {
                    return Err(PredictError::Config(format!("dataset line {}: {}", i + 1, msg)));
                }
                Err(e) => return Err(e),
            };
            records.push(SwipeRecord {
                layout: raw.curve.grid_name,
                trajectory,
                word: raw.word,
            });
        }

        if dropped > 0 {
            tracing::warn!(dropped, "dataset records on unknown layouts were skipped");
        }
        tracing::info!(records = records.len(), malformed, "dataset loaded");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SwipeRecord] {
        &self.records
    }

    pub fn subset(&self, layout: &str) -> Subset<'_> {
        Subset {
            layout: layout.to_string(),
            items: self
                .records
                .iter()
                .filter(|r| r.layout == layout)
                .map(|r| r.trajectory.as_ref().map_err(String::as_str))
                .collect(),
        }
    }
}
