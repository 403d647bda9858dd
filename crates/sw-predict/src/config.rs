use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{json, Value};
use sw_decode::GeneratorConfig;
use sw_model::ModelKind;

use crate::error::{PredictError, Result};
use crate::layout::LayoutSet;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    prediction_config: RawConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    model_params: Vec<(String, ModelKind, String)>,
    #[serde(default = "default_models_root")]
    models_root: PathBuf,
    generator: String,
    #[serde(default)]
    generator_kwargs: Option<Value>,
    voc_path: PathBuf,
    #[serde(rename = "grid_name_to_grid__path")]
    layouts_path: PathBuf,
    data_path: PathBuf,
    out_path: PathBuf,
    #[serde(default = "default_num_workers")]
    num_workers: usize,
    #[serde(default)]
    max_items: Option<usize>,
}

fn default_models_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_num_workers() -> usize {
    1
}

/// One trained model instance: the layout it serves, its architecture and
/// its weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBinding {
    pub layout: String,
    pub kind: ModelKind,
    /// Weights path as written in the configuration, relative to the
    /// models root. Artifact names and prediction ids derive from it.
    pub weights: String,
    /// `weights` resolved against the models root.
    pub weights_path: PathBuf,
}

impl ModelBinding {
    /// `{weights}__{generator}__{generator_kwargs}`
    pub fn pred_id(&self, generator: &GeneratorConfig) -> Result<String> {
        Ok(format!("{}__{}__{}", self.weights, generator.kind(), generator_kwargs_json(generator)?))
    }

    pub fn artifact_name(&self) -> String {
        format!("{}.json", self.weights.replace('/', "__"))
    }
}

impl fmt::Display for ModelBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.layout, self.kind, self.weights)
    }
}

/// Canonical JSON of the generator parameters, defaults filled in.
pub fn generator_kwargs_json(generator: &GeneratorConfig) -> Result<String> {
    let tagged = serde_json::to_value(generator)?;
    Ok(tagged
        .get("generator_kwargs")
        .map(Value::to_string)
        .unwrap_or_else(|| "{}".to_string()))
}

/// Validated settings of one prediction run.
#[derive(Debug, Clone)]
pub struct PredictionConfig {
    pub bindings: Vec<ModelBinding>,
    pub generator: GeneratorConfig,
    pub vocab_path: PathBuf,
    pub layouts_path: PathBuf,
    pub data_path: PathBuf,
    pub out_dir: PathBuf,
    pub num_workers: usize,
    pub max_items: Option<usize>,
}

impl PredictionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PredictError::Config(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parse the `prediction_config` section. Unknown architectures,
    /// generators and generator parameters are rejected here.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(text)
            .map_err(|e| PredictError::Config(format!("invalid config: {}", e)))?;
        let raw = file.prediction_config;

        let tagged = json!({
            "generator": raw.generator,
            "generator_kwargs": raw.generator_kwargs.unwrap_or_else(|| json!({})),
        });
        let generator: GeneratorConfig = serde_json::from_value(tagged).map_err(|e| {
            PredictError::Config(format!("invalid generator {:?}: {}", raw.generator, e))
        })?;

        let bindings = raw
            .model_params
            .into_iter()
            .map(|(layout, kind, weights)| ModelBinding {
                weights_path: raw.models_root.join(&weights),
                layout,
                kind,
                weights,
            })
            .collect();

        Ok(Self {
            bindings,
            generator,
            vocab_path: raw.voc_path,
            layouts_path: raw.layouts_path,
            data_path: raw.data_path,
            out_dir: raw.out_path,
            num_workers: raw.num_workers,
            max_items: raw.max_items,
        })
    }

    /// Checks that must pass before any model is loaded.
    pub fn validate(&self, layouts: &LayoutSet) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PredictError::Config("num_workers must be at least 1".to_string()));
        }
        self.generator
            .validate()
            .map_err(|e| PredictError::Config(e.to_string()))?;
        for binding in &self.bindings {
            if !binding.weights_path.is_file() {
                return Err(PredictError::Config(format!(
                    "weights {} for {} do not exist",
                    binding.weights_path.display(),
                    binding
                )));
            }
            if !layouts.contains(&binding.layout) {
                return Err(PredictError::Config(format!(
                    "layout {:?} of {} is not in {}",
                    binding.layout,
                    binding,
                    self.layouts_path.display()
                )));
            }
        }
        Ok(())
    }
}
