use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use sw_decode::{DecodeError, Predictor};
use sw_model::CharTokenizer;

use crate::config::{ModelBinding, PredictionConfig};
use crate::dataset::Dataset;
use crate::dispatch::ParallelDispatcher;
use crate::error::{PredictError, Result};
use crate::layout::LayoutSet;
use crate::output::PredictionArtifact;
use crate::registry::RunRegistry;

#[derive(Debug)]
pub enum BindingStatus {
    /// An artifact already existed and was left untouched.
    Skipped { artifact: PathBuf },
    Completed {
        artifact: PathBuf,
        items: usize,
        failures: usize,
    },
    Failed { error: PredictError },
}

#[derive(Debug)]
pub struct BindingReport {
    pub binding: ModelBinding,
    pub status: BindingStatus,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub bindings: Vec<BindingReport>,
}

impl RunReport {
    pub fn failed(&self) -> impl Iterator<Item = &BindingReport> {
        self.bindings
            .iter()
            .filter(|b| matches!(b.status, BindingStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed().next().is_some()
    }

    pub fn log_summary(&self) {
        for report in &self.bindings {
            match &report.status {
                BindingStatus::Skipped { artifact } => tracing::info!(
                    binding = %report.binding,
                    artifact = %artifact.display(),
                    "skipped"
                ),
                BindingStatus::Completed {
                    artifact,
                    items,
                    failures,
                } => tracing::info!(
                    binding = %report.binding,
                    artifact = %artifact.display(),
                    items,
                    failures,
                    "completed"
                ),
                BindingStatus::Failed { error } => {
                    tracing::error!(binding = %report.binding, error = %error, "failed")
                }
            }
        }
    }
}

/// Everything a run needs, loaded and validated up front.
pub struct Runner {
    config: PredictionConfig,
    tokenizer: Arc<CharTokenizer>,
    dataset: Dataset,
    registry: RunRegistry,
    show_progress: bool,
}

impl Runner {
    /// Load layouts, vocabulary and dataset and validate the configuration.
    /// Any failure here is a configuration error and nothing is loaded.
    pub fn prepare(config: PredictionConfig) -> Result<Self> {
        let layouts = LayoutSet::load(&config.layouts_path)?;
        config.validate(&layouts)?;

        let tokenizer = CharTokenizer::load(&config.vocab_path).map_err(|e| {
            let path = config.vocab_path.display();
            PredictError::Config(format!("cannot load vocabulary {}: {}", path, e))
        })?;
        let dataset = Dataset::load(&config.data_path, &layouts, &tokenizer, config.max_items)?;
        let registry = RunRegistry::new(&config.out_dir);

        Ok(Self {
            config,
            tokenizer: Arc::new(tokenizer),
            dataset,
            registry,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &PredictionConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Run every binding in configuration order. A failing binding is
    /// reported and the run moves on to the next one.
    pub fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        for binding in &self.config.bindings {
            let status = self
                .run_binding(binding)
                .unwrap_or_else(|error| BindingStatus::Failed { error });
            report.bindings.push(BindingReport {
                binding: binding.clone(),
                status,
            });
        }
        report
    }

    fn run_binding(&self, binding: &ModelBinding) -> Result<BindingStatus> {
        let artifact = self.registry.artifact_path(binding);
        if self.registry.is_complete(binding) {
            tracing::info!(
                binding = %binding,
                artifact = %artifact.display(),
                "artifact exists, skipping"
            );
            return Ok(BindingStatus::Skipped { artifact });
        }

        let started = Instant::now();
        let subset = self.dataset.subset(&binding.layout);
        tracing::info!(
            binding = %binding,
            items = subset.len(),
            workers = self.config.num_workers,
            "starting"
        );

        let generator = &self.config.generator;
        let factory = || -> std::result::Result<Predictor, DecodeError> {
            let model = binding.kind.load(&binding.weights_path)?;
            Predictor::new(model, generator, Arc::clone(&self.tokenizer))
        };
        let outcome = ParallelDispatcher::new(self.config.num_workers, binding.to_string())
            .with_progress(self.show_progress)
            .run(&subset.items, &factory)?;

        let artifact_body = PredictionArtifact {
            pred_id: binding.pred_id(generator)?,
            layout: binding.layout.clone(),
            architecture: binding.kind,
            weights_path: binding.weights.clone(),
            generator: generator.kind().to_string(),
            failed_indices: outcome.failed_indices(),
            predictions: outcome.predictions,
        };
        artifact_body.write_atomic(&artifact)?;

        let failures = artifact_body.failed_indices.len();
        tracing::info!(
            binding = %binding,
            artifact = %artifact.display(),
            items = subset.len(),
            failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "finished"
        );
        Ok(BindingStatus::Completed {
            artifact,
            items: subset.len(),
            failures,
        })
    }
}
