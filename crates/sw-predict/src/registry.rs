use std::path::{Path, PathBuf};

use crate::config::ModelBinding;

/// Finished artifacts under the output directory, one per binding.
#[derive(Debug, Clone)]
pub struct RunRegistry {
    out_dir: PathBuf,
}

impl RunRegistry {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self { out_dir: out_dir.into() }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn artifact_path(&self, binding: &ModelBinding) -> PathBuf {
        self.out_dir.join(binding.artifact_name())
    }

    /// Whether a previous run already produced this binding's artifact.
    pub fn is_complete(&self, binding: &ModelBinding) -> bool {
        self.artifact_path(binding).exists()
    }
}
