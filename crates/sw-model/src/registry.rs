use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::architecture::SwipeModel;
use crate::error::{ModelError, Result};
use crate::gguf::reader::GgufFile;
use crate::m1::M1Model;

/// Every architecture the runtime can build, selected by its registered name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    M1,
    M1Bigger,
    M1Smaller,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::M1, ModelKind::M1Bigger, ModelKind::M1Smaller];

    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::M1 => "m1",
            ModelKind::M1Bigger => "m1_bigger",
            ModelKind::M1Smaller => "m1_smaller",
        }
    }

    pub fn hidden_size(&self) -> usize {
        match self {
            ModelKind::M1 => 64,
            ModelKind::M1Bigger => 128,
            ModelKind::M1Smaller => 32,
        }
    }

    /// Load weights from `path` and build this architecture on the CPU.
    ///
    /// The file's recorded architecture and hidden size must match `self`.
    pub fn load(&self, path: &Path) -> Result<Box<dyn SwipeModel>> {
        let gguf = GgufFile::open(path)?;
        let model = match self {
            ModelKind::M1 | ModelKind::M1Bigger | ModelKind::M1Smaller => {
                M1Model::from_gguf(&gguf)?
            }
        };

        if model.config.architecture != self.name() {
            return Err(ModelError::ArchitectureMismatch {
                expected: self.name().to_string(),
                got: model.config.architecture.clone(),
            });
        }
        if model.config.hidden_size != self.hidden_size() {
            return Err(ModelError::ArchitectureMismatch {
                expected: format!("{} with hidden size {}", self.name(), self.hidden_size()),
                got: format!("hidden size {}", model.config.hidden_size),
            });
        }

        tracing::debug!(
            architecture = self.name(),
            path = %path.display(),
            vocab_size = model.config.vocab_size,
            "loaded model weights"
        );
        Ok(Box::new(model))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| ModelError::UnknownArchitecture(s.to_string()))
    }
}
