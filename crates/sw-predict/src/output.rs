use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sw_decode::PredictionList;
use sw_model::ModelKind;

use crate::error::Result;

/// Everything one binding's run produced, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionArtifact {
    pub pred_id: String,
    pub layout: String,
    pub architecture: ModelKind,
    pub weights_path: String,
    pub generator: String,
    /// One list per subset item, in subset order.
    pub predictions: Vec<PredictionList>,
    pub failed_indices: Vec<usize>,
}

impl PredictionArtifact {
    /// Write to a temporary sibling of `path`, then rename into place.
    pub fn write_atomic(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);

        {
            let mut file = std::io::BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer(&mut file, self)?;
            file.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self> {
        let file = std::io::BufReader::new(fs::File::open(path)?);
        Ok(serde_json::from_reader(file)?)
    }
}
