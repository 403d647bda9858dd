use crate::error::Result;
use crate::gguf::metadata::GgufMetadata;

pub const KEY_ARCHITECTURE: &str = "swipe.architecture";
pub const KEY_HIDDEN_SIZE: &str = "swipe.hidden_size";
pub const KEY_VOCAB_SIZE: &str = "swipe.vocab_size";
pub const KEY_N_FEATURES: &str = "swipe.n_features";

/// Hyperparameters of an m1-family model, parsed from GGUF metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct M1Config {
    /// Architecture name recorded in the weights file.
    pub architecture: String,
    pub hidden_size: usize,
    /// Shared by keyboard-key and word tokens.
    pub vocab_size: usize,
    /// Features per touch sample.
    pub n_features: usize,
}

impl M1Config {
    /// Reads `swipe.architecture`, `swipe.hidden_size`, `swipe.vocab_size`
    /// and `swipe.n_features`; all four are required.
    pub fn from_gguf(metadata: &GgufMetadata) -> Result<M1Config> {
        Ok(M1Config {
            architecture: metadata.get_string(KEY_ARCHITECTURE)?.to_string(),
            hidden_size: metadata.get_u32(KEY_HIDDEN_SIZE)? as usize,
            vocab_size: metadata.get_u32(KEY_VOCAB_SIZE)? as usize,
            n_features: metadata.get_u32(KEY_N_FEATURES)? as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::gguf::metadata::GgufMetadataValue;

    fn metadata(keys: &[(&str, GgufMetadataValue)]) -> GgufMetadata {
        let mut md = GgufMetadata::default();
        for (k, v) in keys {
            md.entries.insert(k.to_string(), v.clone());
        }
        md
    }

    #[test]
    fn test_reads_all_keys() {
        let md = metadata(&[
            (KEY_ARCHITECTURE, GgufMetadataValue::String("m1".to_string())),
            (KEY_HIDDEN_SIZE, GgufMetadataValue::U32(64)),
            (KEY_VOCAB_SIZE, GgufMetadataValue::U32(40)),
            (KEY_N_FEATURES, GgufMetadataValue::U32(6)),
        ]);
        let c = M1Config::from_gguf(&md).unwrap();
        assert_eq!((c.hidden_size, c.vocab_size, c.n_features), (64, 40, 6));
    }

    #[test]
    fn test_feature_count_is_required() {
        let md = metadata(&[
            (KEY_ARCHITECTURE, GgufMetadataValue::String("m1".to_string())),
            (KEY_HIDDEN_SIZE, GgufMetadataValue::U32(64)),
            (KEY_VOCAB_SIZE, GgufMetadataValue::U32(40)),
        ]);
        assert!(matches!(
            M1Config::from_gguf(&md),
            Err(ModelError::MissingKey(key)) if key == KEY_N_FEATURES
        ));
    }
}
