use std::collections::HashMap;
use std::path::Path;

use crate::error::{ModelError, Result};

pub const SOS_TOKEN: &str = "<sos>";
pub const EOS_TOKEN: &str = "<eos>";
pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";

/// Closed token vocabulary; a token's id is its position in the list.
#[derive(Debug, Clone)]
pub struct Vocab {
    /// Token strings, indexed by token ID.
    pub tokens: Vec<String>,
    /// Reverse mapping from token string to token ID.
    pub token_to_id: HashMap<String, u32>,
    pub sos_id: u32,
    pub eos_id: u32,
    pub pad_id: Option<u32>,
    pub unk_id: Option<u32>,
}

impl Vocab {
    /// Build a vocabulary from an ordered token list.
    ///
    /// `<sos>` and `<eos>` must be present; `<pad>` and `<unk>` are optional.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Vocab> {
        let mut token_to_id = HashMap::with_capacity(tokens.len());
        for (id, tok) in tokens.iter().enumerate() {
            if token_to_id.insert(tok.clone(), id as u32).is_some() {
                return Err(ModelError::TokenizerError(format!("duplicate token {:?}", tok)));
            }
        }

        let required = |name: &str| {
            token_to_id.get(name).copied().ok_or_else(|| {
                ModelError::TokenizerError(format!("vocabulary has no {} token", name))
            })
        };
        let sos_id = required(SOS_TOKEN)?;
        let eos_id = required(EOS_TOKEN)?;
        let pad_id = token_to_id.get(PAD_TOKEN).copied();
        let unk_id = token_to_id.get(UNK_TOKEN).copied();

        Ok(Vocab {
            tokens,
            token_to_id,
            sos_id,
            eos_id,
            pad_id,
            unk_id,
        })
    }

    /// Load a vocabulary file: one token per line, blank lines ignored.
    pub fn load(path: &Path) -> Result<Vocab> {
        let text = std::fs::read_to_string(path)?;
        let tokens = text
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Vocab::from_tokens(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn id_of(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    pub fn token(&self, id: u32) -> Option<&str> {
        self.tokens.get(id as usize).map(String::as_str)
    }

    /// True for `<sos>`, `<eos>`, `<pad>` and `<unk>`.
    pub fn is_control(&self, id: u32) -> bool {
        id == self.sos_id || id == self.eos_id || Some(id) == self.pad_id || Some(id) == self.unk_id
    }
}
