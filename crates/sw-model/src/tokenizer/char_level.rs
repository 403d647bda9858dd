use std::path::Path;

use crate::error::{ModelError, Result};
use super::vocab::Vocab;

/// Character-level tokenizer: every character of a word is one token.
#[derive(Debug, Clone)]
pub struct CharTokenizer {
    pub vocab: Vocab,
}

impl CharTokenizer {
    pub fn new(vocab: Vocab) -> Self {
        Self { vocab }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(Vocab::load(path)?))
    }

    pub fn len(&self) -> usize {
        self.vocab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocab.is_empty()
    }

    pub fn sos_id(&self) -> u32 {
        self.vocab.sos_id
    }

    pub fn eos_id(&self) -> u32 {
        self.vocab.eos_id
    }

    /// Token id for a single character, falling back to `<unk>`.
    pub fn char_id(&self, c: char) -> Option<u32> {
        let mut buf = [0u8; 4];
        self.vocab
            .id_of(c.encode_utf8(&mut buf))
            .or(self.vocab.unk_id)
    }

    /// Encode a word without control tokens.
    pub fn encode(&self, word: &str) -> Result<Vec<u32>> {
        word.chars()
            .map(|c| {
                self.char_id(c).ok_or_else(|| {
                    let msg = format!("character {:?} is not in the vocabulary", c);
                    ModelError::TokenizerError(msg)
                })
            })
            .collect()
    }

    /// Decode token ids to a Word, dropping every control token.
    pub fn decode(&self, ids: &[u32]) -> String {
        ids.iter()
            .filter(|&&id| !self.vocab.is_control(id))
            .filter_map(|&id| self.vocab.token(id))
            .collect()
    }
}
