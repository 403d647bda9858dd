pub mod char_level;
pub mod vocab;

pub use char_level::CharTokenizer;
pub use vocab::{Vocab, EOS_TOKEN, PAD_TOKEN, SOS_TOKEN, UNK_TOKEN};
