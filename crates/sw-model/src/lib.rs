pub mod architecture;
pub mod error;
pub mod gguf;
pub mod m1;
pub mod registry;
pub mod tokenizer;
pub mod trajectory;

pub use architecture::{EncodedContext, SwipeModel};
pub use error::{ModelError, Result};
pub use registry::ModelKind;
pub use tokenizer::{CharTokenizer, Vocab};
pub use trajectory::{TouchSample, Trajectory, FEATURES_PER_SAMPLE};
