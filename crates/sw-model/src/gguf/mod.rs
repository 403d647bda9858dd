//! Minimal GGUF v3 container support for swipe model weights.
//!
//! Only unquantized tensors (F32, F16) are accepted; the swipe models are
//! small enough that quantization buys nothing.

pub mod header;
pub mod metadata;
pub mod reader;
pub mod tensor_info;
pub mod writer;

mod io;

pub use header::{GgufHeader, GGUF_DEFAULT_ALIGNMENT, GGUF_MAGIC, GGUF_VERSION};
pub use metadata::{GgufMetadata, GgufMetadataValue};
pub use reader::GgufFile;
pub use tensor_info::GgufTensorInfo;
pub use writer::GgufWriter;
