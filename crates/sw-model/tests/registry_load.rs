use std::path::Path;

use sw_model::m1::{M1Config, M1Weights};
use sw_model::{ModelError, ModelKind, TouchSample, Trajectory, FEATURES_PER_SAMPLE};
use sw_tensor::DType;

fn write_weights(
    path: &Path,
    architecture: &str,
    hidden_size: usize,
    vocab_size: usize,
    dtype: DType,
) {
    let config = M1Config {
        architecture: architecture.to_string(),
        hidden_size,
        vocab_size,
        n_features: FEATURES_PER_SAMPLE,
    };
    let fill = |n: usize, k: f32| (0..n).map(|i| ((i as f32) * k).cos() * 0.1).collect::<Vec<_>>();
    let d = hidden_size;
    let weights = M1Weights {
        key_embd: fill(vocab_size * d, 0.37),
        coord_proj: fill(d * FEATURES_PER_SAMPLE, 0.11),
        tok_embd: fill(vocab_size * d, 0.53),
        out: fill(vocab_size * 2 * d, 0.29),
        out_bias: fill(vocab_size, 1.7),
    };
    weights.to_gguf(&config, dtype).unwrap().write_file(path).unwrap();
}

#[test]
fn test_loads_matching_architecture() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m1_smaller.gguf");
    write_weights(&path, "m1_smaller", 32, 5, DType::F16);

    let model = ModelKind::M1Smaller.load(&path).unwrap();
    assert_eq!(model.name(), "m1_smaller");
    assert_eq!(model.vocab_size(), 5);

    let t = Trajectory::from_samples(&[TouchSample::at(2, 0.5, 0.5), TouchSample::at(3, 0.6, 0.5)]);
    let ctx = model.encode(&t).unwrap();
    let first = model.step(&ctx, &[0]).unwrap();
    let again = model.step(&ctx, &[0]).unwrap();
    assert_eq!(first.len(), 5);
    assert_eq!(first, again);
}

#[test]
fn test_rejects_architecture_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.gguf");

    write_weights(&path, "m1_smaller", 32, 5, DType::F32);
    let err = ModelKind::M1.load(&path).err().unwrap();
    assert!(matches!(err, ModelError::ArchitectureMismatch { .. }));

    // Right name, wrong hidden size.
    write_weights(&path, "m1", 32, 5, DType::F32);
    let err = ModelKind::M1.load(&path).err().unwrap();
    assert!(matches!(err, ModelError::ArchitectureMismatch { .. }));
}

#[test]
fn test_rejects_corrupt_weights() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.gguf");
    std::fs::write(&path, b"not a gguf file at all").unwrap();
    let err = ModelKind::M1Smaller.load(&path).err().unwrap();
    assert!(matches!(err, ModelError::InvalidMagic(_)));
}

/// Overwrite the data offset recorded for `tensor` in a written file.
fn patch_offset(path: &Path, tensor: &str, offset: u64) {
    let mut bytes = std::fs::read(path).unwrap();
    let name = tensor.as_bytes();
    let at = bytes.windows(name.len()).position(|w| w == name).unwrap();
    // name, u32 n_dims, one u64 dim, u32 type id, then the u64 offset
    let field = at + name.len() + 4 + 8 + 4;
    bytes[field..field + 8].copy_from_slice(&offset.to_le_bytes());
    std::fs::write(path, bytes).unwrap();
}

#[test]
fn test_corrupt_offset_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("w.gguf");
    write_weights(&path, "m1_smaller", 32, 5, DType::F32);

    patch_offset(&path, "dec.out_bias", u64::MAX);
    let err = ModelKind::M1Smaller.load(&path).err().unwrap();
    assert!(matches!(err, ModelError::TruncatedTensor(ref name) if name == "dec.out_bias"));

    patch_offset(&path, "dec.out_bias", 1 << 40);
    let err = ModelKind::M1Smaller.load(&path).err().unwrap();
    assert!(matches!(err, ModelError::TruncatedTensor(_)));
}
