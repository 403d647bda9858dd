use std::fmt::Debug;

use crate::error::Result;

/// Trait for pluggable compute backends.
///
/// All operations work on row-major f32 slices and return owned vectors.
/// Swipe models are pinned to CPU inference, so `CpuBackend` is the only
/// implementation; the trait keeps the model code free of backend details.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Matrix multiplication: C = A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - Returns: row-major data of shape [m, n]
    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>>;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>>;

    /// Inner product of two equally sized vectors.
    fn dot(&self, a: &[f32], b: &[f32]) -> Result<f32>;

    /// Softmax over chunks of `n` elements.
    ///
    /// For each chunk: result[i] = exp(x[i] - max(x)) / sum(exp(x[j] - max(x)))
    fn softmax(&self, x: &[f32], n: usize) -> Result<Vec<f32>>;

    /// Log-softmax over chunks of `n` elements.
    ///
    /// For each chunk: result[i] = x[i] - max(x) - ln(sum(exp(x[j] - max(x))))
    fn log_softmax(&self, x: &[f32], n: usize) -> Result<Vec<f32>>;
}
