use crate::backend::ComputeBackend;
use crate::error::{Result, TensorError};

/// Pure-Rust CPU compute backend.
///
/// Straightforward loops; the swipe models are small enough that clarity
/// wins over blocked kernels.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn check_chunked(op: &str, len: usize, n: usize) -> Result<()> {
    if n == 0 {
        return Err(TensorError::Other(format!("{}: chunk size must be > 0", op)));
    }
    if len % n != 0 {
        return Err(TensorError::Other(format!(
            "{}: x.len()={} is not a multiple of {}",
            op, len, n
        )));
    }
    Ok(())
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn matmul(&self, a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Result<Vec<f32>> {
        if a.len() != m * k {
            return Err(TensorError::MatmulMismatch {
                m,
                k: a.len() / m.max(1),
                k2: k,
                n,
            });
        }
        if b.len() != k * n {
            return Err(TensorError::MatmulMismatch {
                m,
                k,
                k2: b.len() / n.max(1),
                n,
            });
        }

        let mut c = vec![0.0f32; m * n];
        for i in 0..m {
            for p in 0..k {
                let a_ip = a[i * k + p];
                if a_ip == 0.0 {
                    continue;
                }
                for j in 0..n {
                    c[i * n + j] += a_ip * b[p * n + j];
                }
            }
        }
        Ok(c)
    }

    fn add(&self, a: &[f32], b: &[f32]) -> Result<Vec<f32>> {
        if a.len() != b.len() {
            return Err(TensorError::LengthMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
    }

    fn dot(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(TensorError::LengthMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
    }

    fn softmax(&self, x: &[f32], n: usize) -> Result<Vec<f32>> {
        Ok(self.log_softmax(x, n)?.into_iter().map(f32::exp).collect())
    }

    fn log_softmax(&self, x: &[f32], n: usize) -> Result<Vec<f32>> {
        check_chunked("log_softmax", x.len(), n)?;
        let mut result = Vec::with_capacity(x.len());

        for row in x.chunks_exact(n) {
            // shift by the max so exp() cannot overflow
            let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let log_sum = row.iter().map(|v| (v - max).exp()).sum::<f32>().ln();
            result.extend(row.iter().map(|v| v - max - log_sum));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn backend() -> CpuBackend {
        CpuBackend::new()
    }

    #[test]
    fn test_matmul_identity() {
        let b = backend();
        // 2x2 identity @ [1,2;3,4]
        let a = vec![1.0, 0.0, 0.0, 1.0];
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let c = b.matmul(&a, &x, 2, 2, 2).unwrap();
        assert_eq!(c, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_matmul_matrix_vector() {
        let b = backend();
        // [1,2,3;4,5,6] @ [1;0;2] = [7;16]
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let x = vec![1.0, 0.0, 2.0];
        let c = b.matmul(&a, &x, 2, 3, 1).unwrap();
        assert_eq!(c, vec![7.0, 16.0]);
    }

    #[test]
    fn test_matmul_bad_shape() {
        let b = backend();
        assert!(b.matmul(&[1.0, 2.0, 3.0], &[1.0, 2.0], 2, 2, 1).is_err());
    }

    #[test]
    fn test_add_and_dot() {
        let b = backend();
        assert_eq!(b.add(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), vec![4.0, 6.0]);
        assert_eq!(b.dot(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), 11.0);
        assert!(b.dot(&[1.0], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let b = backend();
        let r = b.softmax(&[1.0, 2.0, 3.0, 0.0, 0.0, 0.0], 3).unwrap();
        assert_relative_eq!(r[0..3].iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(r[3], 1.0 / 3.0, epsilon = 1e-6);
        assert!(r[2] > r[1] && r[1] > r[0]);
    }

    #[test]
    fn test_log_softmax_matches_softmax() {
        let b = backend();
        let x = [0.5, -1.0, 2.0, 3.0];
        let sm = b.softmax(&x, 4).unwrap();
        let lsm = b.log_softmax(&x, 4).unwrap();
        for (p, lp) in sm.iter().zip(lsm.iter()) {
            if *p > 0.0 {
                assert_relative_eq!(p.ln(), *lp, epsilon = 1e-4);
            }
            assert!(lp.is_finite());
        }
    }

    #[test]
    fn test_softmax_rejects_zero_chunk() {
        assert!(backend().softmax(&[1.0], 0).is_err());
        assert!(backend().log_softmax(&[1.0, 2.0, 3.0], 2).is_err());
        assert!(backend().softmax(&[1.0, 2.0, 3.0], 2).is_err());
    }
}
