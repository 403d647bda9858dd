//! `sw-tensor` - Compute primitives for swipe-decoder model execution.
//!
//! This crate provides:
//! - A `ComputeBackend` trait so models stay independent of where math runs
//! - The reference `CpuBackend` that every worker uses
//! - Data type definitions for stored weights (F32, F16)

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;

pub use backend::ComputeBackend;
pub use cpu::CpuBackend;
pub use dtype::DType;
pub use error::{Result, TensorError};
