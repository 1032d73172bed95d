//! # dokr
//!
//! **Sparse coordinate tensors for Rust, on host or accelerator memory.**
//!
//! dokr stores N-dimensional arrays as their non-default elements only
//! (dictionary-of-keys form) and supports reshaping, dense round trips and
//! elementwise transforms across nine scalar kinds.
//!
//! ## Features
//!
//! - **Sparse tensors**: coordinate storage with validated, unique indices
//! - **Shape transforms**: `flatten` and `reshape` by ravel/unravel of coordinates
//! - **Dense bridge**: `from_dense` / `to_dense` for every dtype, bool included
//! - **Elementwise**: zero-preserving `apply`, plus a densifying fallback
//! - **Multiple dtypes**: f64, f32, f16, i64, i32, i16, i8, u8, bool
//! - **Backing stores**: buffers are owned by a `Runtime`; the CPU runtime
//!   runs kernels in place, others stage through host memory
//!
//! ## Quick Start
//!
//! ```rust
//! use dokr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let t = SparseTensor::<CpuRuntime>::new(
//!     &[[0usize, 1], [2, 3]],
//!     &[1.5f32, -2.0],
//!     &[3, 4],
//!     &device,
//! )?;
//!
//! let flat = t.flatten()?;
//! assert_eq!(flat.coordinates()?, vec![vec![1], vec![11]]);
//!
//! let dense = flat.reshape(&[4, 3])?.to_dense()?;
//! assert_eq!(dense.shape(), &[4, 3]);
//! # Ok::<(), dokr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): Multi-threaded CPU kernels above
//!   [`sparse::PARALLEL_THRESHOLD`] entries

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod dtype;
pub mod error;
pub mod runtime;
pub mod sparse;
pub mod tensor;

/// Default runtime for host-resident tensors
pub type DefaultRuntime = runtime::cpu::CpuRuntime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::{DType, Element};
    pub use crate::error::{Error, Result};
    pub use crate::runtime::cpu::{CpuDevice, CpuRuntime};
    pub use crate::runtime::{Device, Residency, Runtime};
    pub use crate::sparse::{
        BuildOptions, DuplicatePolicy, SparseKernels, SparseStorage, SparseTensor, ZeroPolicy,
    };
    pub use crate::tensor::Tensor;
}
