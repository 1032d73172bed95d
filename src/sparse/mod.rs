//! Sparse N-dimensional tensors in dictionary-of-keys (coordinate) form
//!
//! A sparse tensor stores only its non-default elements, as a flat `I64`
//! index buffer (`nnz * rank` components) and a parallel value buffer of
//! `nnz` elements. Both buffers live in [`Storage`](crate::tensor::Storage) of
//! a [`Runtime`](crate::runtime::Runtime), so the same engine code serves host
//! memory and accelerator memory.
//!
//! # Usage
//!
//! ```
//! use dokr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let dense = [0i32, -3, 0, 0, 5, 0];
//! let sparse = SparseTensor::<CpuRuntime>::from_dense_slice(&dense, &[2, 3], &device)?;
//! assert_eq!(sparse.nnz(), 2);
//!
//! let reshaped = sparse.reshape(&[3, 2])?;
//! let positive = reshaped.abs()?;
//! assert_eq!(positive.to_dense()?.to_vec::<i32>()?, vec![0, 3, 0, 0, 5, 0]);
//! # Ok::<(), dokr::error::Error>(())
//! ```
//!
//! # Operations
//!
//! - **Construction**: explicit coordinates ([`SparseTensor::new`],
//!   [`SparseTensor::new_with`]), device buffers ([`SparseTensor::from_parts`])
//!   or dense data ([`SparseTensor::from_dense`])
//! - **Shape transforms**: `flatten`, `reshape` (values shared, indices remapped)
//! - **Elementwise**: `apply` (zero-preserving functions), `map_densified`
//!   (anything else, through the dense form), `abs`
//! - **Dense bridge**: `to_dense`
//!
//! # Kernels
//!
//! Device work goes through [`SparseKernels`]. The CPU runtime implements it
//! natively; other runtimes inherit host-staged defaults.

mod config;
mod format;
pub(crate) mod kernels;
mod ops;
mod store;
mod tensor;

pub use config::{BuildOptions, DuplicatePolicy, ZeroPolicy};
pub use format::SparseStorage;
pub use kernels::PARALLEL_THRESHOLD;
pub use ops::SparseKernels;
pub use store::CoordinateStore;
pub use tensor::SparseTensor;
