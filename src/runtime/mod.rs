//! Backing-store runtimes for tensor buffers
//!
//! This module defines the `Runtime` trait and the host (CPU) implementation.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity, RESIDENCY = Host | Accelerator)
//! ├── Device (identifies a specific GPU/CPU)
//! └── allocate / copy_to_device / copy_from_device
//! ```
//!
//! Sparse kernels are attached to runtimes through
//! [`SparseKernels`](crate::sparse::SparseKernels). Runtimes without native
//! kernels inherit the host-staged implementations in [`fallback`].

pub mod cpu;
pub mod fallback;
mod traits;

pub use traits::{Device, Residency, Runtime};
