//! Dense tensor types and coordinate arithmetic
//!
//! This module provides the dense `Tensor` type, the `Storage` buffers that back
//! both dense and sparse tensors, and the row-major stride helpers used to move
//! between N-dimensional coordinates and linear positions.

mod core;
mod shape;
mod storage;
mod strides;

pub use self::core::Tensor;
pub use shape::{MAX_NUMEL, Shape};
pub use storage::Storage;
pub use strides::{Strides, ravel, strides_for, unravel, unravel_into};
