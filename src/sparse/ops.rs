//! Sparse kernel trait
//!
//! Defines the device-level operations the coordinate engine is built on.

use crate::dtype::Element;
use crate::error::Result;
use crate::runtime::{Runtime, fallback};
use crate::tensor::Storage;

/// Device-level kernels behind every sparse tensor operation
///
/// `SparseTensor` is written once against this trait. Each method consumes and
/// produces storage of the implementing runtime, so results stay where the
/// inputs live.
///
/// # Architecture
///
/// Every method has a default that stages its inputs through host memory, runs
/// the host kernel and uploads the result to the input's device (see
/// [`runtime::fallback`](crate::runtime::fallback)). A runtime opts in with an
/// empty impl and overrides methods as native kernels become available:
///
/// ```ignore
/// impl SparseKernels for MyAcceleratorRuntime {}
/// ```
///
/// `CpuRuntime` overrides all of them to work on its buffers in place.
///
/// # Index layout
///
/// Index storage is `I64`, `nnz * rank` components long, entry `k` at
/// `[k * rank, (k + 1) * rank)`. Apart from `check_indices`, methods expect
/// indices that already passed `check_indices` for the given shape.
pub trait SparseKernels: Runtime {
    /// Validate bounds and uniqueness of `nnz` coordinates under `shape`
    ///
    /// Returns whether the entries are in row-major order.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfBounds` for a negative or too-large component
    /// - `DuplicateCoordinate` if two entries share a coordinate
    fn check_indices(indices: &Storage<Self>, nnz: usize, shape: &[usize]) -> Result<bool> {
        fallback::check_indices(indices, nnz, shape)
    }

    /// Re-express coordinates of a `from`-shaped tensor in the `to` shape
    ///
    /// Entry order is preserved. `from` and `to` must have equal element counts.
    fn remap_indices(
        indices: &Storage<Self>,
        nnz: usize,
        from: &[usize],
        to: &[usize],
    ) -> Result<Storage<Self>> {
        fallback::remap_indices(indices, nnz, from, to)
    }

    /// New value storage with `f` applied to every element
    fn map_values<T, F>(values: &Storage<Self>, f: F) -> Result<Storage<Self>>
    where
        T: Element,
        F: Fn(T) -> T + Send + Sync,
    {
        fallback::map_values(values, f)
    }

    /// Indices and values of the non-default elements of a dense buffer
    ///
    /// Entries come out in row-major order.
    fn gather_nonzero<T: Element>(
        dense: &Storage<Self>,
        shape: &[usize],
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        fallback::gather_nonzero::<Self, T>(dense, shape)
    }

    /// Dense buffer of `shape` holding every entry, default elsewhere
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if the dense buffer cannot be allocated.
    fn scatter_to_dense<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        shape: &[usize],
    ) -> Result<Storage<Self>> {
        fallback::scatter_to_dense::<Self, T>(indices, values, shape)
    }

    /// Entries reordered by row-major linear index
    fn sort_entries<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        shape: &[usize],
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        fallback::sort_entries::<Self, T>(indices, values, shape)
    }

    /// Entries whose value is not the default, order preserved
    fn drop_zeros<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        rank: usize,
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        fallback::drop_zeros::<Self, T>(indices, values, rank)
    }
}
