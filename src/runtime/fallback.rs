//! Host-staged fallback kernels for runtimes without native sparse support
//!
//! These are the default bodies of [`SparseKernels`](crate::sparse::SparseKernels).
//! Each one copies its inputs from the device to host memory, runs the shared
//! host kernel and uploads the result to the device the inputs came from.
//!
//! # Performance Impact
//!
//! Every call pays two transfers (device→host for the inputs, host→device for
//! the output). That is acceptable for correctness and prototyping, and for
//! accelerators whose native kernels are still missing; it is not a substitute
//! for a native implementation on hot paths.
//!
//! # Numerical Equivalence
//!
//! The host kernels are the ones the CPU runtime runs, so fallback results are
//! bit-for-bit identical to CPU results for every dtype.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::sparse::kernels;
use crate::tensor::Storage;

/// Copy a device buffer to host memory
fn stage<R: Runtime, T: Element>(storage: &Storage<R>, op: &'static str) -> Result<Vec<T>> {
    log::debug!(
        "{op}: staging {} bytes from {} through host memory",
        storage.size_in_bytes(),
        R::name()
    );
    storage.to_vec::<T>()
}

/// Upload a host result to `device`
fn upload<R: Runtime, T: Element>(
    data: &[T],
    device: &R::Device,
    op: &'static str,
) -> Result<Storage<R>> {
    log::trace!(
        "{op}: uploading {} {} elements to {}",
        data.len(),
        T::DTYPE,
        R::name()
    );
    Storage::from_slice(data, device)
}

/// Host-staged [`SparseKernels::check_indices`](crate::sparse::SparseKernels::check_indices)
pub fn check_indices<R: Runtime>(indices: &Storage<R>, nnz: usize, shape: &[usize]) -> Result<bool> {
    let host = stage::<R, i64>(indices, "check_indices")?;
    kernels::check_indices(&host, nnz, shape)
}

/// Host-staged [`SparseKernels::remap_indices`](crate::sparse::SparseKernels::remap_indices)
pub fn remap_indices<R: Runtime>(
    indices: &Storage<R>,
    nnz: usize,
    from: &[usize],
    to: &[usize],
) -> Result<Storage<R>> {
    let host = stage::<R, i64>(indices, "remap_indices")?;
    let mut out = vec![0i64; nnz * to.len()];
    kernels::remap_indices(&host, nnz, from, to, &mut out);
    upload(&out, indices.device(), "remap_indices")
}

/// Host-staged [`SparseKernels::map_values`](crate::sparse::SparseKernels::map_values)
pub fn map_values<R, T, F>(values: &Storage<R>, f: F) -> Result<Storage<R>>
where
    R: Runtime,
    T: Element,
    F: Fn(T) -> T + Send + Sync,
{
    let host = stage::<R, T>(values, "map_values")?;
    let mut out = host.clone();
    kernels::map_values(&host, &mut out, &f);
    upload(&out, values.device(), "map_values")
}

/// Host-staged [`SparseKernels::gather_nonzero`](crate::sparse::SparseKernels::gather_nonzero)
pub fn gather_nonzero<R: Runtime, T: Element>(
    dense: &Storage<R>,
    shape: &[usize],
) -> Result<(Storage<R>, Storage<R>)> {
    let host = stage::<R, T>(dense, "gather_nonzero")?;
    let (indices, values) = kernels::gather_nonzero(&host, shape);
    Ok((
        upload(&indices, dense.device(), "gather_nonzero")?,
        upload(&values, dense.device(), "gather_nonzero")?,
    ))
}

/// Host-staged [`SparseKernels::scatter_to_dense`](crate::sparse::SparseKernels::scatter_to_dense)
pub fn scatter_to_dense<R: Runtime, T: Element>(
    indices: &Storage<R>,
    values: &Storage<R>,
    shape: &[usize],
) -> Result<Storage<R>> {
    let len = kernels::dense_len(shape)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        size: len.saturating_mul(T::DTYPE.size_in_bytes()),
    })?;
    out.resize(len, T::zero());

    let host_indices = stage::<R, i64>(indices, "scatter_to_dense")?;
    let host_values = stage::<R, T>(values, "scatter_to_dense")?;
    kernels::scatter(&host_indices, &host_values, shape, &mut out);
    upload(&out, values.device(), "scatter_to_dense")
}

/// Host-staged [`SparseKernels::sort_entries`](crate::sparse::SparseKernels::sort_entries)
pub fn sort_entries<R: Runtime, T: Element>(
    indices: &Storage<R>,
    values: &Storage<R>,
    shape: &[usize],
) -> Result<(Storage<R>, Storage<R>)> {
    let host_indices = stage::<R, i64>(indices, "sort_entries")?;
    let host_values = stage::<R, T>(values, "sort_entries")?;
    let keys = kernels::linear_keys(&host_indices, host_values.len(), shape);
    let perm = kernels::sort_permutation(&keys);
    let (si, sv) = kernels::permute_entries(&host_indices, &host_values, shape.len(), &perm);
    Ok((
        upload(&si, indices.device(), "sort_entries")?,
        upload(&sv, values.device(), "sort_entries")?,
    ))
}

/// Host-staged [`SparseKernels::drop_zeros`](crate::sparse::SparseKernels::drop_zeros)
pub fn drop_zeros<R: Runtime, T: Element>(
    indices: &Storage<R>,
    values: &Storage<R>,
    rank: usize,
) -> Result<(Storage<R>, Storage<R>)> {
    let host_indices = stage::<R, i64>(indices, "drop_zeros")?;
    let host_values = stage::<R, T>(values, "drop_zeros")?;
    let (di, dv) = kernels::drop_zeros(&host_indices, &host_values, rank);
    Ok((
        upload(&di, indices.device(), "drop_zeros")?,
        upload(&dv, values.device(), "drop_zeros")?,
    ))
}
