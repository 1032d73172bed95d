//! Native sparse kernels for the CPU runtime
//!
//! CPU buffers are host memory, so the shared host kernels run directly on
//! them without staging copies.

use super::runtime::{host_slice, host_slice_mut};
use super::CpuRuntime;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::sparse::{SparseKernels, kernels};
use crate::tensor::Storage;

impl SparseKernels for CpuRuntime {
    fn check_indices(indices: &Storage<Self>, nnz: usize, shape: &[usize]) -> Result<bool> {
        kernels::check_indices(host_slice::<i64>(indices)?, nnz, shape)
    }

    fn remap_indices(
        indices: &Storage<Self>,
        nnz: usize,
        from: &[usize],
        to: &[usize],
    ) -> Result<Storage<Self>> {
        let src = host_slice::<i64>(indices)?;
        let len = nnz
            .checked_mul(to.len())
            .ok_or(Error::OutOfMemory { size: usize::MAX })?;
        let mut out = Storage::zeroed(len, DType::I64, indices.device())?;
        kernels::remap_indices(src, nnz, from, to, host_slice_mut::<i64>(&mut out)?);
        log::trace!("cpu remap_indices: {nnz} entries, {from:?} -> {to:?}");
        Ok(out)
    }

    fn map_values<T, F>(values: &Storage<Self>, f: F) -> Result<Storage<Self>>
    where
        T: Element,
        F: Fn(T) -> T + Send + Sync,
    {
        let src = host_slice::<T>(values)?;
        let mut out = Storage::zeroed(src.len(), T::DTYPE, values.device())?;
        kernels::map_values(src, host_slice_mut::<T>(&mut out)?, &f);
        Ok(out)
    }

    fn gather_nonzero<T: Element>(
        dense: &Storage<Self>,
        shape: &[usize],
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        let (indices, values) = kernels::gather_nonzero(host_slice::<T>(dense)?, shape);
        Ok((
            Storage::from_slice(&indices, dense.device())?,
            Storage::from_slice(&values, dense.device())?,
        ))
    }

    fn scatter_to_dense<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        shape: &[usize],
    ) -> Result<Storage<Self>> {
        let len = kernels::dense_len(shape)?;
        let mut out = Storage::zeroed(len, T::DTYPE, values.device())?;
        kernels::scatter(
            host_slice::<i64>(indices)?,
            host_slice::<T>(values)?,
            shape,
            host_slice_mut::<T>(&mut out)?,
        );
        Ok(out)
    }

    fn sort_entries<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        shape: &[usize],
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        let idx = host_slice::<i64>(indices)?;
        let vals = host_slice::<T>(values)?;
        let keys = kernels::linear_keys(idx, vals.len(), shape);
        let perm = kernels::sort_permutation(&keys);
        let (si, sv) = kernels::permute_entries(idx, vals, shape.len(), &perm);
        Ok((
            Storage::from_slice(&si, indices.device())?,
            Storage::from_slice(&sv, values.device())?,
        ))
    }

    fn drop_zeros<T: Element>(
        indices: &Storage<Self>,
        values: &Storage<Self>,
        rank: usize,
    ) -> Result<(Storage<Self>, Storage<Self>)> {
        let (di, dv) = kernels::drop_zeros(
            host_slice::<i64>(indices)?,
            host_slice::<T>(values)?,
            rank,
        );
        Ok((
            Storage::from_slice(&di, indices.device())?,
            Storage::from_slice(&dv, values.device())?,
        ))
    }
}
