//! Canonical form: entry ordering and explicit zeros

use super::SparseTensor;
use crate::dtype::dispatch_dtype;
use crate::error::Result;
use crate::sparse::SparseKernels;
use crate::sparse::store::CoordinateStore;

impl<R: SparseKernels> SparseTensor<R> {
    /// Reorder entries by row-major linear index
    ///
    /// Already-sorted tensors are returned as-is, sharing both buffers.
    pub fn sort_indices(&self) -> Result<Self> {
        if self.is_sorted() {
            return Ok(self.clone());
        }
        let (indices, values) = dispatch_dtype!(self.dtype(), T => {
            R::sort_entries::<T>(&self.store.indices, &self.store.values, self.shape())?
        });
        Ok(Self::from_store(CoordinateStore::from_validated(
            indices,
            values,
            self.store.shape.clone(),
            true,
        )))
    }

    /// Drop entries that store the default value
    ///
    /// Such entries come from `ZeroPolicy::Keep` construction or from
    /// `apply_unchecked` with a function that maps some values to zero.
    pub fn eliminate_zeros(&self) -> Result<Self> {
        let (indices, values) = dispatch_dtype!(self.dtype(), T => {
            R::drop_zeros::<T>(&self.store.indices, &self.store.values, self.ndim())?
        });
        log::trace!(
            "eliminate_zeros: {} -> {} entries",
            self.nnz(),
            values.len()
        );
        Ok(Self::from_store(CoordinateStore::from_validated(
            indices,
            values,
            self.store.shape.clone(),
            self.store.sorted,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_sort_indices() {
        let device = CpuDevice::new();
        let t = SparseTensor::<CpuRuntime>::new(
            &[[1usize, 1], [0, 2], [1, 0]],
            &[1.0f32, 2.0, 3.0],
            &[2, 3],
            &device,
        )
        .unwrap();
        assert!(!t.is_sorted());

        let s = t.sort_indices().unwrap();
        assert!(s.is_sorted());
        assert_eq!(
            s.coordinates().unwrap(),
            vec![vec![0, 2], vec![1, 0], vec![1, 1]]
        );
        assert_eq!(s.values_vec::<f32>().unwrap(), vec![2.0, 3.0, 1.0]);
        assert_eq!(
            s.to_dense().unwrap().to_vec::<f32>().unwrap(),
            t.to_dense().unwrap().to_vec::<f32>().unwrap()
        );

        let again = s.sort_indices().unwrap();
        assert!(again.values().shares_buffer(s.values()));
    }

    #[test]
    fn test_eliminate_zeros() {
        let device = CpuDevice::new();
        let t = SparseTensor::<CpuRuntime>::new(
            &[[0usize], [1], [2]],
            &[4i32, 0, -1],
            &[3],
            &device,
        )
        .unwrap();
        assert_eq!(t.nnz(), 3);

        let e = t.eliminate_zeros().unwrap();
        assert_eq!(e.nnz(), 2);
        assert_eq!(e.coordinates().unwrap(), vec![vec![0], vec![2]]);
        assert!(e.is_sorted());

        let mapped = e.apply_unchecked(|x: i32| if x < 0 { 0 } else { x }).unwrap();
        assert_eq!(mapped.eliminate_zeros().unwrap().nnz(), 1);
    }
}
