//! Dense conversion: from_dense, to_dense

use super::SparseTensor;
use crate::dtype::{Element, dispatch_dtype};
use crate::error::Result;
use crate::sparse::SparseKernels;
use crate::sparse::store::CoordinateStore;
use crate::tensor::{Shape, Tensor};

impl<R: SparseKernels> SparseTensor<R> {
    /// Create a sparse tensor from a dense row-major buffer
    ///
    /// Scans the buffer once and keeps every element that differs from the
    /// default value. `-0.0` counts as default; NaN is kept. Shape and dtype
    /// come from the buffer, and entries come out in row-major order.
    pub fn from_dense(dense: &Tensor<R>) -> Result<Self> {
        let shape = Shape::from(dense.shape());
        let (indices, values) = dispatch_dtype!(dense.dtype(), T => {
            R::gather_nonzero::<T>(dense.storage(), &shape)?
        });

        log::debug!(
            "sparsified {:?} {}: {} of {} elements stored",
            shape,
            dense.dtype(),
            values.len(),
            dense.numel()
        );
        Ok(Self::from_store(CoordinateStore::from_validated(
            indices, values, shape, true,
        )))
    }

    /// Create a sparse tensor from a host slice in row-major order
    ///
    /// Fails with `ShapeMismatch` if `data.len()` is not the element count of
    /// `shape`.
    pub fn from_dense_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let dense = Tensor::<R>::from_slice(data, shape, device)?;
        Self::from_dense(&dense)
    }

    /// Materialize the dense equivalent
    ///
    /// Allocates a default-filled buffer of the full shape on the tensor's
    /// device and writes every entry into it.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if the buffer's byte size overflows or the runtime
    /// cannot allocate it.
    pub fn to_dense(&self) -> Result<Tensor<R>> {
        let storage = dispatch_dtype!(self.dtype(), T => {
            R::scatter_to_dense::<T>(&self.store.indices, &self.store.values, self.shape())?
        });
        log::debug!(
            "densified {:?} {} from {} entries",
            self.shape(),
            self.dtype(),
            self.nnz()
        );
        Tensor::from_storage(storage, self.shape())
    }
}
