//! Shape transforms: flatten and reshape

use super::SparseTensor;
use crate::error::{Error, Result};
use crate::sparse::SparseKernels;
use crate::sparse::store::CoordinateStore;
use crate::tensor::Shape;

impl<R: SparseKernels> SparseTensor<R> {
    /// Reshape to a new shape with the same element count
    ///
    /// Every coordinate is raveled under the old shape and unraveled under the
    /// new one, so the linear position of each entry is unchanged. Entry order,
    /// dtype and nnz are preserved, and the value buffer is shared with `self`.
    ///
    /// # Errors
    ///
    /// - `IncompatibleShape` if the element counts differ
    /// - `ShapeOverflow` if the element count of `shape` overflows
    ///
    /// `self` is unchanged on error.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let to = Shape::checked(shape)?;
        if to.numel() != self.numel() {
            return Err(Error::incompatible_shape(self.shape(), shape));
        }
        if to.as_slice() == self.shape() {
            return Ok(self.clone());
        }

        log::debug!(
            "reshape {:?} -> {:?} ({} entries)",
            self.shape(),
            to,
            self.nnz()
        );
        let indices = R::remap_indices(&self.store.indices, self.nnz(), self.shape(), &to)?;

        // Linear positions are unchanged, so row-major order survives.
        Ok(Self::from_store(CoordinateStore::from_validated(
            indices,
            self.store.values.clone(),
            to,
            self.store.sorted,
        )))
    }

    /// Reshape to rank 1 (`[numel]`)
    ///
    /// Rank-1 tensors are returned as-is, sharing both buffers.
    pub fn flatten(&self) -> Result<Self> {
        if self.ndim() == 1 {
            return Ok(self.clone());
        }
        self.reshape(&[self.numel()])
    }
}
