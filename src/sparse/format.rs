//! Format-agnostic view of sparse storage

use crate::dtype::DType;

/// Trait for sparse storage backends
///
/// Shared read-only queries over anything that stores an N-dimensional array
/// as a list of non-default entries.
pub trait SparseStorage {
    /// Returns the dense shape
    fn shape(&self) -> &[usize];

    /// Returns the number of dimensions
    #[inline]
    fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Returns the number of stored entries
    fn nnz(&self) -> usize;

    /// Returns the data type of values
    fn dtype(&self) -> DType;

    /// Returns the number of elements of the dense equivalent
    #[inline]
    fn numel(&self) -> usize {
        self.shape().iter().product()
    }

    /// Returns the sparsity ratio (fraction of default elements)
    ///
    /// Sparsity = 1.0 - (nnz / total_elements). A zero-element shape stores
    /// nothing and reports 1.0, so its density is 0.0.
    #[inline]
    fn sparsity(&self) -> f64 {
        let total = self.numel() as f64;
        if total == 0.0 {
            1.0
        } else {
            1.0 - (self.nnz() as f64 / total)
        }
    }

    /// Returns the density ratio (fraction of stored elements)
    ///
    /// Density = nnz / total_elements = 1.0 - sparsity
    #[inline]
    fn density(&self) -> f64 {
        1.0 - self.sparsity()
    }

    /// Returns true if nothing is stored
    #[inline]
    fn is_empty(&self) -> bool {
        self.nnz() == 0
    }

    /// Returns the memory usage in bytes of indices plus values
    fn memory_usage(&self) -> usize;
}
