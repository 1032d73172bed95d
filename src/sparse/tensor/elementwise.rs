//! Elementwise transforms over stored values

use super::SparseTensor;
use crate::dtype::{Element, dispatch_dtype};
use crate::error::{Error, Result};
use crate::sparse::SparseKernels;
use crate::sparse::store::CoordinateStore;
use crate::tensor::Tensor;

impl<R: SparseKernels> SparseTensor<R> {
    fn check_dtype<T: Element>(&self) -> Result<()> {
        if T::DTYPE != self.dtype() {
            return Err(Error::dtype_mismatch(self.dtype(), T::DTYPE));
        }
        Ok(())
    }

    /// Apply a zero-preserving function to every stored value
    ///
    /// Coordinates, shape and nnz are unchanged; the index buffer is shared.
    /// `f(default)` is evaluated once first: if it is not the default value the
    /// call fails, because the unstored elements would need to change too.
    ///
    /// # Errors
    ///
    /// - `DTypeMismatch` if `T` is not the tensor dtype
    /// - `NotZeroPreserving` if `f` maps the default value to anything else
    ///
    /// ```
    /// use dokr::prelude::*;
    ///
    /// let device = CpuDevice::new();
    /// let t = SparseTensor::<CpuRuntime>::from_dense_slice(&[0.0f32, 2.0], &[2], &device)?;
    ///
    /// let doubled = t.apply(|x: f32| x * 2.0)?;
    /// assert_eq!(doubled.values_vec::<f32>()?, vec![4.0]);
    ///
    /// assert!(matches!(
    ///     t.apply(|x: f32| x.cos()),
    ///     Err(Error::NotZeroPreserving { .. })
    /// ));
    /// # Ok::<(), dokr::error::Error>(())
    /// ```
    pub fn apply<T, F>(&self, f: F) -> Result<Self>
    where
        T: Element,
        F: Fn(T) -> T + Send + Sync,
    {
        self.check_dtype::<T>()?;
        if !f(T::zero()).is_zero() {
            return Err(Error::NotZeroPreserving { dtype: T::DTYPE });
        }
        self.apply_unchecked(f)
    }

    /// Apply `f` to every stored value without checking zero preservation
    ///
    /// The caller guarantees `f(default) == default`; otherwise the result
    /// silently disagrees with applying `f` to the dense equivalent.
    pub fn apply_unchecked<T, F>(&self, f: F) -> Result<Self>
    where
        T: Element,
        F: Fn(T) -> T + Send + Sync,
    {
        self.check_dtype::<T>()?;
        let values = R::map_values(&self.store.values, f)?;
        Ok(Self::from_store(CoordinateStore::from_validated(
            self.store.indices.clone(),
            values,
            self.store.shape.clone(),
            self.store.sorted,
        )))
    }

    /// Apply any function elementwise by way of the dense form
    ///
    /// Densifies, maps every element (stored or not), and sparsifies the
    /// result. Memory and time scale with the dense element count.
    pub fn map_densified<T, F>(&self, f: F) -> Result<Self>
    where
        T: Element,
        F: Fn(T) -> T + Send + Sync,
    {
        self.check_dtype::<T>()?;
        log::debug!(
            "map_densified over {:?} ({} dense elements)",
            self.shape(),
            self.numel()
        );
        let dense = self.to_dense()?;
        let mapped = R::map_values(dense.storage(), f)?;
        Self::from_dense(&Tensor::from_storage(mapped, self.shape())?)
    }

    /// Absolute value of every stored value
    ///
    /// Signed integers wrap (`abs(MIN) == MIN`), unsigned integers and bools
    /// are unchanged, floats clear the sign bit.
    pub fn abs(&self) -> Result<Self> {
        dispatch_dtype!(self.dtype(), T => {
            self.apply_unchecked::<T, _>(<T as Element>::abs)
        })
    }
}
