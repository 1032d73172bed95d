//! Core dense Tensor type

use super::{Shape, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// Contiguous row-major N-dimensional array stored on a compute device
///
/// `Tensor` is the dense side of the sparse/dense bridge. It consists of:
/// - **Storage**: Reference-counted device memory, `numel` elements long
/// - **Shape**: Dimensions; strides are always the row-major defaults
/// - **DType**: Element type (determined at runtime)
///
/// Reshaping shares storage. Nothing mutates a tensor's buffer after
/// construction.
///
/// # Example
///
/// ```
/// use dokr::prelude::*;
///
/// let device = CpuDevice::new();
/// let t = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0, 4.0], &[2, 2], &device)?;
/// let r = t.reshape(&[4])?;
/// assert_eq!(r.to_vec::<f32>()?, vec![1.0, 2.0, 3.0, 4.0]);
/// # Ok::<(), dokr::error::Error>(())
/// ```
pub struct Tensor<R: Runtime> {
    /// Device memory
    storage: Storage<R>,
    /// Dimensions
    shape: Shape,
}

impl<R: Runtime> Tensor<R> {
    /// Create a tensor from storage and shape
    ///
    /// Fails with `ShapeMismatch` if the storage length is not the element
    /// count of `shape`.
    pub fn from_storage(storage: Storage<R>, shape: &[usize]) -> Result<Self> {
        let shape = Shape::checked(shape)?;
        if storage.len() != shape.numel() {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![storage.len()],
            });
        }
        Ok(Self { storage, shape })
    }

    /// Create a tensor from a slice of data
    ///
    /// Returns an error if `data.len()` does not equal the product of the `shape` dimensions,
    /// or if memory allocation fails.
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Result<Self> {
        let shape = Shape::checked(shape)?;
        if data.len() != shape.numel() {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        let storage = Storage::from_slice(data, device)?;
        Ok(Self { storage, shape })
    }

    /// Create a tensor filled with the default value of `dtype`
    ///
    /// Fails with `OutOfMemory` if the buffer size overflows or the
    /// runtime cannot allocate it.
    pub fn zeros(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let shape = Shape::checked(shape).map_err(|_| Error::OutOfMemory { size: usize::MAX })?;
        let storage = Storage::zeroed(shape.numel(), dtype, device)?;
        Ok(Self { storage, shape })
    }

    /// Get the underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Get the shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Get the total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.storage.len()
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Check if this is a scalar (0-dimensional) tensor
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// Reshape to a new shape with the same element count (shares storage)
    pub fn reshape(&self, shape: &[usize]) -> Result<Self> {
        let new_shape = Shape::checked(shape)?;
        if new_shape.numel() != self.numel() {
            return Err(Error::incompatible_shape(&self.shape, shape));
        }
        Ok(Self {
            storage: self.storage.clone(),
            shape: new_shape,
        })
    }

    /// Copy the elements to host in row-major order
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.storage.to_vec()
    }

    /// Extract the single element of a one-element tensor
    pub fn item<T: Element>(&self) -> Result<T> {
        if self.numel() != 1 {
            return Err(Error::ShapeMismatch {
                expected: vec![],
                got: self.shape.to_vec(),
            });
        }
        let mut v = self.to_vec::<T>()?;
        v.pop()
            .ok_or_else(|| Error::Internal("empty single-element buffer".to_string()))
    }

    /// Copy this tensor to another runtime
    pub fn to_device<R2: Runtime>(&self, device: &R2::Device) -> Result<Tensor<R2>> {
        Ok(Tensor {
            storage: self.storage.to_device::<R2>(device)?,
            shape: self.shape.clone(),
        })
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    /// Clone shares the storage (zero-copy)
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("dtype", &self.dtype())
            .field("runtime", &R::name())
            .finish()
    }
}
