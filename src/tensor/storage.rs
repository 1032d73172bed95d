//! Storage: device memory management with Arc-based sharing

use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::sync::Arc;

/// Storage for tensor data on a device
///
/// Storage wraps device memory with reference counting, so a reshaped sparse
/// tensor can hold the same value buffer as its source. Storage is never
/// written after construction; every transform that changes data allocates
/// a new buffer.
///
/// Memory is automatically deallocated when the last reference is dropped.
pub struct Storage<R: Runtime> {
    inner: Arc<StorageInner<R>>,
}

struct StorageInner<R: Runtime> {
    /// Raw device handle (GPU address or CPU ptr cast to u64)
    ptr: u64,
    /// Number of elements (not bytes)
    len: usize,
    /// Element type
    dtype: DType,
    /// Device where memory is allocated
    device: R::Device,
}

fn byte_size(len: usize, dtype: DType) -> Result<usize> {
    len.checked_mul(dtype.size_in_bytes())
        .ok_or(Error::OutOfMemory { size: usize::MAX })
}

impl<R: Runtime> Storage<R> {
    fn wrap(ptr: u64, len: usize, dtype: DType, device: &R::Device) -> Self {
        Self {
            inner: Arc::new(StorageInner {
                ptr,
                len,
                dtype,
                device: device.clone(),
            }),
        }
    }

    /// Create storage of `len` default values (all-zero bytes)
    pub fn zeroed(len: usize, dtype: DType, device: &R::Device) -> Result<Self> {
        let size_bytes = byte_size(len, dtype)?;
        let ptr = R::allocate_zeroed(size_bytes, device)?;
        Ok(Self::wrap(ptr, len, dtype, device))
    }

    /// Create storage from existing data with inferred dtype
    ///
    /// Copies `data` to the device. The dtype is inferred from the Element type.
    pub fn from_slice<T: Element>(data: &[T], device: &R::Device) -> Result<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        Self::upload(bytes, data.len(), T::DTYPE, device)
    }

    /// Create storage from raw bytes with explicit dtype
    ///
    /// `data.len()` must be a multiple of the dtype size, and the bytes must be
    /// valid values of `dtype` (only `Bool` has invalid patterns).
    pub fn from_bytes(data: &[u8], dtype: DType, device: &R::Device) -> Result<Self> {
        let elem = dtype.size_in_bytes();
        if data.len() % elem != 0 {
            return Err(Error::Internal(format!(
                "{} bytes is not a whole number of {} elements",
                data.len(),
                dtype
            )));
        }
        if dtype == DType::Bool && data.iter().any(|&b| b > 1) {
            return Err(Error::Internal("invalid bool bit pattern".to_string()));
        }
        Self::upload(data, data.len() / elem, dtype, device)
    }

    fn upload(bytes: &[u8], len: usize, dtype: DType, device: &R::Device) -> Result<Self> {
        let ptr = R::allocate(bytes.len(), device)?;
        if let Err(e) = R::copy_to_device(bytes, ptr, device) {
            R::deallocate(ptr, bytes.len(), device);
            return Err(e);
        }
        Ok(Self::wrap(ptr, len, dtype, device))
    }

    /// Get the raw device handle
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.inner.ptr
    }

    /// Get the number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len
    }

    /// Check if storage is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    /// Get the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.inner.dtype
    }

    /// Get the device
    #[inline]
    pub fn device(&self) -> &R::Device {
        &self.inner.device
    }

    /// Get size in bytes
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.inner.len * self.inner.dtype.size_in_bytes()
    }

    /// Get the reference count
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Check if this is the only reference
    #[inline]
    pub fn is_unique(&self) -> bool {
        Arc::strong_count(&self.inner) == 1
    }

    /// Check whether two handles refer to the same buffer
    #[inline]
    pub fn shares_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copy the raw bytes from device to host
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let size = self.size_in_bytes();
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory { size })?;
        bytes.resize(size, 0u8);
        R::copy_from_device(self.inner.ptr, &mut bytes, &self.inner.device)?;
        Ok(bytes)
    }

    /// Copy data from device to host
    ///
    /// Fails with `DTypeMismatch` if `T` is not the storage dtype.
    pub fn to_vec<T: Element>(&self) -> Result<Vec<T>> {
        if T::DTYPE != self.inner.dtype {
            return Err(Error::dtype_mismatch(self.inner.dtype, T::DTYPE));
        }
        let bytes = self.to_bytes()?;
        // Byte buffers carry no alignment guarantee for T, and bool has
        // invalid bit patterns, so read element by element.
        bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(|chunk| {
                bytemuck::checked::try_pod_read_unaligned::<T>(chunk)
                    .map_err(|e| Error::Internal(format!("corrupt {} element: {e}", T::DTYPE)))
            })
            .collect()
    }

    /// Copy this buffer to another runtime, through host memory
    pub fn to_device<R2: Runtime>(&self, device: &R2::Device) -> Result<Storage<R2>> {
        let bytes = self.to_bytes()?;
        log::debug!(
            "moving {} bytes from {} to {}",
            bytes.len(),
            R::name(),
            R2::name()
        );
        Storage::<R2>::upload(&bytes, self.inner.len, self.inner.dtype, device)
    }
}

impl<R: Runtime> Clone for Storage<R> {
    /// Clone increments the reference count (zero-copy)
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Runtime> Drop for StorageInner<R> {
    fn drop(&mut self) {
        if self.ptr != 0 {
            R::deallocate(
                self.ptr,
                self.len * self.dtype.size_in_bytes(),
                &self.device,
            );
        }
    }
}

impl<R: Runtime> std::fmt::Debug for Storage<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("runtime", &R::name())
            .field("ptr", &format!("0x{:x}", self.inner.ptr))
            .field("len", &self.inner.len)
            .field("dtype", &self.inner.dtype)
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::f16;
    use crate::runtime::cpu::{CpuDevice, CpuRuntime};

    #[test]
    fn test_from_slice_roundtrip() {
        let device = CpuDevice::new();
        let storage = Storage::<CpuRuntime>::from_slice(&[1.5f64, -2.0, 0.0], &device).unwrap();
        assert_eq!(storage.len(), 3);
        assert_eq!(storage.dtype(), DType::F64);
        assert_eq!(storage.size_in_bytes(), 24);
        assert_eq!(storage.to_vec::<f64>().unwrap(), vec![1.5, -2.0, 0.0]);
    }

    #[test]
    fn test_bool_and_half() {
        let device = CpuDevice::new();
        let b = Storage::<CpuRuntime>::from_slice(&[true, false, true], &device).unwrap();
        assert_eq!(b.to_vec::<bool>().unwrap(), vec![true, false, true]);

        let h = Storage::<CpuRuntime>::from_slice(&[f16::from_f32(-1.25)], &device).unwrap();
        assert_eq!(h.to_vec::<f16>().unwrap()[0].to_f32(), -1.25);
    }

    #[test]
    fn test_to_vec_wrong_type() {
        let device = CpuDevice::new();
        let storage = Storage::<CpuRuntime>::from_slice(&[1i32, 2], &device).unwrap();
        assert!(matches!(
            storage.to_vec::<i64>(),
            Err(Error::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_zeroed_and_empty() {
        let device = CpuDevice::new();
        let z = Storage::<CpuRuntime>::zeroed(4, DType::I16, &device).unwrap();
        assert_eq!(z.to_vec::<i16>().unwrap(), vec![0; 4]);

        let e = Storage::<CpuRuntime>::from_slice::<u8>(&[], &device).unwrap();
        assert!(e.is_empty());
        assert!(e.to_vec::<u8>().unwrap().is_empty());
    }

    #[test]
    fn test_clone_shares_buffer() {
        let device = CpuDevice::new();
        let a = Storage::<CpuRuntime>::from_slice(&[7u8, 8], &device).unwrap();
        let b = a.clone();
        assert!(a.shares_buffer(&b));
        assert_eq!(a.ptr(), b.ptr());
        assert_eq!(a.ref_count(), 2);
        drop(b);
        assert!(a.is_unique());
    }

    #[test]
    fn test_from_bytes_validation() {
        let device = CpuDevice::new();
        assert!(Storage::<CpuRuntime>::from_bytes(&[0, 1, 2], DType::I16, &device).is_err());
        assert!(Storage::<CpuRuntime>::from_bytes(&[0, 2], DType::Bool, &device).is_err());
        let ok = Storage::<CpuRuntime>::from_bytes(&[1, 0], DType::Bool, &device).unwrap();
        assert_eq!(ok.to_vec::<bool>().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_oversized_request() {
        let device = CpuDevice::new();
        let err = Storage::<CpuRuntime>::zeroed(usize::MAX / 2, DType::F64, &device).unwrap_err();
        assert!(matches!(err, Error::OutOfMemory { .. }));
    }
}
