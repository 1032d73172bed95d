//! CPU runtime implementation

use super::device::CpuDevice;
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::runtime::{Residency, Runtime};
use crate::tensor::Storage;
use std::alloc::{Layout as AllocLayout, alloc, alloc_zeroed, dealloc};

/// Alignment of every CPU allocation (AVX-512 width)
const ALIGN: usize = 64;

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl CpuRuntime {
    fn layout(size_bytes: usize) -> Result<AllocLayout> {
        AllocLayout::from_size_align(size_bytes, ALIGN)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })
    }

    fn allocate_with(size_bytes: usize, zeroed: bool) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = Self::layout(size_bytes)?;
        let ptr = unsafe {
            if zeroed {
                alloc_zeroed(layout)
            } else {
                alloc(layout)
            }
        };

        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }
}

impl Runtime for CpuRuntime {
    type Device = CpuDevice;

    const RESIDENCY: Residency = Residency::Host;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        Self::allocate_with(size_bytes, false)
    }

    fn allocate_zeroed(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        Self::allocate_with(size_bytes, true)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        if let Ok(layout) = Self::layout(size_bytes) {
            unsafe {
                dealloc(ptr as *mut u8, layout);
            }
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        if dst == 0 {
            return Err(Error::Backend("copy_to_device: null destination".to_string()));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        if src == 0 {
            return Err(Error::Backend("copy_from_device: null source".to_string()));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }
}

// ============================================================================
// Host views of CPU storage
// ============================================================================

/// Borrow CPU storage as a typed slice without copying
///
/// Fails with `DTypeMismatch` if the storage does not hold `T`.
pub(crate) fn host_slice<T: Element>(storage: &Storage<CpuRuntime>) -> Result<&[T]> {
    if storage.dtype() != T::DTYPE {
        return Err(Error::dtype_mismatch(storage.dtype(), T::DTYPE));
    }
    if storage.is_empty() {
        return Ok(&[]);
    }
    // SAFETY: CPU storage is a live, 64-byte aligned host allocation of `len`
    // elements of `dtype`, and is only ever written with valid `T` values
    // (from_slice, zero-fill, or the kernels below).
    Ok(unsafe { std::slice::from_raw_parts(storage.ptr() as *const T, storage.len()) })
}

/// Borrow freshly allocated CPU storage as a mutable typed slice
///
/// Only used on storage the caller just allocated and has not shared.
pub(crate) fn host_slice_mut<T: Element>(storage: &mut Storage<CpuRuntime>) -> Result<&mut [T]> {
    if storage.dtype() != T::DTYPE {
        return Err(Error::dtype_mismatch(storage.dtype(), T::DTYPE));
    }
    if !storage.is_unique() {
        return Err(Error::Internal(
            "mutable host view requested for shared storage".to_string(),
        ));
    }
    if storage.is_empty() {
        return Ok(&mut []);
    }
    // SAFETY: as for `host_slice`; uniqueness of the Arc guarantees no other
    // view of this allocation exists for the lifetime of the borrow.
    Ok(unsafe { std::slice::from_raw_parts_mut(storage.ptr() as *mut T, storage.len()) })
}
