//! Core trait for backing-store backends

use crate::error::Result;

/// Where a runtime's buffers live
///
/// Residency is a property of the storage type, not of the tensor engine:
/// shape transforms and elementwise maps return storage of the same runtime,
/// so they never move data across this boundary.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Residency {
    /// Ordinary host memory, directly addressable by the CPU
    Host,
    /// Accelerator memory, reachable from the host only through explicit copies
    Accelerator,
}

impl Residency {
    /// Returns true for host-resident buffers
    #[inline]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::Host)
    }
}

/// Core trait for backing-store backends
///
/// `Runtime` abstracts over where tensor buffers are held (host heap, GPU memory,
/// ...). It uses static dispatch via generics for zero-cost abstraction: tensor
/// code is written once against `R: Runtime` and never inspects buffer types
/// at runtime.
///
/// Buffers are addressed by opaque `u64` handles: a host pointer for the CPU
/// runtime, a device address or buffer id elsewhere.
///
/// # Example
///
/// ```
/// use dokr::runtime::{Runtime, cpu::CpuRuntime};
///
/// let device = CpuRuntime::default_device();
/// let ptr = CpuRuntime::allocate(1024, &device)?;
/// // ... use memory ...
/// CpuRuntime::deallocate(ptr, 1024, &device);
/// # Ok::<(), dokr::error::Error>(())
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: super::Device;

    /// Where buffers of this runtime live
    const RESIDENCY: Residency;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate device memory
    ///
    /// Returns a handle (0 for zero-sized requests).
    /// Returns `Err(OutOfMemory)` if allocation fails.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Allocate device memory filled with zero bytes
    ///
    /// Zero bytes are the default value of every dtype. The default
    /// implementation uploads a zeroed host buffer; runtimes with a cheaper
    /// zero-fill should override it.
    fn allocate_zeroed(size_bytes: usize, device: &Self::Device) -> Result<u64> {
        let ptr = Self::allocate(size_bytes, device)?;
        if size_bytes == 0 {
            return Ok(ptr);
        }
        let mut zeros = Vec::new();
        if zeros.try_reserve_exact(size_bytes).is_err() {
            Self::deallocate(ptr, size_bytes, device);
            return Err(crate::error::Error::OutOfMemory { size: size_bytes });
        }
        zeros.resize(size_bytes, 0u8);
        if let Err(e) = Self::copy_to_device(&zeros, ptr, device) {
            Self::deallocate(ptr, size_bytes, device);
            return Err(e);
        }
        Ok(ptr)
    }

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    ///
    /// Returns an error if the transfer fails.
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy data from device to host
    ///
    /// Returns an error if the transfer fails.
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Get the default device
    fn default_device() -> Self::Device;
}
