//! CPU runtime implementation
//!
//! The CPU runtime keeps buffers in 64-byte aligned host allocations and runs
//! the sparse kernels directly on that memory, so no operation copies data
//! between residencies.

mod device;
mod runtime;
mod sparse;

pub use device::CpuDevice;
pub use runtime::CpuRuntime;
