//! Common test utilities
#![allow(dead_code)]

use dokr::error::{Error, Result};
use dokr::runtime::{Device, Residency, Runtime};
use dokr::sparse::SparseKernels;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Install a test logger once per binary (`RUST_LOG=debug` to see staging)
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert two f64 slices are close within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_f64(a: &[f64], b: &[f64], rtol: f64, atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        let tol = atol + rtol * y.abs();
        assert!(
            diff <= tol,
            "{}: element {} differs: {} vs {} (diff={}, tol={})",
            msg,
            i,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Dense f64 data where roughly `zero_fraction` of the elements are 0.0
pub fn random_sparse_f64(len: usize, zero_fraction: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.random_bool(zero_fraction) {
                0.0
            } else {
                rng.random_range(-100.0..100.0)
            }
        })
        .collect()
}

/// Dense i64 data where roughly `zero_fraction` of the elements are 0
pub fn random_sparse_i64(len: usize, zero_fraction: f64, seed: u64) -> Vec<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if rng.random_bool(zero_fraction) {
                0
            } else {
                rng.random_range(-1000..1000)
            }
        })
        .collect()
}

// ============================================================================
// Host-staged accelerator mock
// ============================================================================

/// Buffer registry standing in for accelerator memory
///
/// Handles are opaque ids; the bytes are only reachable through
/// `copy_to_device` / `copy_from_device`, like real device memory.
#[derive(Debug, Default)]
pub struct StagedMemory {
    buffers: Mutex<HashMap<u64, Vec<u8>>>,
    next_handle: AtomicU64,
    uploads: AtomicUsize,
    downloads: AtomicUsize,
}

/// Device of the mock runtime; each test gets its own memory
#[derive(Clone, Debug)]
pub struct StagedDevice {
    id: usize,
    memory: Arc<StagedMemory>,
}

impl StagedDevice {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            memory: Arc::new(StagedMemory::default()),
        }
    }

    /// Number of live buffers
    pub fn live_buffers(&self) -> usize {
        self.memory.buffers.lock().len()
    }

    /// Host-to-device copies so far
    pub fn uploads(&self) -> usize {
        self.memory.uploads.load(Ordering::Relaxed)
    }

    /// Device-to-host copies so far
    pub fn downloads(&self) -> usize {
        self.memory.downloads.load(Ordering::Relaxed)
    }
}

impl Device for StagedDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        format!("staged:{}", self.id)
    }
}

/// Accelerator-resident runtime without native sparse kernels
#[derive(Clone, Debug)]
pub struct StagedRuntime;

impl Runtime for StagedRuntime {
    type Device = StagedDevice;

    const RESIDENCY: Residency = Residency::Accelerator;

    fn name() -> &'static str {
        "staged"
    }

    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(size_bytes)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;
        bytes.resize(size_bytes, 0xA5);

        let handle = device.memory.next_handle.fetch_add(1, Ordering::Relaxed) + 1;
        device.memory.buffers.lock().insert(handle, bytes);
        Ok(handle)
    }

    fn deallocate(ptr: u64, _size_bytes: usize, device: &Self::Device) {
        device.memory.buffers.lock().remove(&ptr);
    }

    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        device.memory.uploads.fetch_add(1, Ordering::Relaxed);
        let mut buffers = device.memory.buffers.lock();
        let buf = buffers
            .get_mut(&dst)
            .ok_or_else(|| Error::Backend(format!("unknown buffer {dst}")))?;
        if buf.len() < src.len() {
            return Err(Error::Backend("upload larger than buffer".to_string()));
        }
        buf[..src.len()].copy_from_slice(src);
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()> {
        if dst.is_empty() {
            return Ok(());
        }
        device.memory.downloads.fetch_add(1, Ordering::Relaxed);
        let buffers = device.memory.buffers.lock();
        let buf = buffers
            .get(&src)
            .ok_or_else(|| Error::Backend(format!("unknown buffer {src}")))?;
        if buf.len() < dst.len() {
            return Err(Error::Backend("download larger than buffer".to_string()));
        }
        dst.copy_from_slice(&buf[..dst.len()]);
        Ok(())
    }

    fn default_device() -> Self::Device {
        StagedDevice::new(0)
    }
}

// No native kernels: every sparse operation uses the host-staged defaults.
impl SparseKernels for StagedRuntime {}
