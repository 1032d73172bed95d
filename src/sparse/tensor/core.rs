//! Core SparseTensor implementation: struct, creation, queries

use crate::dtype::{DType, Element};
use crate::error::Result;
use crate::runtime::{Residency, Runtime};
use crate::tensor::Storage;

use super::super::config::BuildOptions;
use super::super::format::SparseStorage;
use super::super::ops::SparseKernels;
use super::super::store::CoordinateStore;

/// N-dimensional sparse tensor in dictionary-of-keys form
///
/// Only non-default elements are stored, as (coordinate, value) entries in a
/// [`CoordinateStore`]. Every operation returns a new tensor and leaves its
/// input untouched; shape transforms share the value buffer with their input.
///
/// # Example
///
/// ```
/// use dokr::prelude::*;
///
/// let device = CpuDevice::new();
/// let grid = SparseTensor::<CpuRuntime>::new(&[[3usize, 7]], &[true], &[10, 10], &device)?;
///
/// let flat = grid.flatten()?;
/// assert_eq!(flat.coordinates()?, vec![vec![37]]);
///
/// let folded = flat.reshape(&[2, 50])?;
/// assert_eq!(folded.coordinates()?, vec![vec![0, 37]]);
/// # Ok::<(), dokr::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct SparseTensor<R: Runtime> {
    pub(crate) store: CoordinateStore<R>,
}

impl<R: Runtime> SparseTensor<R> {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Wrap a coordinate store
    pub fn from_store(store: CoordinateStore<R>) -> Self {
        Self { store }
    }

    /// Create a sparse tensor from host coordinates and values
    ///
    /// Duplicate coordinates are rejected and explicit default values are kept.
    /// Use [`Self::new_with`] for other policies.
    ///
    /// # Errors
    ///
    /// - `LengthMismatch` if `coordinates` and `values` differ in length
    /// - `RankMismatch` if a coordinate does not have `shape.len()` components
    /// - `IndexOutOfBounds` if a component is outside its dimension
    /// - `DuplicateCoordinate` if a coordinate repeats
    pub fn new<T, C>(
        coordinates: &[C],
        values: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self>
    where
        T: Element,
        C: AsRef<[usize]>,
    {
        Self::new_with(coordinates, values, shape, &BuildOptions::default(), device)
    }

    /// Create a sparse tensor from host coordinates and values with explicit
    /// duplicate and zero policies
    pub fn new_with<T, C>(
        coordinates: &[C],
        values: &[T],
        shape: &[usize],
        options: &BuildOptions,
        device: &R::Device,
    ) -> Result<Self>
    where
        T: Element,
        C: AsRef<[usize]>,
    {
        CoordinateStore::from_host(coordinates, values, shape, options, device).map(Self::from_store)
    }

    /// Create a sparse tensor with no stored entries
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        CoordinateStore::empty(shape, dtype, device).map(Self::from_store)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the underlying coordinate store
    #[inline]
    pub fn store(&self) -> &CoordinateStore<R> {
        &self.store
    }

    /// Returns the dense shape
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.store.shape
    }

    /// Returns the number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.store.rank()
    }

    /// Returns the element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.store.values.dtype()
    }

    /// Returns the number of stored entries
    #[inline]
    pub fn nnz(&self) -> usize {
        self.store.len()
    }

    /// Returns the element count of the dense equivalent
    #[inline]
    pub fn numel(&self) -> usize {
        self.store.shape.numel()
    }

    /// Returns the device holding the buffers
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.store.device()
    }

    /// Returns where the buffers live
    #[inline]
    pub fn residency(&self) -> Residency {
        R::RESIDENCY
    }

    /// Returns the index buffer (`I64`, `nnz * ndim` components)
    #[inline]
    pub fn indices(&self) -> &Storage<R> {
        &self.store.indices
    }

    /// Returns the value buffer (`nnz` elements)
    #[inline]
    pub fn values(&self) -> &Storage<R> {
        &self.store.values
    }

    /// Returns whether entries are in row-major order
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.store.sorted
    }

    // =========================================================================
    // Host copies
    // =========================================================================

    /// Copy the coordinates of every entry to host, in storage order
    pub fn coordinates(&self) -> Result<Vec<Vec<usize>>> {
        let rank = self.ndim();
        if rank == 0 {
            return Ok(vec![Vec::new(); self.nnz()]);
        }
        let flat = self.store.indices.to_vec::<i64>()?;
        Ok(flat
            .chunks_exact(rank)
            .map(|c| c.iter().map(|&i| i as usize).collect())
            .collect())
    }

    /// Copy the values to host, in storage order
    ///
    /// Fails with `DTypeMismatch` if `T` is not the tensor dtype.
    pub fn values_vec<T: Element>(&self) -> Result<Vec<T>> {
        self.store.values.to_vec()
    }

    /// Copy every `(coordinate, value)` entry to host, in storage order
    pub fn entries<T: Element>(&self) -> Result<Vec<(Vec<usize>, T)>> {
        let values = self.values_vec::<T>()?;
        Ok(self.coordinates()?.into_iter().zip(values).collect())
    }

    // =========================================================================
    // Residency
    // =========================================================================

    /// Copy this tensor to another runtime
    ///
    /// This is the only operation that moves data between runtimes; it goes
    /// through host memory.
    pub fn to_device<R2: Runtime>(&self, device: &R2::Device) -> Result<SparseTensor<R2>> {
        log::debug!(
            "moving sparse tensor {:?} (nnz={}) from {} to {}",
            self.shape(),
            self.nnz(),
            R::name(),
            R2::name()
        );
        Ok(SparseTensor::from_store(CoordinateStore::from_validated(
            self.store.indices.to_device::<R2>(device)?,
            self.store.values.to_device::<R2>(device)?,
            self.store.shape.clone(),
            self.store.sorted,
        )))
    }
}

impl<R: SparseKernels> SparseTensor<R> {
    /// Create a sparse tensor from device-resident index and value buffers
    ///
    /// `indices` is a flat `I64` buffer of `values.len() * shape.len()`
    /// components. Bounds and uniqueness are validated on the device's runtime;
    /// duplicates are always an error here.
    pub fn from_parts(indices: Storage<R>, values: Storage<R>, shape: &[usize]) -> Result<Self> {
        CoordinateStore::new(indices, values, shape).map(Self::from_store)
    }
}

impl<R: Runtime> SparseStorage for SparseTensor<R> {
    fn shape(&self) -> &[usize] {
        SparseTensor::shape(self)
    }

    fn nnz(&self) -> usize {
        SparseTensor::nnz(self)
    }

    fn dtype(&self) -> DType {
        SparseTensor::dtype(self)
    }

    fn memory_usage(&self) -> usize {
        self.store.memory_usage()
    }
}

impl<R: Runtime> std::fmt::Display for SparseTensor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SparseTensor({:?}, nnz={}, dtype={}, runtime={}, sparsity={:.1}%)",
            self.shape(),
            self.nnz(),
            self.dtype(),
            R::name(),
            self.sparsity() * 100.0
        )
    }
}
