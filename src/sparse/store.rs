//! Coordinate store: validated (indices, values) arrays of a sparse tensor

use super::config::{BuildOptions, DuplicatePolicy, ZeroPolicy};
use super::format::SparseStorage;
use super::kernels;
use super::ops::SparseKernels;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::{Shape, Storage, strides_for};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

/// Validated coordinate/value arrays plus the dense shape they index
///
/// Indices are a flat `I64` buffer of `nnz * rank` components; entry `k`
/// occupies `[k * rank, (k + 1) * rank)` and pairs with `values[k]`. Every
/// store satisfies:
///
/// - every component lies in `[0, shape[dim])`
/// - no coordinate appears twice
/// - the element count of `shape` fits in `usize`
///
/// Stores are read-only after construction. Cloning shares both buffers.
#[derive(Debug, Clone)]
pub struct CoordinateStore<R: Runtime> {
    pub(crate) indices: Storage<R>,
    pub(crate) values: Storage<R>,
    pub(crate) shape: Shape,
    pub(crate) sorted: bool,
}

impl<R: Runtime> CoordinateStore<R> {
    /// Assemble a store from parts that already satisfy the invariants
    pub(crate) fn from_validated(
        indices: Storage<R>,
        values: Storage<R>,
        shape: Shape,
        sorted: bool,
    ) -> Self {
        debug_assert_eq!(indices.dtype(), DType::I64);
        debug_assert_eq!(indices.len(), values.len() * shape.ndim());
        Self {
            indices,
            values,
            shape,
            sorted,
        }
    }

    /// Create a store with no entries
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let shape = Shape::checked(shape)?;
        Ok(Self {
            indices: Storage::from_slice::<i64>(&[], device)?,
            values: Storage::zeroed(0, dtype, device)?,
            shape,
            sorted: true,
        })
    }

    /// Returns the index buffer (`I64`, `nnz * rank` components)
    #[inline]
    pub fn indices(&self) -> &Storage<R> {
        &self.indices
    }

    /// Returns the value buffer (`nnz` elements)
    #[inline]
    pub fn values(&self) -> &Storage<R> {
        &self.values
    }

    /// Returns the number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the rank of the indexed shape
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.ndim()
    }

    /// Returns the device holding both buffers
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.values.device()
    }

    /// Returns whether entries are in row-major order
    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }
}

impl<R: SparseKernels> CoordinateStore<R> {
    /// Create a store from device-resident arrays
    ///
    /// # Errors
    ///
    /// - `DTypeMismatch` if `indices` is not `I64`
    /// - `LengthMismatch` if `indices.len() != values.len() * rank`, or a
    ///   rank-0 store holds more than one value
    /// - `ShapeOverflow` if the element count of `shape` overflows
    /// - `IndexOutOfBounds` / `DuplicateCoordinate` from index validation
    pub fn new(indices: Storage<R>, values: Storage<R>, shape: &[usize]) -> Result<Self> {
        if indices.dtype() != DType::I64 {
            return Err(Error::dtype_mismatch(DType::I64, indices.dtype()));
        }
        let shape = Shape::checked(shape)?;
        let rank = shape.ndim();
        let nnz = values.len();

        let expected = nnz.checked_mul(rank);
        if expected != Some(indices.len()) || (rank == 0 && nnz > 1) {
            return Err(Error::LengthMismatch {
                coordinates: indices.len(),
                values: nnz,
            });
        }

        let sorted = R::check_indices(&indices, nnz, &shape)?;
        Ok(Self {
            indices,
            values,
            shape,
            sorted,
        })
    }
}

impl<R: Runtime> CoordinateStore<R> {
    /// Build a store from host coordinates and values
    ///
    /// Duplicates and explicit default values are resolved by `options`.
    pub fn from_host<T, C>(
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
        let shape = Shape::checked(shape)?;
        let (indices, vals, sorted) = coalesce(coordinates, values, &shape, options)?;
        log::debug!(
            "built coordinate store: {} of {} entries kept, shape {:?}, dtype {}",
            vals.len(),
            values.len(),
            shape,
            T::DTYPE
        );
        Ok(Self {
            indices: Storage::from_slice(&indices, device)?,
            values: Storage::from_slice(&vals, device)?,
            shape,
            sorted,
        })
    }
}

/// Validate host entries and resolve duplicates and explicit zeros
///
/// Returns flat indices, values and whether the result is in row-major order.
fn coalesce<T, C>(
    coordinates: &[C],
    values: &[T],
    shape: &Shape,
    options: &BuildOptions,
) -> Result<(Vec<i64>, Vec<T>, bool)>
where
    T: Element,
    C: AsRef<[usize]>,
{
    if coordinates.len() != values.len() {
        return Err(Error::LengthMismatch {
            coordinates: coordinates.len(),
            values: values.len(),
        });
    }

    let strides = strides_for(shape);
    let mut slots: HashMap<usize, usize> = HashMap::with_capacity(values.len());
    // (linear index, first input entry, value)
    let mut kept: Vec<(usize, usize, T)> = Vec::with_capacity(values.len());

    for (k, (coord, &value)) in coordinates.iter().zip(values.iter()).enumerate() {
        let linear = kernels::checked_linear(coord.as_ref(), k, shape, &strides)?;

        if options.zero_policy() == ZeroPolicy::Reject && value.is_zero() {
            return Err(Error::ExplicitZero { entry: k });
        }

        match slots.entry(linear) {
            Entry::Vacant(v) => {
                v.insert(kept.len());
                kept.push((linear, k, value));
            }
            Entry::Occupied(o) => {
                let slot = &mut kept[*o.get()];
                match options.duplicate_policy() {
                    DuplicatePolicy::Error => {
                        return Err(duplicate(coord.as_ref(), slot.1, k));
                    }
                    DuplicatePolicy::LastWriteWins => slot.2 = value,
                    DuplicatePolicy::Sum => slot.2 = slot.2.accumulate(value),
                }
            }
        }
    }

    // Zeros still take part in duplicate detection above; they leave here.
    let drop_zero = |v: &T| {
        v.is_zero()
            && (options.zero_policy() == ZeroPolicy::Drop
                || options.duplicate_policy() == DuplicatePolicy::Sum)
    };

    let rank = shape.ndim();
    let mut indices = Vec::with_capacity(kept.len() * rank);
    let mut out = Vec::with_capacity(kept.len());
    let mut coord = vec![0usize; rank];
    let mut sorted = true;
    let mut last: Option<usize> = None;

    for (linear, _, value) in kept {
        if drop_zero(&value) {
            continue;
        }
        if last.is_some_and(|prev| prev >= linear) {
            sorted = false;
        }
        last = Some(linear);
        crate::tensor::unravel_into(linear, shape, &strides, &mut coord);
        // Components are below a dimension, which `Shape::checked` bounds by i64::MAX
        indices.extend(coord.iter().map(|&c| c as i64));
        out.push(value);
    }

    Ok((indices, out, sorted))
}

fn duplicate(coord: &[usize], first: usize, second: usize) -> Error {
    Error::DuplicateCoordinate {
        coordinate: coord.to_vec(),
        first,
        second,
    }
}

impl<R: Runtime> SparseStorage for CoordinateStore<R> {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn nnz(&self) -> usize {
        self.values.len()
    }

    fn dtype(&self) -> DType {
        self.values.dtype()
    }

    fn memory_usage(&self) -> usize {
        self.indices.size_in_bytes() + self.values.size_in_bytes()
    }
}
