//! Row-major strides and coordinate arithmetic
//!
//! Strides are in ELEMENTS, not bytes. For a shape `[d0, d1, ..., dn]` the stride
//! of dimension `i` is `d(i+1) * ... * dn`; the last dimension has stride 1.
//!
//! ```
//! use dokr::tensor::{ravel, strides_for, unravel};
//!
//! let strides = strides_for(&[2, 3, 4]);
//! assert_eq!(strides.as_slice(), &[12, 4, 1]);
//! assert_eq!(ravel(&[1, 2, 3], &strides), 23);
//! assert_eq!(unravel(23, &[2, 3, 4]).as_slice(), &[1, 2, 3]);
//! ```

use super::shape::{STACK_DIMS, Shape};
use smallvec::SmallVec;
use std::fmt;
use std::ops::Deref;

/// Contiguous row-major strides for a shape
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Strides(SmallVec<[usize; STACK_DIMS]>);

impl Strides {
    /// Compute contiguous (C-order) strides for `shape`
    ///
    /// A rank-0 shape yields empty strides. A zero-sized dimension makes the
    /// strides of all earlier dimensions zero.
    pub fn contiguous(shape: &[usize]) -> Self {
        let mut strides: SmallVec<[usize; STACK_DIMS]> = SmallVec::with_capacity(shape.len());
        let mut stride = 1usize;

        // Compute strides from last dimension to first
        for &dim in shape.iter().rev() {
            strides.push(stride);
            stride = stride.saturating_mul(dim);
        }

        strides.reverse();
        Self(strides)
    }

    /// View strides as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Linear index of `coord`
    #[inline]
    pub fn ravel(&self, coord: &[usize]) -> usize {
        ravel(coord, self)
    }
}

impl Deref for Strides {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Strides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Row-major strides for `shape`
#[inline]
pub fn strides_for(shape: &[usize]) -> Strides {
    Strides::contiguous(shape)
}

/// Linear index of `coord` under `strides`: `sum(coord[i] * strides[i])`
///
/// The caller guarantees `coord` is in bounds, which keeps the result below the
/// element count of the shape the strides were computed from.
#[inline]
pub fn ravel(coord: &[usize], strides: &[usize]) -> usize {
    debug_assert_eq!(coord.len(), strides.len());
    coord
        .iter()
        .zip(strides.iter())
        .map(|(&c, &s)| c * s)
        .sum()
}

/// Inverse of [`ravel`]: write the coordinate of `linear` under `shape` into `out`
///
/// `strides` must be `strides_for(shape)`. Each component is
/// `(linear / strides[i]) % shape[i]`; a zero stride (only possible when the
/// coordinate space is empty) yields 0 instead of dividing by zero.
#[inline]
pub fn unravel_into(linear: usize, shape: &[usize], strides: &[usize], out: &mut [usize]) {
    debug_assert_eq!(shape.len(), strides.len());
    debug_assert_eq!(shape.len(), out.len());
    for ((slot, &dim), &stride) in out.iter_mut().zip(shape.iter()).zip(strides.iter()) {
        *slot = if stride == 0 || dim == 0 {
            0
        } else {
            (linear / stride) % dim
        };
    }
}

/// Inverse of [`ravel`]: coordinate of `linear` under `shape`
pub fn unravel(linear: usize, shape: &[usize]) -> Shape {
    let strides = strides_for(shape);
    let mut coord = vec![0usize; shape.len()];
    unravel_into(linear, shape, &strides, &mut coord);
    Shape::from(coord)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_strides() {
        assert_eq!(strides_for(&[2, 3, 4]).as_slice(), &[12, 4, 1]);
        assert_eq!(strides_for(&[7]).as_slice(), &[1]);
        assert!(strides_for(&[]).is_empty());
        assert_eq!(strides_for(&[3, 0, 2]).as_slice(), &[0, 2, 1]);
    }

    #[test]
    fn test_ravel_unravel_inverse() {
        let shape = [3, 1, 4, 2];
        let strides = strides_for(&shape);
        for linear in 0..24 {
            let coord = unravel(linear, &shape);
            assert!(coord.iter().zip(shape.iter()).all(|(&c, &d)| c < d));
            assert_eq!(ravel(&coord, &strides), linear);
        }
    }

    #[test]
    fn test_unravel_zero_and_unit_dims() {
        assert_eq!(unravel(0, &[1, 5, 1]).as_slice(), &[0, 0, 0]);
        assert_eq!(unravel(4, &[1, 5, 1]).as_slice(), &[0, 4, 0]);
        assert_eq!(unravel(37, &[2, 50]).as_slice(), &[0, 37]);
        assert_eq!(unravel(37, &[100]).as_slice(), &[37]);
    }

    #[test]
    fn test_scalar_shape() {
        let strides = strides_for(&[]);
        assert_eq!(ravel(&[], &strides), 0);
        assert!(unravel(0, &[]).is_empty());
    }

    #[test]
    fn test_method_ravel() {
        let strides = Strides::contiguous(&[10, 10]);
        assert_eq!(strides.ravel(&[3, 7]), 37);
    }
}
