//! Shape type: dimensions of a tensor

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Deref;

/// Stack allocation threshold for dimensions
/// Most tensors have 4 or fewer dimensions, so we stack-allocate up to 4
pub(crate) const STACK_DIMS: usize = 4;

/// Largest element count a validated shape may have (`i64::MAX`)
pub const MAX_NUMEL: usize = i64::MAX as usize;

/// Shape type: dimensions of a tensor
///
/// A rank-0 (empty) shape describes a scalar with exactly one element.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(SmallVec<[usize; STACK_DIMS]>);

impl Shape {
    /// Create an empty (scalar) shape.
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create a shape after checking that its element count fits the
    /// coordinate range.
    ///
    /// Coordinates and linear positions are stored as `i64`, so neither the
    /// element count nor any single dimension may exceed [`MAX_NUMEL`].
    pub fn checked(dims: &[usize]) -> Result<Self> {
        if dims.iter().any(|&d| d > MAX_NUMEL) {
            return Err(Error::shape_overflow(dims));
        }
        let shape = Self::from(dims);
        match shape.checked_numel() {
            Some(n) if n <= MAX_NUMEL => Ok(shape),
            _ => Err(Error::shape_overflow(dims)),
        }
    }

    /// View shape as a slice.
    pub fn as_slice(&self) -> &[usize] {
        self.0.as_slice()
    }

    /// Number of dimensions in this shape.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.0.len()
    }

    /// Total number of elements, or `None` if the product overflows.
    #[inline]
    pub fn checked_numel(&self) -> Option<usize> {
        self.0.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    /// Total number of elements.
    ///
    /// Shapes held by tensors are validated with [`Shape::checked`], so this
    /// saturates rather than overflowing only for hand-built shapes.
    #[inline]
    pub fn numel(&self) -> usize {
        self.checked_numel().unwrap_or(usize::MAX)
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<[usize]> for Shape {
    fn as_ref(&self) -> &[usize] {
        self.0.as_slice()
    }
}

impl From<Vec<usize>> for Shape {
    fn from(value: Vec<usize>) -> Self {
        Self(value.into_iter().collect())
    }
}

impl From<&[usize]> for Shape {
    fn from(value: &[usize]) -> Self {
        Self(value.iter().copied().collect())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(value: [usize; N]) -> Self {
        Self(value.into_iter().collect())
    }
}

impl FromIterator<usize> for Shape {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
