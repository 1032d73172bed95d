//! Error types for dokr

use crate::dtype::DType;
use thiserror::Error;

/// Result type alias using dokr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in dokr operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A coordinate component lies outside `[0, shape[dim])`
    #[error("Index {index} out of bounds for dimension {dim} of size {size} (entry {entry})")]
    IndexOutOfBounds {
        /// Position of the offending entry
        entry: usize,
        /// Dimension of the offending component
        dim: usize,
        /// The invalid component
        index: i64,
        /// Size of the dimension
        size: usize,
    },

    /// A coordinate does not have exactly `rank` components
    #[error("Coordinate {entry} has {got} components, expected {expected}")]
    RankMismatch {
        /// Position of the offending entry
        entry: usize,
        /// Rank of the tensor
        expected: usize,
        /// Number of components supplied
        got: usize,
    },

    /// Coordinate and value arrays disagree in length
    #[error("Length mismatch: {coordinates} coordinates vs {values} values")]
    LengthMismatch {
        /// Number of coordinates (or index components for flat index arrays)
        coordinates: usize,
        /// Number of values
        values: usize,
    },

    /// The same coordinate was supplied twice
    #[error("Duplicate coordinate {coordinate:?} at entries {first} and {second}")]
    DuplicateCoordinate {
        /// The repeated coordinate
        coordinate: Vec<usize>,
        /// First entry holding it
        first: usize,
        /// Second entry holding it
        second: usize,
    },

    /// Reshape target has a different element count
    #[error("Cannot reshape {from:?} into {to:?}: element counts differ")]
    IncompatibleShape {
        /// Source shape
        from: Vec<usize>,
        /// Requested shape
        to: Vec<usize>,
    },

    /// The element count of a shape overflows or exceeds `i64::MAX`
    #[error("Element count of shape {shape:?} exceeds the i64 coordinate range")]
    ShapeOverflow {
        /// The offending shape
        shape: Vec<usize>,
    },

    /// Dense buffer length does not match its shape
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape
        expected: Vec<usize>,
        /// Actual shape
        got: Vec<usize>,
    },

    /// DType mismatch between operands
    #[error("DType mismatch: {lhs:?} vs {rhs:?}")]
    DTypeMismatch {
        /// Expected dtype
        lhs: DType,
        /// Actual dtype
        rhs: DType,
    },

    /// An elementwise function maps the default value to something else
    #[error("Function does not preserve the default value of {dtype}")]
    NotZeroPreserving {
        /// Element type the function was applied to
        dtype: DType,
    },

    /// An explicit default value was rejected at construction
    #[error("Entry {entry} stores the default value explicitly")]
    ExplicitZero {
        /// Position of the offending entry
        entry: usize,
    },

    /// Out of memory
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// Backend-specific error (transfer failure, lost device, ...)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an incompatible shape error
    pub fn incompatible_shape(from: &[usize], to: &[usize]) -> Self {
        Self::IncompatibleShape {
            from: from.to_vec(),
            to: to.to_vec(),
        }
    }

    /// Create a shape overflow error
    pub fn shape_overflow(shape: &[usize]) -> Self {
        Self::ShapeOverflow {
            shape: shape.to_vec(),
        }
    }

    /// Create a dtype mismatch error
    pub fn dtype_mismatch(expected: DType, got: DType) -> Self {
        Self::DTypeMismatch {
            lhs: expected,
            rhs: got,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::incompatible_shape(&[2, 3], &[4, 2]);
        assert_eq!(
            err.to_string(),
            "Cannot reshape [2, 3] into [4, 2]: element counts differ"
        );

        let err = Error::IndexOutOfBounds {
            entry: 1,
            dim: 0,
            index: 5,
            size: 3,
        };
        assert!(err.to_string().contains("dimension 0 of size 3"));

        let err = Error::NotZeroPreserving { dtype: DType::F32 };
        assert_eq!(
            err.to_string(),
            "Function does not preserve the default value of f32"
        );
    }
}
