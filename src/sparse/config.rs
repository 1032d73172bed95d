//! Construction options for coordinate-built sparse tensors

/// What to do when the same coordinate appears more than once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DuplicatePolicy {
    /// Reject the input with `DuplicateCoordinate`
    #[default]
    Error,
    /// Keep the position of the first occurrence and the value of the last
    LastWriteWins,
    /// Accumulate all values at the position of the first occurrence
    ///
    /// Numbers are added (wrapping for integers), bools are OR-ed. Sums equal
    /// to the default value are dropped.
    Sum,
}

/// What to do with explicitly supplied default values (`0`, `0.0`, `false`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZeroPolicy {
    /// Store them as given
    #[default]
    Keep,
    /// Silently leave them out
    Drop,
    /// Reject the input with `ExplicitZero`
    Reject,
}

/// Options for [`SparseTensor::new_with`](super::SparseTensor::new_with)
///
/// ```
/// use dokr::sparse::{BuildOptions, DuplicatePolicy, ZeroPolicy};
///
/// let opts = BuildOptions::new()
///     .duplicates(DuplicatePolicy::Sum)
///     .zeros(ZeroPolicy::Drop);
/// assert_eq!(opts.duplicate_policy(), DuplicatePolicy::Sum);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildOptions {
    duplicates: DuplicatePolicy,
    zeros: ZeroPolicy,
}

impl BuildOptions {
    /// Default options: duplicates are an error, explicit zeros are kept
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate-coordinate policy
    pub fn duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Set the explicit-zero policy
    pub fn zeros(mut self, policy: ZeroPolicy) -> Self {
        self.zeros = policy;
        self
    }

    /// The duplicate-coordinate policy
    #[inline]
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// The explicit-zero policy
    #[inline]
    pub fn zero_policy(&self) -> ZeroPolicy {
        self.zeros
    }
}
