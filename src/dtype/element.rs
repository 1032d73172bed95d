//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{CheckedBitPattern, NoUninit};
use std::fmt::Debug;

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to dokr's runtime dtype system.
/// It's implemented for every scalar kind in [`DType`].
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `NoUninit` - Safe conversion to bytes for device upload (bytemuck)
/// - `CheckedBitPattern` - Validated conversion back from device bytes;
///   `bool` is not `Pod`, so plain casts are not enough
/// - `PartialEq` - Default-value detection
pub trait Element:
    Copy + Send + Sync + PartialEq + Debug + NoUninit + CheckedBitPattern + 'static
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;

    /// Default value (`0`, `0.0` or `false`), never stored by `from_dense`
    fn zero() -> Self;

    /// Returns true if this value equals the default value
    ///
    /// `-0.0` counts as zero; NaN does not.
    #[inline]
    fn is_zero(self) -> bool {
        self == Self::zero()
    }

    /// Combine two values stored at the same coordinate
    ///
    /// Addition for numbers (wrapping for integers), logical OR for bool.
    fn accumulate(self, other: Self) -> Self;

    /// Absolute value (wrapping for signed integers, identity for unsigned and bool)
    fn abs(self) -> Self;
}

macro_rules! impl_element_signed_int {
    ($($t:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const DTYPE: DType = DType::$dtype;

                #[inline]
                fn zero() -> Self {
                    0
                }

                #[inline]
                fn accumulate(self, other: Self) -> Self {
                    self.wrapping_add(other)
                }

                #[inline]
                fn abs(self) -> Self {
                    self.wrapping_abs()
                }
            }
        )*
    };
}

impl_element_signed_int!(i64 => I64, i32 => I32, i16 => I16, i8 => I8);

impl Element for u8 {
    const DTYPE: DType = DType::U8;

    #[inline]
    fn zero() -> Self {
        0
    }

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    #[inline]
    fn abs(self) -> Self {
        self
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;

    #[inline]
    fn zero() -> Self {
        0.0
    }

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn abs(self) -> Self {
        f32::abs(self)
    }
}

impl Element for half::f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn zero() -> Self {
        half::f16::ZERO
    }

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self + other
    }

    #[inline]
    fn abs(self) -> Self {
        half::f16::from_bits(self.to_bits() & 0x7fff)
    }
}

// bool is stored as a single byte; CheckedBitPattern rejects anything but 0 and 1
// when reading back from device memory.
impl Element for bool {
    const DTYPE: DType = DType::Bool;

    #[inline]
    fn zero() -> Self {
        false
    }

    #[inline]
    fn accumulate(self, other: Self) -> Self {
        self | other
    }

    #[inline]
    fn abs(self) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;

    #[test]
    fn test_element_dtype() {
        assert_eq!(f64::DTYPE, DType::F64);
        assert_eq!(f16::DTYPE, DType::F16);
        assert_eq!(i32::DTYPE, DType::I32);
        assert_eq!(u8::DTYPE, DType::U8);
        assert_eq!(bool::DTYPE, DType::Bool);
    }

    #[test]
    fn test_is_zero() {
        assert!(0i8.is_zero());
        assert!((-0.0f32).is_zero());
        assert!(!f64::NAN.is_zero());
        assert!(f16::NEG_ZERO.is_zero());
        assert!(!true.is_zero());
    }

    #[test]
    fn test_accumulate() {
        assert_eq!(i8::MAX.accumulate(1), i8::MIN);
        assert_eq!(1.5f32.accumulate(-1.5), 0.0);
        assert!(false.accumulate(true));
        assert_eq!(
            f16::from_f32(1.0).accumulate(f16::from_f32(2.0)),
            f16::from_f32(3.0)
        );
    }

    #[test]
    fn test_abs() {
        assert_eq!(Element::abs(-3i32), 3);
        assert_eq!(Element::abs(i64::MIN), i64::MIN);
        assert_eq!(Element::abs(-2.5f64), 2.5);
        assert_eq!(Element::abs(f16::from_f32(-4.0)), f16::from_f32(4.0));
        assert_eq!(Element::abs(200u8), 200);
    }
}
