//! DType dispatch macro
//!
//! Maps a runtime [`DType`](super::DType) to a concrete [`Element`](super::Element)
//! type so generic kernels can be monomorphized from type-erased storage.

/// Dispatch on a runtime dtype, binding `$T` to the matching Rust type
///
/// The macro is an expression: every arm evaluates `$body` with `$T` in scope,
/// so all arms must produce the same type.
///
/// ```ignore
/// let nnz = dispatch_dtype!(dense.dtype(), T => { count_nonzero::<T>(&dense)? });
/// ```
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                type $T = $crate::dtype::f16;
                $body
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                type $T = bool;
                $body
            }
        }
    };
}

pub(crate) use dispatch_dtype;

#[cfg(test)]
mod tests {
    use crate::dtype::{DType, Element};

    fn size_of_dtype(dtype: DType) -> usize {
        dispatch_dtype!(dtype, T => { std::mem::size_of::<T>() })
    }

    #[test]
    fn test_dispatch_binds_matching_type() {
        for dtype in DType::ALL {
            let bound = dispatch_dtype!(dtype, T => { <T as Element>::DTYPE });
            assert_eq!(bound, dtype);
            assert_eq!(size_of_dtype(dtype), dtype.size_in_bytes());
        }
    }
}
