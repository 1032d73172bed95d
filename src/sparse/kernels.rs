//! Host-side sparse kernels over plain slices
//!
//! These are the algorithms behind [`SparseKernels`](super::SparseKernels).
//! The CPU runtime runs them directly on its buffers; other runtimes stage
//! their buffers through host memory and run the same code, so results are
//! bit-identical across backends.
//!
//! Index arrays are flat `i64` slices holding `nnz * rank` components, entry
//! `k` at `[k * rank, (k + 1) * rank)`. Every function except
//! [`check_indices`] assumes the indices were already validated against
//! `shape`.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{ravel, strides_for, unravel_into};
use std::collections::HashMap;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Entry count from which CPU kernels split work across rayon workers
pub const PARALLEL_THRESHOLD: usize = 1 << 15;

#[cfg(feature = "rayon")]
#[inline]
fn parallel(n: usize) -> bool {
    n >= PARALLEL_THRESHOLD
}

#[inline]
fn to_usize(x: i64) -> usize {
    debug_assert!(x >= 0, "index must be validated before use");
    x as usize
}

#[inline]
fn to_i64(x: usize) -> i64 {
    debug_assert!(i64::try_from(x).is_ok(), "index must fit in i64");
    x as i64
}

#[inline]
fn entry(indices: &[i64], k: usize, rank: usize) -> &[i64] {
    &indices[k * rank..(k + 1) * rank]
}

fn coordinate(indices: &[i64], k: usize, rank: usize) -> Vec<usize> {
    entry(indices, k, rank).iter().map(|&c| to_usize(c)).collect()
}

/// Linear index of one validated entry
#[inline]
fn linear_of(indices: &[i64], k: usize, rank: usize, strides: &[usize]) -> usize {
    entry(indices, k, rank)
        .iter()
        .zip(strides.iter())
        .map(|(&c, &s)| to_usize(c) * s)
        .sum()
}

/// Check bounds and uniqueness of `nnz` coordinates under `shape`
///
/// Reports the first offending entry in storage order. On success, returns
/// whether the entries are already in row-major order.
pub(crate) fn check_indices(indices: &[i64], nnz: usize, shape: &[usize]) -> Result<bool> {
    let rank = shape.len();
    debug_assert_eq!(indices.len(), nnz * rank);

    for k in 0..nnz {
        for (dim, (&c, &size)) in entry(indices, k, rank).iter().zip(shape.iter()).enumerate() {
            if c < 0 || to_usize(c) >= size {
                return Err(Error::IndexOutOfBounds {
                    entry: k,
                    dim,
                    index: c,
                    size,
                });
            }
        }
    }

    let keys = linear_keys(indices, nnz, shape);
    if is_strictly_increasing(&keys) {
        return Ok(true);
    }

    let mut seen: HashMap<usize, usize> = HashMap::with_capacity(nnz);
    for (k, &key) in keys.iter().enumerate() {
        if let Some(&first) = seen.get(&key) {
            return Err(Error::DuplicateCoordinate {
                coordinate: coordinate(indices, k, rank),
                first,
                second: k,
            });
        }
        seen.insert(key, k);
    }
    Ok(false)
}

/// Row-major linear index of every entry
pub(crate) fn linear_keys(indices: &[i64], nnz: usize, shape: &[usize]) -> Vec<usize> {
    let rank = shape.len();
    let strides = strides_for(shape);

    #[cfg(feature = "rayon")]
    if parallel(nnz) {
        return (0..nnz)
            .into_par_iter()
            .map(|k| linear_of(indices, k, rank, &strides))
            .collect();
    }

    (0..nnz)
        .map(|k| linear_of(indices, k, rank, &strides))
        .collect()
}

#[inline]
pub(crate) fn is_strictly_increasing(keys: &[usize]) -> bool {
    keys.windows(2).all(|w| w[0] < w[1])
}

/// Re-express every coordinate of a `from`-shaped tensor in the `to` shape
///
/// Each coordinate is raveled with the old strides and unraveled into the new
/// shape. Entry order is preserved. `out` must hold `nnz * to.len()` slots.
pub(crate) fn remap_indices(src: &[i64], nnz: usize, from: &[usize], to: &[usize], out: &mut [i64]) {
    let rank_from = from.len();
    let rank_to = to.len();
    debug_assert_eq!(src.len(), nnz * rank_from);
    debug_assert_eq!(out.len(), nnz * rank_to);

    if rank_to == 0 || nnz == 0 {
        return;
    }

    let from_strides = strides_for(from);
    let to_strides = strides_for(to);

    let remap_one = |k: usize, dst: &mut [i64]| {
        let linear = linear_of(src, k, rank_from, &from_strides);
        let mut coord = [0usize; 8];
        if rank_to <= coord.len() {
            let coord = &mut coord[..rank_to];
            unravel_into(linear, to, &to_strides, coord);
            for (d, &c) in dst.iter_mut().zip(coord.iter()) {
                *d = to_i64(c);
            }
        } else {
            let mut coord = vec![0usize; rank_to];
            unravel_into(linear, to, &to_strides, &mut coord);
            for (d, &c) in dst.iter_mut().zip(coord.iter()) {
                *d = to_i64(c);
            }
        }
    };

    #[cfg(feature = "rayon")]
    if parallel(nnz) {
        out.par_chunks_mut(rank_to)
            .enumerate()
            .for_each(|(k, dst)| remap_one(k, dst));
        return;
    }

    for (k, dst) in out.chunks_mut(rank_to).enumerate() {
        remap_one(k, dst);
    }
}

/// `out[i] = f(src[i])`
pub(crate) fn map_values<T, F>(src: &[T], out: &mut [T], f: &F)
where
    T: Element,
    F: Fn(T) -> T + Send + Sync,
{
    debug_assert_eq!(src.len(), out.len());

    #[cfg(feature = "rayon")]
    if parallel(src.len()) {
        out.par_iter_mut()
            .zip(src.par_iter())
            .for_each(|(o, &v)| *o = f(v));
        return;
    }

    for (o, &v) in out.iter_mut().zip(src.iter()) {
        *o = f(v);
    }
}

/// Collect the non-default elements of a dense row-major buffer
///
/// Returns flat indices and values in row-major (sorted) order.
pub(crate) fn gather_nonzero<T: Element>(dense: &[T], shape: &[usize]) -> (Vec<i64>, Vec<T>) {
    let rank = shape.len();
    let strides = strides_for(shape);
    let mut indices = Vec::new();
    let mut values = Vec::new();
    let mut coord = vec![0usize; rank];

    for (linear, &v) in dense.iter().enumerate() {
        if v.is_zero() {
            continue;
        }
        unravel_into(linear, shape, &strides, &mut coord);
        indices.extend(coord.iter().map(|&c| to_i64(c)));
        values.push(v);
    }
    (indices, values)
}

/// Write every entry into a default-filled dense buffer
pub(crate) fn scatter<T: Element>(indices: &[i64], values: &[T], shape: &[usize], out: &mut [T]) {
    let rank = shape.len();
    let strides = strides_for(shape);
    for (k, &v) in values.iter().enumerate() {
        out[linear_of(indices, k, rank, &strides)] = v;
    }
}

/// Element count of a dense buffer of `shape`
///
/// An overflowing count can never be allocated, so it reports `OutOfMemory`.
pub(crate) fn dense_len(shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or(Error::OutOfMemory { size: usize::MAX })
}

/// Permutation that orders entries by linear index
pub(crate) fn sort_permutation(keys: &[usize]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..keys.len()).collect();

    #[cfg(feature = "rayon")]
    if parallel(keys.len()) {
        perm.par_sort_unstable_by_key(|&i| keys[i]);
        return perm;
    }

    perm.sort_unstable_by_key(|&i| keys[i]);
    perm
}

/// Gather entries in the order given by `perm`
pub(crate) fn permute_entries<T: Element>(
    indices: &[i64],
    values: &[T],
    rank: usize,
    perm: &[usize],
) -> (Vec<i64>, Vec<T>) {
    let mut out_indices = Vec::with_capacity(indices.len());
    let mut out_values = Vec::with_capacity(values.len());
    for &k in perm {
        out_indices.extend_from_slice(entry(indices, k, rank));
        out_values.push(values[k]);
    }
    (out_indices, out_values)
}

/// Keep only entries whose value is not the default
pub(crate) fn drop_zeros<T: Element>(
    indices: &[i64],
    values: &[T],
    rank: usize,
) -> (Vec<i64>, Vec<T>) {
    let mut out_indices = Vec::with_capacity(indices.len());
    let mut out_values = Vec::with_capacity(values.len());
    for (k, &v) in values.iter().enumerate() {
        if !v.is_zero() {
            out_indices.extend_from_slice(entry(indices, k, rank));
            out_values.push(v);
        }
    }
    (out_indices, out_values)
}

/// Ravel a host coordinate for construction, checking rank and bounds
pub(crate) fn checked_linear(
    coord: &[usize],
    k: usize,
    shape: &[usize],
    strides: &[usize],
) -> Result<usize> {
    if coord.len() != shape.len() {
        return Err(Error::RankMismatch {
            entry: k,
            expected: shape.len(),
            got: coord.len(),
        });
    }
    for (dim, (&c, &size)) in coord.iter().zip(shape.iter()).enumerate() {
        if c >= size {
            return Err(Error::IndexOutOfBounds {
                entry: k,
                dim,
                index: i64::try_from(c).unwrap_or(i64::MAX),
                size,
            });
        }
    }
    Ok(ravel(coord, strides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_indices_bounds() {
        let err = check_indices(&[0, 1, 2, 0], 2, &[2, 2]).unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfBounds {
                entry: 1,
                dim: 0,
                index: 2,
                size: 2
            }
        );
        let err = check_indices(&[-1], 1, &[4]).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: -1, .. }));
    }

    #[test]
    fn test_check_indices_duplicates() {
        let err = check_indices(&[1, 1, 0, 0, 1, 1], 3, &[2, 2]).unwrap_err();
        assert_eq!(
            err,
            Error::DuplicateCoordinate {
                coordinate: vec![1, 1],
                first: 0,
                second: 2
            }
        );
        assert!(!check_indices(&[1, 0, 0, 1], 2, &[2, 2]).unwrap());
        assert!(check_indices(&[0, 1, 1, 0], 2, &[2, 2]).unwrap());
    }

    #[test]
    fn test_check_indices_scalar() {
        assert!(check_indices(&[], 1, &[]).unwrap());
        assert!(check_indices(&[], 0, &[]).unwrap());
    }

    #[test]
    fn test_remap_bool_scenario() {
        // (3, 7) in a 10x10 grid is linear 37
        let mut flat = [0i64; 1];
        remap_indices(&[3, 7], 1, &[10, 10], &[100], &mut flat);
        assert_eq!(flat, [37]);

        let mut grid = [0i64; 2];
        remap_indices(&flat, 1, &[100], &[2, 50], &mut grid);
        assert_eq!(grid, [0, 37]);
    }

    #[test]
    fn test_remap_from_and_to_scalar() {
        let mut out = [9i64; 3];
        remap_indices(&[], 1, &[], &[1, 1, 1], &mut out);
        assert_eq!(out, [0, 0, 0]);

        let mut none: [i64; 0] = [];
        remap_indices(&[0, 0], 1, &[1, 1], &[], &mut none);
    }

    #[test]
    fn test_remap_high_rank() {
        let to = [1usize; 10];
        let mut out = vec![7i64; 10];
        remap_indices(&[0], 1, &[1], &to, &mut out);
        assert_eq!(out, vec![0; 10]);
    }

    #[test]
    fn test_gather_and_scatter() {
        let dense = [0.0f32, 1.5, -0.0, 0.0, f32::NAN, 2.0];
        let (indices, values) = gather_nonzero(&dense, &[2, 3]);
        assert_eq!(indices, vec![0, 1, 1, 1, 1, 2]);
        assert_eq!(values.len(), 3);
        assert!(values[1].is_nan());

        let mut out = [0.0f32; 6];
        scatter(&indices, &values, &[2, 3], &mut out);
        assert_eq!(out[1], 1.5);
        assert!(out[4].is_nan());
        assert_eq!(out[5], 2.0);
    }

    #[test]
    fn test_sort_and_drop() {
        let indices = [1i64, 1, 0, 2, 0, 0];
        let values = [3i32, 0, 5];
        let keys = linear_keys(&indices, 3, &[2, 3]);
        assert_eq!(keys, vec![4, 2, 0]);
        assert!(!is_strictly_increasing(&keys));

        let perm = sort_permutation(&keys);
        let (si, sv) = permute_entries(&indices, &values, 2, &perm);
        assert_eq!(si, vec![0, 0, 0, 2, 1, 1]);
        assert_eq!(sv, vec![5, 0, 3]);

        let (di, dv) = drop_zeros(&si, &sv, 2);
        assert_eq!(di, vec![0, 0, 1, 1]);
        assert_eq!(dv, vec![5, 3]);
    }

    #[test]
    fn test_map_values_parallel_matches_sequential() {
        let src: Vec<i64> = (0..(PARALLEL_THRESHOLD as i64 + 17)).map(|x| x - 100).collect();
        let mut out = vec![0i64; src.len()];
        map_values(&src, &mut out, &|x: i64| x * 2);
        assert!(out.iter().zip(src.iter()).all(|(&o, &s)| o == s * 2));
    }

    #[test]
    fn test_checked_linear() {
        let shape = [3, 4];
        let strides = strides_for(&shape);
        assert_eq!(checked_linear(&[2, 1], 0, &shape, &strides).unwrap(), 9);
        assert!(matches!(
            checked_linear(&[2], 5, &shape, &strides),
            Err(Error::RankMismatch { entry: 5, .. })
        ));
        assert!(matches!(
            checked_linear(&[0, 4], 1, &shape, &strides),
            Err(Error::IndexOutOfBounds { dim: 1, .. })
        ));
    }
}
