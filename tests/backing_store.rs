//! Sparse tensors on an accelerator-resident runtime without native kernels

mod common;

use common::{StagedDevice, StagedRuntime, init_logger, random_sparse_f64};
use dokr::prelude::*;
use dokr::tensor::Storage;

fn staged_grid(device: &StagedDevice) -> SparseTensor<StagedRuntime> {
    SparseTensor::<StagedRuntime>::new(
        &[[0usize, 3], [2, 1], [1, 0]],
        &[1.5f64, -2.0, 4.0],
        &[3, 4],
        device,
    )
    .unwrap()
}

#[test]
fn test_residency_is_preserved_across_ops() {
    init_logger();
    let device = StagedDevice::new(1);
    let t = staged_grid(&device);
    assert_eq!(t.residency(), Residency::Accelerator);
    assert_eq!(CpuRuntime::RESIDENCY, Residency::Host);

    let flat = t.flatten().unwrap();
    let reshaped = flat.reshape(&[2, 6]).unwrap();
    let negated = reshaped.apply(|x: f64| -x).unwrap();
    let sorted = negated.sort_indices().unwrap();
    let dense = sorted.to_dense().unwrap();

    for out in [&flat, &reshaped, &negated, &sorted] {
        assert_eq!(out.residency(), Residency::Accelerator);
        assert_eq!(out.device().id(), 1);
    }
    assert_eq!(dense.device().name(), "staged:1");
    assert_eq!(
        dense.to_vec::<f64>().unwrap(),
        vec![0.0, 0.0, 0.0, -1.5, -4.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0]
    );
}

#[test]
fn test_reshape_shares_values_on_device() {
    let device = StagedDevice::new(2);
    let t = staged_grid(&device);
    let (uploads, downloads) = (device.uploads(), device.downloads());

    let r = t.reshape(&[6, 2]).unwrap();
    assert!(r.values().shares_buffer(t.values()));
    assert!(!r.indices().shares_buffer(t.indices()));

    // One index download and one index upload; values never move
    assert_eq!(device.downloads(), downloads + 1);
    assert_eq!(device.uploads(), uploads + 1);
}

#[test]
fn test_fallback_matches_cpu() {
    let staged = StagedDevice::new(3);
    let cpu = CpuDevice::new();
    let data = random_sparse_f64(12 * 10, 0.6, 5);

    let on_cpu = SparseTensor::<CpuRuntime>::from_dense_slice(&data, &[12, 10], &cpu).unwrap();
    let on_staged =
        SparseTensor::<StagedRuntime>::from_dense_slice(&data, &[12, 10], &staged).unwrap();
    assert_eq!(on_staged.entries::<f64>().unwrap(), on_cpu.entries::<f64>().unwrap());

    let a = on_cpu.reshape(&[4, 3, 10]).unwrap().abs().unwrap();
    let b = on_staged.reshape(&[4, 3, 10]).unwrap().abs().unwrap();
    assert_eq!(a.coordinates().unwrap(), b.coordinates().unwrap());
    assert_eq!(a.values_vec::<f64>().unwrap(), b.values_vec::<f64>().unwrap());
    assert_eq!(
        a.to_dense().unwrap().to_vec::<f64>().unwrap(),
        b.to_dense().unwrap().to_vec::<f64>().unwrap()
    );
}

#[test]
fn test_canonicalization_on_device() {
    let device = StagedDevice::new(4);
    let t = SparseTensor::<StagedRuntime>::new(
        &[[3usize], [0], [2]],
        &[9i16, 0, -1],
        &[4],
        &device,
    )
    .unwrap();
    assert!(!t.is_sorted());

    let clean = t.eliminate_zeros().unwrap().sort_indices().unwrap();
    assert!(clean.is_sorted());
    assert_eq!(clean.entries::<i16>().unwrap(), vec![(vec![2], -1), (vec![3], 9)]);
}

#[test]
fn test_move_between_runtimes() {
    let staged = StagedDevice::new(5);
    let cpu = CpuDevice::new();
    let t = staged_grid(&staged);

    let host = t.to_device::<CpuRuntime>(&cpu).unwrap();
    assert_eq!(host.residency(), Residency::Host);
    assert_eq!(host.entries::<f64>().unwrap(), t.entries::<f64>().unwrap());
    assert_eq!(host.is_sorted(), t.is_sorted());

    let back = host.flatten().unwrap().to_device::<StagedRuntime>(&staged).unwrap();
    assert_eq!(back.residency(), Residency::Accelerator);
    assert_eq!(back.coordinates().unwrap(), vec![vec![3], vec![9], vec![4]]);
}

#[test]
fn test_buffers_are_released() {
    let device = StagedDevice::new(6);
    {
        let t = staged_grid(&device);
        let flat = t.flatten().unwrap();
        let dense = flat.to_dense().unwrap();
        assert!(device.live_buffers() >= 4);
        drop(t);
        // `flat` still holds the shared values buffer
        assert_eq!(flat.values_vec::<f64>().unwrap(), vec![1.5, -2.0, 4.0]);
        drop(dense);
    }
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn test_from_parts_validates_on_device() {
    let device = StagedDevice::new(7);

    let indices = Storage::<StagedRuntime>::from_slice(&[0i64, 1, 1, 0], &device).unwrap();
    let values = Storage::<StagedRuntime>::from_slice(&[true, true], &device).unwrap();
    let t = SparseTensor::from_parts(indices, values, &[2, 2]).unwrap();
    assert!(t.is_sorted());
    assert_eq!(t.dtype(), DType::Bool);

    let indices = Storage::<StagedRuntime>::from_slice(&[0i64, 5], &device).unwrap();
    let values = Storage::<StagedRuntime>::from_slice(&[1u8], &device).unwrap();
    assert_eq!(
        SparseTensor::from_parts(indices, values, &[2, 2]).unwrap_err(),
        Error::IndexOutOfBounds {
            entry: 0,
            dim: 1,
            index: 5,
            size: 2
        }
    );

    let indices = Storage::<StagedRuntime>::from_slice(&[1i64, 1, 1, 1], &device).unwrap();
    let values = Storage::<StagedRuntime>::from_slice(&[1u8, 2], &device).unwrap();
    assert!(matches!(
        SparseTensor::from_parts(indices, values, &[2, 2]),
        Err(Error::DuplicateCoordinate { .. })
    ));

    let indices = Storage::<StagedRuntime>::from_slice(&[0i64, 1, 1], &device).unwrap();
    let values = Storage::<StagedRuntime>::from_slice(&[1u8, 2], &device).unwrap();
    assert!(matches!(
        SparseTensor::from_parts(indices, values, &[2, 2]),
        Err(Error::LengthMismatch { .. })
    ));
}

#[test]
fn test_display_names_runtime() {
    let device = StagedDevice::new(8);
    let t = staged_grid(&device);
    assert_eq!(
        t.to_string(),
        "SparseTensor([3, 4], nnz=3, dtype=f64, runtime=staged, sparsity=75.0%)"
    );
}
