// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

#![allow(unsafe_code)]

use rand::Rng;
use simkern::{Capability, DataType, Kernel, MetricKind, ResolveError, f16};

const FLOATING: [MetricKind; 3] = [
    MetricKind::InnerProduct,
    MetricKind::Cosine,
    MetricKind::SquaredEuclidean,
];

const DATATYPES: [DataType; 5] = [
    DataType::Float64,
    DataType::Float32,
    DataType::Float16,
    DataType::Int8,
    DataType::Bit1,
];

/// One kernel per tier the machine can run, the fallback first.
fn tiers(kind: MetricKind, datatype: DataType) -> Vec<Kernel> {
    let mut result = Vec::<Kernel>::new();
    let masks = std::iter::once(Capability::AUTOVEC).chain(Capability::all().iter());
    for allowed in masks {
        let kernel = simkern::resolve_metric(kind, datatype, allowed).unwrap();
        if result.iter().all(|k| k.capability() != kernel.capability()) {
            result.push(kernel);
        }
    }
    assert_eq!(result[0].capability(), Capability::AUTOVEC);
    result
}

fn random_f32(n: usize) -> Vec<f32> {
    let mut rng = rand::rng();
    (0..n).map(|_| rng.random_range(-1.0..=1.0)).collect()
}

fn close(tier: f32, baseline: f32, relative: f32) -> bool {
    // cosine of empty vectors
    if tier.is_nan() && baseline.is_nan() {
        return true;
    }
    (tier - baseline).abs() <= relative * baseline.abs().max(1.0)
}

#[test]
fn resolution_never_fails_for_supported_pairs() {
    let masks = [
        Capability::AUTOVEC,
        Capability::all(),
        Capability::X86_AVX2 | Capability::ARM_NEON,
        Capability::X86_AVX512FP16 | Capability::X86_AMX | Capability::ARM_SME,
    ];
    for allowed in masks {
        for datatype in DATATYPES {
            if datatype == DataType::Bit1 {
                assert!(simkern::resolve_metric(MetricKind::Hamming, datatype, allowed).is_ok());
            } else {
                for kind in FLOATING {
                    assert!(simkern::resolve_metric(kind, datatype, allowed).is_ok());
                }
            }
        }
    }
}

#[test]
fn unsupported_pairs_are_reported() {
    assert_eq!(
        simkern::resolve_metric(MetricKind::Tanimoto, DataType::Bit1, Capability::all())
            .unwrap_err(),
        ResolveError::NotImplemented {
            kind: MetricKind::Tanimoto
        }
    );
    for datatype in [DataType::Float64, DataType::Float32, DataType::Float16, DataType::Int8] {
        assert!(matches!(
            simkern::resolve_metric(MetricKind::Hamming, datatype, Capability::all()),
            Err(ResolveError::Unsupported { .. })
        ));
    }
    for kind in FLOATING {
        assert!(matches!(
            simkern::resolve_metric(kind, DataType::Bit1, Capability::all()),
            Err(ResolveError::Unsupported { .. })
        ));
    }
}

#[test]
fn allowed_mask_is_respected() {
    let detected = simkern::detect_capabilities();
    for datatype in DATATYPES {
        let kind = if datatype == DataType::Bit1 {
            MetricKind::Hamming
        } else {
            MetricKind::InnerProduct
        };
        let kernel = simkern::resolve_metric(kind, datatype, Capability::AUTOVEC).unwrap();
        assert_eq!(kernel.capability(), Capability::AUTOVEC);
        for allowed in Capability::all().iter() {
            let kernel = simkern::resolve_metric(kind, datatype, allowed).unwrap();
            assert!((detected & allowed).contains(kernel.capability()));
        }
    }
}

#[test]
fn inner_product_example_on_every_tier() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [4.0, 3.0, 2.0, 1.0];
    for kernel in tiers(MetricKind::InnerProduct, DataType::Float32) {
        assert_eq!(kernel.compute(&a, &b), 20.0, "{kernel:?}");
    }
    let a64 = a.map(f64::from);
    let b64 = b.map(f64::from);
    for kernel in tiers(MetricKind::InnerProduct, DataType::Float64) {
        assert_eq!(kernel.compute(&a64, &b64), 20.0, "{kernel:?}");
    }
    let a16 = a.map(f16::from_f32);
    let b16 = b.map(f16::from_f32);
    for kernel in tiers(MetricKind::InnerProduct, DataType::Float16) {
        assert_eq!(kernel.compute(&a16, &b16), 20.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::InnerProduct, DataType::Int8) {
        assert_eq!(kernel.compute(&[1i8, 2, 3, 4], &[4i8, 3, 2, 1]), 20.0, "{kernel:?}");
    }
}

#[test]
fn orthogonal_cosine_on_every_tier() {
    for kernel in tiers(MetricKind::Cosine, DataType::Float32) {
        let c = kernel.compute(&[1.0f32, 0.0, 0.0, 0.0], &[0.0f32, 1.0, 0.0, 0.0]);
        assert_eq!(c, 0.0, "{kernel:?}");
    }
}

#[test]
fn hamming_example_on_every_tier() {
    let a = [0xffu8; 16];
    let b = [0x00u8; 16];
    for kernel in tiers(MetricKind::Hamming, DataType::Bit1) {
        assert_eq!(kernel.hamming(&a, &b), 128, "{kernel:?}");
        assert_eq!(kernel.compute(&a, &b), 128.0, "{kernel:?}");
    }
}

#[test]
fn tiers_agree_with_fallback() {
    for &n in &[0usize, 1, 7, 15, 16, 17, 63, 100, 1023] {
        let x = random_f32(n);
        let y = random_f32(n);
        for kind in FLOATING {
            let kernels = tiers(kind, DataType::Float32);
            let baseline = kernels[0].compute(&x, &y);
            for kernel in &kernels[1..] {
                let r = kernel.compute(&x, &y);
                assert!(close(r, baseline, 1e-4), "{kernel:?}: {r} vs {baseline}");
            }

            let x64 = x.iter().map(|&v| v as f64).collect::<Vec<_>>();
            let y64 = y.iter().map(|&v| v as f64).collect::<Vec<_>>();
            let kernels = tiers(kind, DataType::Float64);
            let baseline = kernels[0].compute(&x64, &y64);
            for kernel in &kernels[1..] {
                let r = kernel.compute(&x64, &y64);
                assert!(close(r, baseline, 1e-6), "{kernel:?}: {r} vs {baseline}");
            }

            let x16 = x.iter().map(|&v| f16::from_f32(v)).collect::<Vec<_>>();
            let y16 = y.iter().map(|&v| f16::from_f32(v)).collect::<Vec<_>>();
            let kernels = tiers(kind, DataType::Float16);
            let baseline = kernels[0].compute(&x16, &y16);
            for kernel in &kernels[1..] {
                let r = kernel.compute(&x16, &y16);
                assert!(close(r, baseline, 1e-3), "{kernel:?}: {r} vs {baseline}");
            }

            let x8 = x.iter().map(|&v| (v * 127.0) as i8).collect::<Vec<_>>();
            let y8 = y.iter().map(|&v| (v * 127.0) as i8).collect::<Vec<_>>();
            let kernels = tiers(kind, DataType::Int8);
            let baseline = kernels[0].compute(&x8, &y8);
            for kernel in &kernels[1..] {
                let r = kernel.compute(&x8, &y8);
                if n == 0 && kind == MetricKind::Cosine {
                    assert!(r.is_nan() && baseline.is_nan());
                } else {
                    assert_eq!(r, baseline, "{kernel:?}");
                }
            }
        }
        let bx = (0..n).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
        let by = (0..n).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
        let kernels = tiers(MetricKind::Hamming, DataType::Bit1);
        let baseline = kernels[0].hamming(&bx, &by);
        for kernel in &kernels[1..] {
            assert_eq!(kernel.hamming(&bx, &by), baseline, "{kernel:?}");
        }
    }
}

#[test]
fn metrics_are_symmetric() {
    let x = random_f32(515);
    let y = random_f32(515);
    for kind in FLOATING {
        for kernel in tiers(kind, DataType::Float32) {
            assert_eq!(kernel.compute(&x, &y), kernel.compute(&y, &x), "{kernel:?}");
        }
    }
    let x64 = x.iter().map(|&v| v as f64).collect::<Vec<_>>();
    let y64 = y.iter().map(|&v| v as f64).collect::<Vec<_>>();
    let x16 = x.iter().map(|&v| f16::from_f32(v)).collect::<Vec<_>>();
    let y16 = y.iter().map(|&v| f16::from_f32(v)).collect::<Vec<_>>();
    for kind in FLOATING {
        for kernel in tiers(kind, DataType::Float64) {
            assert_eq!(kernel.compute(&x64, &y64), kernel.compute(&y64, &x64), "{kernel:?}");
        }
        for kernel in tiers(kind, DataType::Float16) {
            assert_eq!(kernel.compute(&x16, &y16), kernel.compute(&y16, &x16), "{kernel:?}");
        }
    }
    let bx = (0..515).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
    let by = (0..515).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
    for kernel in tiers(MetricKind::Hamming, DataType::Bit1) {
        let d = kernel.hamming(&bx, &by);
        assert_eq!(d, kernel.hamming(&by, &bx), "{kernel:?}");
        assert!(d <= 515 * 8);
    }
}

#[test]
fn self_distance_and_self_similarity() {
    let x = random_f32(333);
    for kernel in tiers(MetricKind::SquaredEuclidean, DataType::Float32) {
        assert_eq!(kernel.compute(&x, &x), 0.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::Cosine, DataType::Float32) {
        let c = kernel.compute(&x, &x);
        assert!((c - 1.0).abs() < 1e-5, "{kernel:?}: {c}");
    }
    let x64 = x.iter().map(|&v| v as f64).collect::<Vec<_>>();
    for kernel in tiers(MetricKind::SquaredEuclidean, DataType::Float64) {
        assert_eq!(kernel.compute(&x64, &x64), 0.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::Cosine, DataType::Float64) {
        let c = kernel.compute(&x64, &x64);
        assert!((c - 1.0).abs() < 1e-6, "{kernel:?}: {c}");
    }
    let x16 = x.iter().map(|&v| f16::from_f32(v)).collect::<Vec<_>>();
    for kernel in tiers(MetricKind::SquaredEuclidean, DataType::Float16) {
        assert_eq!(kernel.compute(&x16, &x16), 0.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::Cosine, DataType::Float16) {
        let c = kernel.compute(&x16, &x16);
        assert!((c - 1.0).abs() < 1e-5, "{kernel:?}: {c}");
    }
    let x8 = [-128i8, 127, 0, 5, -7, 99, 3];
    for kernel in tiers(MetricKind::SquaredEuclidean, DataType::Int8) {
        assert_eq!(kernel.compute(&x8, &x8), 0.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::Cosine, DataType::Int8) {
        let c = kernel.compute(&x8, &x8);
        assert!((c - 1.0).abs() < 1e-6, "{kernel:?}: {c}");
    }
    let b = (0..77).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
    for kernel in tiers(MetricKind::Hamming, DataType::Bit1) {
        assert_eq!(kernel.hamming(&b, &b), 0, "{kernel:?}");
    }
}

#[test]
fn raw_invocation_matches_safe_invocation() {
    let x = random_f32(129);
    let y = random_f32(129);
    for kind in FLOATING {
        for kernel in tiers(kind, DataType::Float32) {
            let raw = unsafe {
                kernel.compute_raw(x.as_ptr().cast(), y.as_ptr().cast(), x.len(), y.len())
            };
            assert_eq!(raw, kernel.compute(&x, &y), "{kernel:?}");
        }
    }
    let a = [0b1111_0000u8, 0xff];
    let b = [0b0000_1111u8, 0x0f];
    for kernel in tiers(MetricKind::Hamming, DataType::Bit1) {
        let raw = unsafe { kernel.compute_raw(a.as_ptr().cast(), b.as_ptr().cast(), 2, 2) };
        assert_eq!(raw, 12.0, "{kernel:?}");
    }
}

#[test]
fn options_drive_resolution() {
    let options = simkern::DispatchOptions::from_toml("allowed = []").unwrap();
    let kernel =
        simkern::resolve_metric_with(&options, MetricKind::Cosine, DataType::Float16).unwrap();
    assert_eq!(kernel.capability(), Capability::AUTOVEC);
    let options = simkern::DispatchOptions::default();
    let kernel =
        simkern::resolve_metric_with(&options, MetricKind::Cosine, DataType::Float16).unwrap();
    assert!(simkern::detect_capabilities().contains(kernel.capability()));
}

#[test]
fn int8_is_exact_up_to_the_accumulator_bound() {
    let x = vec![-128i8; 131000];
    for kernel in tiers(MetricKind::InnerProduct, DataType::Int8) {
        assert_eq!(kernel.compute(&x, &x), 2146304000.0, "{kernel:?}");
    }
    for kernel in tiers(MetricKind::Cosine, DataType::Int8) {
        let c = kernel.compute(&x, &x);
        assert!((c - 1.0).abs() < 1e-6, "{kernel:?}: {c}");
    }
}
