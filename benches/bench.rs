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

use criterion::{Criterion, criterion_group, criterion_main};
use simkern::{Capability, DataType, MetricKind};

fn floating_f32_inner_product(c: &mut Criterion) {
    use rand::Rng;
    let mut rng = rand::rng();
    let x = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    let y = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx512") {
        c.bench_function("floating_f32::inner_product::avx512", |b| {
            b.iter(|| unsafe { simkern::floating_f32::inner_product::inner_product_avx512(&x, &y) })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx2") {
        c.bench_function("floating_f32::inner_product::avx2", |b| {
            b.iter(|| unsafe { simkern::floating_f32::inner_product::inner_product_avx2(&x, &y) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simkern::is_capability_detected!("neon") {
        c.bench_function("floating_f32::inner_product::neon", |b| {
            b.iter(|| unsafe { simkern::floating_f32::inner_product::inner_product_neon(&x, &y) })
        });
    }
    c.bench_function("floating_f32::inner_product::fallback", |b| {
        b.iter(|| simkern::floating_f32::inner_product::fallback(&x, &y))
    });
}

fn floating_f16_squared_euclidean(c: &mut Criterion) {
    use rand::Rng;
    use simkern::f16;
    let mut rng = rand::rng();
    let x = (0..4095)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0f32)))
        .collect::<Vec<_>>();
    let y = (0..4095)
        .map(|_| f16::from_f32(rng.random_range(-1.0..=1.0f32)))
        .collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx512") {
        c.bench_function("floating_f16::squared_euclidean::avx512", |b| {
            b.iter(|| unsafe {
                simkern::floating_f16::squared_euclidean::squared_euclidean_avx512(&x, &y)
            })
        });
    }
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx2fp16") {
        c.bench_function("floating_f16::squared_euclidean::avx2fp16", |b| {
            b.iter(|| unsafe {
                simkern::floating_f16::squared_euclidean::squared_euclidean_avx2fp16(&x, &y)
            })
        });
    }
    c.bench_function("floating_f16::squared_euclidean::fallback", |b| {
        b.iter(|| simkern::floating_f16::squared_euclidean::fallback(&x, &y))
    });
}

fn byte_cosine(c: &mut Criterion) {
    let x = (0..4095).map(|_| rand::random::<i8>()).collect::<Vec<_>>();
    let y = (0..4095).map(|_| rand::random::<i8>()).collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx2") {
        c.bench_function("byte::cosine::avx2", |b| {
            b.iter(|| unsafe { simkern::byte::cosine::cosine_avx2(&x, &y) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simkern::is_capability_detected!("neon") {
        c.bench_function("byte::cosine::neon", |b| {
            b.iter(|| unsafe { simkern::byte::cosine::cosine_neon(&x, &y) })
        });
    }
    c.bench_function("byte::cosine::fallback", |b| {
        b.iter(|| simkern::byte::cosine::fallback(&x, &y))
    });
}

fn bit_hamming(c: &mut Criterion) {
    let x = (0..1024).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
    let y = (0..1024).map(|_| rand::random::<u8>()).collect::<Vec<_>>();
    #[cfg(target_arch = "x86_64")]
    if simkern::is_capability_detected!("avx2") {
        c.bench_function("bit::hamming::avx2", |b| {
            b.iter(|| unsafe { simkern::bit::hamming::hamming_avx2(&x, &y) })
        });
    }
    #[cfg(target_arch = "aarch64")]
    if simkern::is_capability_detected!("neon") {
        c.bench_function("bit::hamming::neon", |b| {
            b.iter(|| unsafe { simkern::bit::hamming::hamming_neon(&x, &y) })
        });
    }
    c.bench_function("bit::hamming::fallback", |b| {
        b.iter(|| simkern::bit::hamming::fallback(&x, &y))
    });
}

fn resolved(c: &mut Criterion) {
    use rand::Rng;
    let mut rng = rand::rng();
    let x = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    let y = (0..4095)
        .map(|_| rng.random_range(-1.0..=1.0f32))
        .collect::<Vec<_>>();
    for allowed in [Capability::all(), Capability::AUTOVEC] {
        let Ok(kernel) = simkern::resolve_metric(MetricKind::Cosine, DataType::Float32, allowed)
        else {
            continue;
        };
        c.bench_function(&format!("resolved::cosine::f32::{}", kernel.capability()), |b| {
            b.iter(|| kernel.compute(&x, &y))
        });
    }
    c.bench_function("resolve_metric", |b| {
        b.iter(|| simkern::resolve_metric(MetricKind::Cosine, DataType::Float32, Capability::all()))
    });
}

criterion_group!(
    benches,
    floating_f32_inner_product,
    floating_f16_squared_euclidean,
    byte_cosine,
    bit_hamming,
    resolved
);
criterion_main!(benches);
